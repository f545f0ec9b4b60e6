//! Compact structural description of a dataset.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::{Branch, Leaf, Node};

/// Shape and value range of one leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafSummary {
    /// Slash-joined key path.
    pub path: String,
    /// Full array shape, rows first.
    pub shape: Vec<usize>,
    /// Smallest value, absent for empty leaves.
    pub min: Option<f64>,
    /// Largest value, absent for empty leaves.
    pub max: Option<f64>,
}

impl LeafSummary {
    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }
}

impl fmt::Display for LeafSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: f64, shape {:?}", self.path, self.shape)?;
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, ", range [{min}, {max}]"),
            _ => write!(f, ", empty"),
        }
    }
}

/// One entry per leaf, in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Leaf descriptions.
    pub leaves: Vec<LeafSummary>,
}

impl Summary {
    /// Describes every leaf under `node`.
    #[must_use]
    pub fn of(node: &Node) -> Self {
        let mut leaves = Vec::new();
        node.for_each_leaf("", &mut |path, array| leaves.push(describe(path, array)));
        Self { leaves }
    }

    /// Describes every leaf of a top-level mapping.
    #[must_use]
    pub fn of_branch(children: &Branch) -> Self {
        let mut leaves = Vec::new();
        for (key, child) in children {
            child.for_each_leaf(key, &mut |path, array| leaves.push(describe(path, array)));
        }
        Self { leaves }
    }

    /// Looks a leaf up by path.
    #[must_use]
    pub fn leaf(&self, path: &str) -> Option<&LeafSummary> {
        self.leaves.iter().find(|leaf| leaf.path == path)
    }
}

fn describe(path: &str, array: &Leaf) -> LeafSummary {
    let (min, max) = if array.is_empty() {
        (None, None)
    } else {
        (
            Some(array.fold(f64::INFINITY, |acc, &v| acc.min(v))),
            Some(array.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v))),
        )
    };
    LeafSummary {
        path: path.to_owned(),
        shape: array.shape().to_vec(),
        min,
        max,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for leaf in &self.leaves {
            writeln!(f, "\t{leaf}")?;
        }
        write!(f, "}}")
    }
}
