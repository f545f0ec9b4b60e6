//! Tree of named branches with numeric arrays at the leaves.

use indexmap::IndexMap;
use ndarray::{Array, ArrayD, Axis, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Numeric array stored at a leaf; axis 0 indexes rows.
pub type Leaf = ArrayD<f64>;

/// Ordered mapping from key to child node.
pub type Branch = IndexMap<String, Node>;

/// Either a nested mapping or a leaf array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Intermediate mapping (e.g. `train` holding `X` and `Y`).
    Branch(Branch),
    /// Terminal array.
    Leaf(Leaf),
}

impl Node {
    /// Builds a branch from `(key, node)` pairs, keeping their order.
    pub fn branch<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Branch(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    /// Returns the leaf array, if this is a leaf.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(array) => Some(array),
            Self::Branch(_) => None,
        }
    }

    /// Returns the mapping, if this is a branch.
    #[must_use]
    pub const fn as_branch(&self) -> Option<&Branch> {
        match self {
            Self::Branch(children) => Some(children),
            Self::Leaf(_) => None,
        }
    }

    /// Whether this node is a leaf.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// Child under `key`; always `None` for leaves.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_branch().and_then(|children| children.get(key))
    }

    /// Follows `path` key by key.
    #[must_use]
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, key| node.get(key.as_ref()))
    }

    /// Row count of a leaf; `None` for branches.
    #[must_use]
    pub fn rows(&self) -> Option<usize> {
        self.as_leaf().map(|array| array.len_of(Axis(0)))
    }

    /// Number of leaves in this subtree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => children.values().map(Self::leaf_count).sum(),
        }
    }

    /// Total rows across every leaf in this subtree.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        match self {
            Self::Leaf(array) => array.len_of(Axis(0)),
            Self::Branch(children) => children.values().map(Self::total_rows).sum(),
        }
    }

    /// Visits every leaf depth-first in key order with its slash-joined path.
    pub fn for_each_leaf<F>(&self, path: &str, visit: &mut F)
    where
        F: FnMut(&str, &Leaf),
    {
        match self {
            Self::Leaf(array) => visit(path, array),
            Self::Branch(children) => {
                for (key, child) in children {
                    child.for_each_leaf(&join(path, key), visit);
                }
            }
        }
    }

    /// Row count shared by every leaf beneath this node.
    ///
    /// Returns `Ok(None)` when the subtree holds no leaves.
    pub fn common_rows(&self, path: &str) -> Result<Option<usize>> {
        let mut expected: Option<usize> = None;
        let mut mismatch = None;
        self.for_each_leaf(path, &mut |leaf_path, array| {
            if mismatch.is_some() {
                return;
            }
            let rows = array.len_of(Axis(0));
            match expected {
                None => expected = Some(rows),
                Some(want) if want != rows => {
                    mismatch = Some(DatasetError::LengthMismatch {
                        path: leaf_path.to_owned(),
                        expected: want,
                        found: rows,
                    });
                }
                Some(_) => {}
            }
        });
        match mismatch {
            Some(err) => Err(err),
            None => Ok(expected),
        }
    }

    /// Checks leaf dimensionality and sibling row counts throughout the subtree.
    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        match self {
            Self::Leaf(array) => {
                if array.ndim() == 0 {
                    return Err(DatasetError::ScalarLeaf {
                        path: render(path),
                    });
                }
                Ok(())
            }
            Self::Branch(children) => validate_branch(children, path),
        }
    }

    /// Rebuilds the subtree with every leaf replaced by `f(path, leaf)`.
    pub(crate) fn try_map_leaves<F>(&self, path: &str, f: &mut F) -> Result<Self>
    where
        F: FnMut(&str, &Leaf) -> Result<Leaf>,
    {
        match self {
            Self::Leaf(array) => f(&render(path), array).map(Self::Leaf),
            Self::Branch(children) => {
                let mut mapped = Branch::with_capacity(children.len());
                for (key, child) in children {
                    mapped.insert(key.clone(), child.try_map_leaves(&join(path, key), f)?);
                }
                Ok(Self::Branch(mapped))
            }
        }
    }
}

impl<D: Dimension> From<Array<f64, D>> for Node {
    fn from(array: Array<f64, D>) -> Self {
        Self::Leaf(array.into_dyn())
    }
}

impl From<Branch> for Node {
    fn from(children: Branch) -> Self {
        Self::Branch(children)
    }
}

pub(crate) fn validate_branch(children: &Branch, path: &str) -> Result<()> {
    let mut expected = None;
    for (key, child) in children {
        let child_path = join(path, key);
        child.validate(&child_path)?;
        if let Some(rows) = child.rows() {
            match expected {
                None => expected = Some(rows),
                Some(want) if want != rows => {
                    return Err(DatasetError::LengthMismatch {
                        path: child_path,
                        expected: want,
                        found: rows,
                    });
                }
                Some(_) => {}
            }
        }
    }
    Ok(())
}

/// Appends `key` to a slash-joined path; the root path is empty.
pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}/{key}")
    }
}

/// Path as it appears in error messages.
pub(crate) fn render(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_owned()
    } else {
        path.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, array};

    fn split() -> Node {
        Node::branch([
            ("X", Node::from(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])),
            ("Y", Node::from(array![0.0, 1.0, 0.0])),
        ])
    }

    #[test]
    fn navigates_by_path() {
        let tree = Node::branch([("train", split())]);
        let x = tree.get_path(&["train", "X"]).unwrap();
        assert_eq!(x.rows(), Some(3));
        assert!(tree.get_path(&["train", "X", "deeper"]).is_none());
        assert!(tree.get_path(&["test"]).is_none());
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.total_rows(), 6);
    }

    #[test]
    fn validation_rejects_misaligned_siblings() {
        let node = Node::branch([
            ("X", Node::from(array![[1.0], [2.0]])),
            ("Y", Node::from(array![0.0, 1.0, 2.0])),
        ]);
        let err = node.validate("train").unwrap_err();
        assert_eq!(
            err,
            DatasetError::LengthMismatch {
                path: "train/Y".into(),
                expected: 2,
                found: 3,
            }
        );
    }

    #[test]
    fn sibling_branches_may_differ_in_length() {
        let test = Node::branch([("X", Node::from(array![[7.0, 8.0]]))]);
        let tree = Node::branch([("train", split()), ("test", test)]);
        assert!(tree.validate("").is_ok());
        assert!(matches!(
            tree.common_rows(""),
            Err(DatasetError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn validation_rejects_scalar_leaves() {
        let node = Node::branch([("bias", Node::from(arr0(1.0)))]);
        assert_eq!(
            node.validate("").unwrap_err(),
            DatasetError::ScalarLeaf {
                path: "bias".into()
            }
        );
    }

    #[test]
    fn visits_leaves_in_insertion_order() {
        let tree = Node::branch([("train", split()), ("test", split())]);
        let mut seen = Vec::new();
        tree.for_each_leaf("", &mut |path, _| seen.push(path.to_owned()));
        assert_eq!(seen, ["train/X", "train/Y", "test/X", "test/Y"]);
    }

    #[test]
    fn common_rows_of_empty_branch_is_none() {
        assert_eq!(Node::branch::<String, _>([]).common_rows("").unwrap(), None);
        assert_eq!(split().common_rows("train").unwrap(), Some(3));
    }
}
