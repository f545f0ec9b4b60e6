//! Gaussian standardisation driven by a reference leaf.
//!
//! Statistics are fitted once (by default on `train/X`) and then applied to
//! the feature leaves of every split, so test data is scaled with training
//! statistics. By default one mean and one deviation cover the whole reference
//! array; `per_column` fits one pair per column instead.

use ndarray::{arr0, ArrayD, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DatasetError, Result},
    node::{join, render, Branch, Leaf, Node},
    normalise::{is_flat, DegeneratePolicy},
};

/// Options for [`Dataset::standardise`](crate::Dataset::standardise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardiseOptions {
    /// Key path of the leaf the statistics are fitted on.
    pub reference: Vec<String>,
    /// Leaf keys that hold features; other leaves are left untouched.
    pub feature_keys: Vec<String>,
    /// Fit one mean and deviation per column instead of one for the array.
    pub per_column: bool,
    /// Policy for zero-spread columns.
    pub degenerate: DegeneratePolicy,
}

impl Default for StandardiseOptions {
    fn default() -> Self {
        Self {
            reference: vec!["train".into(), "X".into()],
            feature_keys: vec!["X".into()],
            per_column: false,
            degenerate: DegeneratePolicy::Fail,
        }
    }
}

impl StandardiseOptions {
    /// Whether a leaf stored under `key` is a feature leaf.
    #[must_use]
    pub fn is_feature(&self, key: &str) -> bool {
        self.feature_keys.iter().any(|candidate| candidate == key)
    }
}

/// Mean and population standard deviation, either pooled over the whole
/// reference array or kept per column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    mean: ArrayD<f64>,
    std: ArrayD<f64>,
    per_column: bool,
}

impl ColumnStats {
    /// Fits per-column statistics over the rows of `array`.
    pub fn fit(array: &Leaf) -> Result<Self> {
        fit_at(array, true, "")
    }

    /// Fits a single mean and deviation over every value of `array`.
    pub fn fit_pooled(array: &Leaf) -> Result<Self> {
        fit_at(array, false, "")
    }

    /// Means, shaped like one row; zero-dimensional when pooled.
    #[must_use]
    pub const fn mean(&self) -> &ArrayD<f64> {
        &self.mean
    }

    /// Standard deviations, shaped like one row; zero-dimensional when pooled.
    #[must_use]
    pub const fn std(&self) -> &ArrayD<f64> {
        &self.std
    }

    /// Whether the statistics were fitted per column.
    #[must_use]
    pub const fn is_per_column(&self) -> bool {
        self.per_column
    }

    /// Applies `(x - mean) / std`.
    pub fn apply(&self, array: &Leaf, policy: DegeneratePolicy) -> Result<Leaf> {
        self.apply_at(array, policy, "")
    }

    pub(crate) fn apply_at(
        &self,
        array: &Leaf,
        policy: DegeneratePolicy,
        path: &str,
    ) -> Result<Leaf> {
        if array.ndim() == 0 {
            return Err(DatasetError::ScalarLeaf { path: render(path) });
        }
        if !self.per_column {
            return self.apply_pooled(array, policy, path);
        }
        let trailing = &array.shape()[1..];
        if trailing != self.mean.shape() {
            return Err(DatasetError::ShapeMismatch {
                path: render(path),
                expected: self.mean.shape().to_vec(),
                found: trailing.to_vec(),
            });
        }
        if policy == DegeneratePolicy::Fail {
            if let Some(column) = self.std.iter().position(|&spread| is_flat(spread)) {
                return Err(DatasetError::DegenerateColumn {
                    path: render(path),
                    column,
                });
            }
        }

        let mut out = array.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            Zip::from(&mut row)
                .and(&self.mean)
                .and(&self.std)
                .for_each(|value, &mean, &spread| {
                    *value = if is_flat(spread) {
                        0.0
                    } else {
                        (*value - mean) / spread
                    };
                });
        }
        Ok(out)
    }

    fn apply_pooled(&self, array: &Leaf, policy: DegeneratePolicy, path: &str) -> Result<Leaf> {
        let mean = self.mean.first().copied().unwrap_or(0.0);
        let spread = self.std.first().copied().unwrap_or(0.0);
        if is_flat(spread) {
            return match policy {
                DegeneratePolicy::Fail => Err(DatasetError::DegenerateColumn {
                    path: render(path),
                    column: 0,
                }),
                DegeneratePolicy::Zero => Ok(array.mapv(|_| 0.0)),
            };
        }
        Ok(array.mapv(|value| (value - mean) / spread))
    }
}

pub(crate) fn fit_at(array: &Leaf, per_column: bool, path: &str) -> Result<ColumnStats> {
    if array.ndim() == 0 {
        return Err(DatasetError::ScalarLeaf { path: render(path) });
    }
    let empty = || DatasetError::EmptyReference { path: render(path) };
    if per_column {
        let mean = array.mean_axis(Axis(0)).ok_or_else(empty)?;
        let std = array.std_axis(Axis(0), 0.0);
        return Ok(ColumnStats {
            mean,
            std,
            per_column,
        });
    }
    let mean = array.mean().ok_or_else(empty)?;
    Ok(ColumnStats {
        mean: arr0(mean).into_dyn(),
        std: arr0(array.std(0.0)).into_dyn(),
        per_column,
    })
}

/// Rewrites the feature leaves of `children` with `stats`, recursing into branches.
pub(crate) fn standardise_branch(
    children: &Branch,
    path: &str,
    stats: &ColumnStats,
    options: &StandardiseOptions,
) -> Result<Branch> {
    let mut out = Branch::with_capacity(children.len());
    for (key, child) in children {
        let child_path = join(path, key);
        let mapped = match child {
            Node::Branch(grandchildren) => {
                Node::Branch(standardise_branch(grandchildren, &child_path, stats, options)?)
            }
            Node::Leaf(array) if options.is_feature(key) => {
                Node::Leaf(stats.apply_at(array, options.degenerate, &child_path)?)
            }
            Node::Leaf(_) => child.clone(),
        };
        out.insert(key.clone(), mapped);
    }
    Ok(out)
}
