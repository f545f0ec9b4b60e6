//! Per-column min-max rescaling.

use ndarray::{Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DatasetError, Result},
    node::{render, Leaf},
};

/// What to do with a column whose values are all equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Fail with [`DatasetError::DegenerateColumn`].
    #[default]
    Fail,
    /// Map the whole column to zero.
    Zero,
}

/// Options for [`Dataset::normalise_with`](crate::Dataset::normalise_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormaliseOptions {
    /// Constant-column policy.
    pub degenerate: DegeneratePolicy,
}

impl NormaliseOptions {
    /// Options that zero constant columns instead of failing.
    #[must_use]
    pub const fn zero_degenerate() -> Self {
        Self {
            degenerate: DegeneratePolicy::Zero,
        }
    }
}

/// Rescales every column of `array` to `[0, 1]`.
///
/// Columns are all positions of the trailing axes, so a 1-D array is a single
/// column. Arrays without rows are returned unchanged.
pub fn normalise_array(array: &Leaf, options: &NormaliseOptions) -> Result<Leaf> {
    rescale(array, options, "")
}

pub(crate) fn rescale(array: &Leaf, options: &NormaliseOptions, path: &str) -> Result<Leaf> {
    if array.ndim() == 0 {
        return Err(DatasetError::ScalarLeaf { path: render(path) });
    }
    if array.len_of(Axis(0)) == 0 {
        return Ok(array.clone());
    }
    let lo = array.fold_axis(Axis(0), f64::INFINITY, |&acc, &value| acc.min(value));
    let hi = array.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &value| acc.max(value));
    let span = &hi - &lo;

    if options.degenerate == DegeneratePolicy::Fail {
        if let Some(column) = span.iter().position(|&width| is_flat(width)) {
            return Err(DatasetError::DegenerateColumn {
                path: render(path),
                column,
            });
        }
    }

    let mut out = array.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        Zip::from(&mut row)
            .and(&lo)
            .and(&hi)
            .and(&span)
            .for_each(|value, &low, &high, &width| {
                *value = unit(*value, low, high, width);
            });
    }
    Ok(out)
}

/// Position of `value` within `[low, high]`.
///
/// A span wider than `f64::MAX` is rescaled on halved operands.
fn unit(value: f64, low: f64, high: f64, width: f64) -> f64 {
    if is_flat(width) {
        0.0
    } else if width.is_finite() {
        (value - low) / width
    } else {
        (value / 2.0 - low / 2.0) / (high / 2.0 - low / 2.0)
    }
}

pub(crate) fn is_flat(width: f64) -> bool {
    width.is_nan() || width <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: &Leaf, b: &Leaf) -> bool {
        a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn rescales_each_column_independently() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]].into_dyn();
        let out = normalise_array(&x, &NormaliseOptions::default()).unwrap();
        let expected = array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]].into_dyn();
        assert!(close(&out, &expected), "{out}");
    }

    #[test]
    fn columns_span_unit_interval() {
        let x = array![[4.0, -1.0, 0.5], [9.0, -7.0, 0.25], [6.0, 3.0, 2.0], [5.0, 0.0, 1.0]]
            .into_dyn();
        let out = normalise_array(&x, &NormaliseOptions::default()).unwrap();
        for column in out.axis_iter(Axis(1)) {
            let min = column.fold(f64::INFINITY, |acc, &v| acc.min(v));
            let max = column.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
            assert!(min.abs() < 1e-12);
            assert!((max - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn is_idempotent() {
        let x = array![[3.0, 2.0], [-1.0, 8.0], [0.5, 4.0]].into_dyn();
        let options = NormaliseOptions::default();
        let once = normalise_array(&x, &options).unwrap();
        let twice = normalise_array(&once, &options).unwrap();
        assert!(close(&once, &twice));
    }

    #[test]
    fn extreme_finite_range_stays_in_unit_interval() {
        let x = array![[-1e308, 1.0], [1e308, 2.0], [0.0, 3.0]].into_dyn();
        let out = normalise_array(&x, &NormaliseOptions::default()).unwrap();
        let expected = array![[0.0, 0.0], [1.0, 0.5], [0.5, 1.0]].into_dyn();
        assert!(close(&out, &expected), "{out}");
    }

    #[test]
    fn one_dimensional_leaf_is_one_column() {
        let y = array![2.0, 4.0, 6.0].into_dyn();
        let out = normalise_array(&y, &NormaliseOptions::default()).unwrap();
        assert!(close(&out, &array![0.0, 0.5, 1.0].into_dyn()));
    }

    #[test]
    fn constant_column_fails_by_default() {
        let x = array![[1.0, 5.0], [2.0, 5.0]].into_dyn();
        let err = rescale(&x, &NormaliseOptions::default(), "train/X").unwrap_err();
        assert_eq!(
            err,
            DatasetError::DegenerateColumn {
                path: "train/X".into(),
                column: 1,
            }
        );
    }

    #[test]
    fn constant_column_zeroed_when_asked() {
        let x = array![[1.0, 5.0], [3.0, 5.0]].into_dyn();
        let out = normalise_array(&x, &NormaliseOptions::zero_degenerate()).unwrap();
        assert!(close(&out, &array![[0.0, 0.0], [1.0, 0.0]].into_dyn()));
    }

    #[test]
    fn empty_leaf_passes_through() {
        let x = ndarray::Array2::<f64>::zeros((0, 3)).into_dyn();
        let out = normalise_array(&x, &NormaliseOptions::default()).unwrap();
        assert_eq!(out.shape(), &[0, 3]);
    }

    #[test]
    fn policy_parses_from_snake_case() {
        let options: NormaliseOptions =
            serde_json::from_str(r#"{"degenerate": "zero"}"#).unwrap();
        assert_eq!(options, NormaliseOptions::zero_degenerate());
        let defaults: NormaliseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.degenerate, DegeneratePolicy::Fail);
    }
}
