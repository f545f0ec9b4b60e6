//! Seeded train/test partitioning of a split.

use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DatasetError, Result},
    node::{Branch, Node},
    selection::{select_node, Selection},
};

/// Options for [`Dataset::train_test_split`](crate::Dataset::train_test_split).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Fraction of rows assigned to the test side.
    pub test_ratio: f64,
    /// Shuffle seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Shuffle before cutting. Without it the tail rows become the test side.
    pub shuffle: bool,
    /// Key of the training side in the output.
    pub train_key: String,
    /// Key of the test side in the output.
    pub test_key: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: Some(0),
            shuffle: true,
            train_key: "train".into(),
            test_key: "test".into(),
        }
    }
}

impl SplitOptions {
    /// Checks the ratio range and that the output keys differ.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.test_ratio) {
            return Err(DatasetError::InvalidRatio(self.test_ratio));
        }
        if self.train_key == self.test_key {
            return Err(DatasetError::DuplicateKey {
                path: "<root>".into(),
                key: self.test_key.clone(),
            });
        }
        Ok(())
    }
}

/// Partitions `0..rows` into `(train, test)` row lists.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn split_rows(rows: usize, options: &SplitOptions) -> Result<(Vec<usize>, Vec<usize>)> {
    options.validate()?;
    let mut order: Vec<usize> = (0..rows).collect();
    if options.shuffle {
        let mut rng = options
            .seed
            .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
        order.shuffle(&mut rng);
    }
    let test_len = ((rows as f64) * options.test_ratio).round() as usize;
    let test = order.split_off(rows - test_len.min(rows));
    Ok((order, test))
}

/// Cuts every leaf under `node` into a `{train, test}` mapping.
pub(crate) fn split_node(node: &Node, options: &SplitOptions, path: &str) -> Result<Branch> {
    let rows = node.common_rows(path)?.unwrap_or(0);
    let (train, test) = split_rows(rows, options)?;
    Ok(Branch::from([
        (
            options.train_key.clone(),
            select_node(node, &Selection::Rows(train), path)?,
        ),
        (
            options.test_key.clone(),
            select_node(node, &Selection::Rows(test), path)?,
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn partitions_every_row_once() {
        let (mut train, test) = split_rows(10, &SplitOptions::default()).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        train.extend(&test);
        train.sort_unstable();
        assert_eq!(train, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        let options = SplitOptions {
            seed: Some(7),
            ..SplitOptions::default()
        };
        assert_eq!(
            split_rows(50, &options).unwrap(),
            split_rows(50, &options).unwrap()
        );
    }

    #[test]
    fn unshuffled_split_takes_tail_as_test() {
        let options = SplitOptions {
            shuffle: false,
            test_ratio: 0.25,
            ..SplitOptions::default()
        };
        let (train, test) = split_rows(4, &options).unwrap();
        assert_eq!(train, [0, 1, 2]);
        assert_eq!(test, [3]);
    }

    #[test]
    fn ratio_outside_unit_interval_fails() {
        let options = SplitOptions {
            test_ratio: 1.5,
            ..SplitOptions::default()
        };
        assert_eq!(
            split_rows(3, &options).unwrap_err(),
            DatasetError::InvalidRatio(1.5)
        );
    }

    #[test]
    fn identical_output_keys_fail() {
        let options = SplitOptions {
            test_key: "train".into(),
            ..SplitOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(DatasetError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn split_keeps_features_and_labels_aligned() {
        let x = Array2::from_shape_fn((6, 2), |(row, col)| (row * 10 + col) as f64);
        let y = Array1::from_shape_fn(6, |row| (row * 10) as f64);
        let node = Node::branch([("X", Node::from(x)), ("Y", Node::from(y))]);
        let split = split_node(&node, &SplitOptions::default(), "all").unwrap();
        for side in ["train", "test"] {
            let part = split.get(side).unwrap();
            let x = part.get("X").unwrap().as_leaf().unwrap();
            let y = part.get("Y").unwrap().as_leaf().unwrap();
            assert_eq!(x.shape()[0], y.shape()[0]);
            for row in 0..y.len() {
                assert_eq!(x[[row, 0]], y[[row]]);
            }
        }
    }
}
