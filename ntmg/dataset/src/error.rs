use thiserror::Error;

/// Errors raised by dataset construction and transforms.
///
/// `path` fields hold the slash-joined key path (`train/X`) of the node the
/// failure was detected at; the root is rendered as `<root>`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DatasetError {
    /// A selection or reference named a key the dataset does not hold.
    #[error("key `{key}` not found under {path}")]
    KeyNotFound {
        /// Path of the branch that was searched.
        path: String,
        /// Missing key.
        key: String,
    },
    /// A row index was not smaller than the leaf's row count.
    #[error("row index {index} out of bounds for {path} with {rows} rows")]
    IndexOutOfBounds {
        /// Leaf path.
        path: String,
        /// Offending index.
        index: usize,
        /// Row count of the leaf.
        rows: usize,
    },
    /// A column has zero range (or zero spread) and cannot be rescaled.
    #[error("column {column} of {path} is constant and cannot be rescaled")]
    DegenerateColumn {
        /// Leaf path.
        path: String,
        /// Flat column index over the trailing axes.
        column: usize,
    },
    /// Sibling leaves disagree on their row count.
    #[error("leaf {path} has {found} rows, siblings have {expected}")]
    LengthMismatch {
        /// Path of the disagreeing leaf.
        path: String,
        /// Row count set by the first sibling leaf.
        expected: usize,
        /// Row count of this leaf.
        found: usize,
    },
    /// A leaf array has no axes at all.
    #[error("leaf {path} is zero-dimensional; leaves need a row axis")]
    ScalarLeaf {
        /// Leaf path.
        path: String,
    },
    /// A keyed selection was applied to a leaf.
    #[error("{path} is a leaf and cannot be selected by key")]
    NotABranch {
        /// Leaf path.
        path: String,
    },
    /// A boolean mask does not cover every row.
    #[error("mask for {path} has {found} entries, expected {expected}")]
    MaskLength {
        /// Leaf path.
        path: String,
        /// Row count of the leaf.
        expected: usize,
        /// Mask length.
        found: usize,
    },
    /// Trailing shape of a leaf differs from the statistics applied to it.
    #[error("leaf {path} has feature shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Leaf path.
        path: String,
        /// Trailing shape of the statistics.
        expected: Vec<usize>,
        /// Trailing shape of the leaf.
        found: Vec<usize>,
    },
    /// Statistics were requested from a leaf with no rows.
    #[error("reference leaf {path} has no rows")]
    EmptyReference {
        /// Leaf path.
        path: String,
    },
    /// A reference path points at a branch instead of a leaf.
    #[error("reference {path} is a branch, expected a leaf")]
    NotALeaf {
        /// Branch path.
        path: String,
    },
    /// An operation would write a key that already exists.
    #[error("key `{key}` already exists under {path}")]
    DuplicateKey {
        /// Path of the branch being written.
        path: String,
        /// Colliding key.
        key: String,
    },
    /// Split ratio outside `[0, 1]`.
    #[error("test ratio {0} must lie within [0, 1]")]
    InvalidRatio(f64),
}

/// Errors raised while loading a [`DatasetConfig`](crate::DatasetConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error (filesystem).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Parsed values fail validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for dataset results.
pub type Result<T, E = DatasetError> = std::result::Result<T, E>;
