#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

//! Nested dataset container for machine-learning splits.
//!
//! A [`Dataset`] holds a mapping such as `train/test -> X/Y -> array` and
//! offers row selection, min-max normalisation, reference-based
//! standardisation and seeded train/test splitting. Every transform returns a
//! new dataset.
//!
//! ```
//! use ndarray::array;
//! use ntmg_dataset::{Dataset, Node, Selection};
//!
//! let data = Dataset::from_entries([(
//!     "train",
//!     Node::branch([
//!         ("X", Node::from(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]])),
//!         ("Y", Node::from(array![0.0, 1.0, 0.0])),
//!     ]),
//! )])?;
//! let picked = data.select(&Selection::keys([("train", Selection::rows([0, 2]))]))?;
//! assert_eq!(picked.rows(&["train", "Y"]), Some(2));
//! # Ok::<(), ntmg_dataset::DatasetError>(())
//! ```

/// Dataset configuration loading.
pub mod config;
/// The dataset value object.
pub mod dataset;
/// Error types.
pub mod error;
/// Branch/leaf tree.
pub mod node;
/// Min-max normalisation.
pub mod normalise;
/// Row selection.
pub mod selection;
/// Train/test splitting.
pub mod split;
/// Gaussian standardisation.
pub mod standardise;
/// Structural summaries.
pub mod summary;
/// Structured logging hooks.
pub mod telemetry;

pub use config::{DatasetConfig, LoggingConfig};
pub use dataset::Dataset;
pub use error::{ConfigError, DatasetError, Result};
pub use node::{Branch, Leaf, Node};
pub use normalise::{normalise_array, DegeneratePolicy, NormaliseOptions};
pub use selection::Selection;
pub use split::{split_rows, SplitOptions};
pub use standardise::{ColumnStats, StandardiseOptions};
pub use summary::{LeafSummary, Summary};
pub use telemetry::{DatasetTelemetry, DatasetTelemetryBuilder};
