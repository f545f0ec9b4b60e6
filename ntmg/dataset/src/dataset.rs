//! The [`Dataset`] value object.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use shared_logging::LogLevel;

use crate::{
    error::{DatasetError, Result},
    node::{join, render, validate_branch, Branch, Leaf, Node},
    normalise::{rescale, NormaliseOptions},
    selection::{select_branch, select_node, Selection},
    split::{split_node, SplitOptions},
    standardise::{fit_at, standardise_branch, ColumnStats, StandardiseOptions},
    summary::Summary,
    telemetry::DatasetTelemetry,
};

/// Validated nested mapping of arrays, typically `split -> {X, Y}`.
///
/// Every operation is pure: it returns a new dataset and leaves `self`
/// untouched. Sibling leaves always share their row count; anything that
/// would break that fails with [`DatasetError::LengthMismatch`].
#[derive(Clone, Default, Deserialize)]
#[serde(try_from = "Branch")]
pub struct Dataset {
    data: Branch,
    #[serde(skip)]
    telemetry: DatasetTelemetry,
}

impl Dataset {
    /// Takes ownership of `data` after validating it.
    pub fn new(data: Branch) -> Result<Self> {
        validate_branch(&data, "")?;
        Ok(Self {
            data,
            telemetry: DatasetTelemetry::default(),
        })
    }

    /// Builds a dataset from `(key, node)` pairs.
    pub fn from_entries<K, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Self::new(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    /// Attaches telemetry; derived datasets inherit it.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: DatasetTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Telemetry handle in use.
    #[must_use]
    pub const fn telemetry(&self) -> &DatasetTelemetry {
        &self.telemetry
    }

    /// Borrowed view of the underlying mapping.
    #[must_use]
    pub const fn data(&self) -> &Branch {
        &self.data
    }

    /// Gives the mapping back.
    #[must_use]
    pub fn into_inner(self) -> Branch {
        self.data
    }

    /// Top-level keys, e.g. the split names.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.data.keys().map(String::as_str)
    }

    /// Top-level node under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.data.get(key)
    }

    /// Node at a key path such as `["train", "X"]`.
    #[must_use]
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        self.data.get(first.as_ref())?.get_path(rest)
    }

    /// Row count of the leaf at `path`.
    #[must_use]
    pub fn rows<S: AsRef<str>>(&self, path: &[S]) -> Option<usize> {
        self.get_path(path).and_then(Node::rows)
    }

    /// Number of leaves.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.data.values().map(Node::leaf_count).sum()
    }

    /// Rows summed over every leaf.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.data.values().map(Node::total_rows).sum()
    }

    /// Whether the top-level mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keeps only the selected keys and rows.
    ///
    /// An empty keyed selection yields an empty dataset; an empty row list
    /// yields zero-row leaves.
    pub fn select(&self, selection: &Selection) -> Result<Self> {
        let outcome = match selection {
            Selection::Keys(keys) => select_branch(&self.data, keys, ""),
            broadcast => self.broadcast(broadcast),
        };
        self.observe("dataset.select", outcome.and_then(|data| self.derive(data)))
    }

    /// Min-max normalises every leaf, failing on constant columns.
    pub fn normalise(&self) -> Result<Self> {
        self.normalise_with(&NormaliseOptions::default())
    }

    /// Alias of [`Dataset::normalise`].
    pub fn normalize(&self) -> Result<Self> {
        self.normalise()
    }

    /// Min-max normalises every leaf under `options`.
    pub fn normalise_with(&self, options: &NormaliseOptions) -> Result<Self> {
        let outcome = self.try_map(&mut |path, array| rescale(array, options, path));
        self.observe("dataset.normalise", outcome.and_then(|data| self.derive(data)))
    }

    /// Fits statistics on the leaf at `options.reference`, pooled or per
    /// column as `options.per_column` asks.
    pub fn fit_stats(&self, options: &StandardiseOptions) -> Result<ColumnStats> {
        let mut node: Option<&Node> = None;
        let mut path = String::new();
        for key in &options.reference {
            let found = match node {
                None => self.data.get(key),
                Some(Node::Branch(children)) => children.get(key),
                Some(Node::Leaf(_)) => None,
            };
            node = Some(found.ok_or_else(|| DatasetError::KeyNotFound {
                path: render(&path),
                key: key.clone(),
            })?);
            path = join(&path, key);
        }
        match node {
            Some(Node::Leaf(array)) => fit_at(array, options.per_column, &path),
            _ => Err(DatasetError::NotALeaf { path: render(&path) }),
        }
    }

    /// Standardises feature leaves with statistics fitted on the reference leaf.
    pub fn standardise(&self, options: &StandardiseOptions) -> Result<Self> {
        let stats = match self.fit_stats(options) {
            Ok(stats) => stats,
            Err(err) => return self.observe("dataset.standardise", Err(err)),
        };
        self.standardise_with_stats(&stats, options)
    }

    /// Alias of [`Dataset::standardise`].
    pub fn standardize(&self, options: &StandardiseOptions) -> Result<Self> {
        self.standardise(options)
    }

    /// Standardises feature leaves with previously fitted statistics.
    pub fn standardise_with_stats(
        &self,
        stats: &ColumnStats,
        options: &StandardiseOptions,
    ) -> Result<Self> {
        let outcome = standardise_branch(&self.data, "", stats, options);
        self.observe(
            "dataset.standardise",
            outcome.and_then(|data| self.derive(data)),
        )
    }

    /// Replaces every leaf with `f(path, leaf)`.
    pub fn map_leaves<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str, &Leaf) -> Leaf,
    {
        let outcome = self.try_map(&mut |path, array| Ok(f(path, array)));
        self.observe("dataset.map", outcome.and_then(|data| self.derive(data)))
    }

    /// Rebuilds every top-level split with `f(key, split)`.
    ///
    /// The closure sees the whole split (`X`, `Y`, ...) at once, so it can
    /// reshape one leaf and filter another in step. Top-level leaves are kept
    /// as they are. The result is validated like any other derived dataset.
    pub fn map_splits<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str, &Branch) -> Result<Branch>,
    {
        let outcome = self.map_each_split(&mut f);
        self.observe("dataset.map", outcome.and_then(|data| self.derive(data)))
    }

    /// Replaces the branch under `key` with a `{train, test}` pair of
    /// branches inserted at the same position.
    pub fn train_test_split(&self, key: &str, options: &SplitOptions) -> Result<Self> {
        self.observe("dataset.split", self.split_at(key, options))
    }

    /// Leaf-by-leaf description.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary::of_branch(&self.data)
    }

    fn split_at(&self, key: &str, options: &SplitOptions) -> Result<Self> {
        let target = self.data.get(key).ok_or_else(|| DatasetError::KeyNotFound {
            path: render(""),
            key: key.to_owned(),
        })?;
        if target.is_leaf() {
            return Err(DatasetError::NotABranch { path: render(key) });
        }
        for side in [&options.train_key, &options.test_key] {
            if side != key && self.data.contains_key(side) {
                return Err(DatasetError::DuplicateKey {
                    path: render(""),
                    key: side.clone(),
                });
            }
        }
        let mut parts = Some(split_node(target, options, key)?);
        let mut data = IndexMap::with_capacity(self.data.len() + 1);
        for (name, child) in &self.data {
            if name != key {
                data.insert(name.clone(), child.clone());
            } else if let Some(parts) = parts.take() {
                data.extend(parts);
            }
        }
        self.derive(data)
    }

    fn broadcast(&self, selection: &Selection) -> Result<Branch> {
        let mut selected = Branch::with_capacity(self.data.len());
        for (key, child) in &self.data {
            selected.insert(key.clone(), select_node(child, selection, key)?);
        }
        Ok(selected)
    }

    fn map_each_split<F>(&self, f: &mut F) -> Result<Branch>
    where
        F: FnMut(&str, &Branch) -> Result<Branch>,
    {
        let mut mapped = Branch::with_capacity(self.data.len());
        for (key, child) in &self.data {
            let node = match child {
                Node::Branch(split) => Node::Branch(f(key, split)?),
                Node::Leaf(_) => child.clone(),
            };
            mapped.insert(key.clone(), node);
        }
        Ok(mapped)
    }

    fn try_map<F>(&self, f: &mut F) -> Result<Branch>
    where
        F: FnMut(&str, &Leaf) -> Result<Leaf>,
    {
        let mut mapped = Branch::with_capacity(self.data.len());
        for (key, child) in &self.data {
            mapped.insert(key.clone(), child.try_map_leaves(key, f)?);
        }
        Ok(mapped)
    }

    fn derive(&self, data: Branch) -> Result<Self> {
        validate_branch(&data, "")?;
        Ok(Self {
            data,
            telemetry: self.telemetry.clone(),
        })
    }

    fn observe(&self, operation: &str, outcome: Result<Self>) -> Result<Self> {
        match &outcome {
            Ok(dataset) => self.log(
                LogLevel::Info,
                operation,
                json!({
                    "leaves": dataset.leaf_count(),
                    "rows": dataset.total_rows(),
                }),
            ),
            Err(err) => self.log(
                LogLevel::Warn,
                &format!("{operation}.failed"),
                json!({ "error": err.to_string() }),
            ),
        }
        outcome
    }

    fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        let _ = self.telemetry.log(level, message, metadata);
    }
}

impl TryFrom<Branch> for Dataset {
    type Error = DatasetError;

    fn try_from(data: Branch) -> Result<Self> {
        Self::new(data)
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
