//! Row selection over a dataset tree.
//!
//! A [`Selection`] mirrors the shape of the tree it is applied to. Keyed
//! levels pick sub-trees; row lists and masks gather rows. A row list or mask
//! applied to a branch is broadcast to every leaf beneath it, so
//! `{"train": [0, 2]}` takes rows 0 and 2 of both `train/X` and `train/Y`.

use indexmap::IndexMap;
use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DatasetError, Result},
    node::{join, render, Branch, Leaf, Node},
};

/// What to take from a dataset tree.
///
/// Deserialises from plain JSON: objects become [`Selection::Keys`], arrays
/// of integers [`Selection::Rows`], arrays of booleans [`Selection::Mask`]
/// and a bare integer [`Selection::Row`]. An empty JSON array is an empty row
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Recurse into the named children only.
    Keys(IndexMap<String, Selection>),
    /// Gather these rows, in this order; repeats are allowed.
    Rows(Vec<usize>),
    /// Keep rows whose flag is set; must cover every row.
    Mask(Vec<bool>),
    /// A single row. The row axis is kept, so leaves come back with one row.
    Row(usize),
}

impl Selection {
    /// Keyed selection from `(key, selection)` pairs.
    pub fn keys<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Keys(
            entries
                .into_iter()
                .map(|(key, selection)| (key.into(), selection))
                .collect(),
        )
    }

    /// Row-list selection.
    pub fn rows(rows: impl IntoIterator<Item = usize>) -> Self {
        Self::Rows(rows.into_iter().collect())
    }

    /// Boolean mask selection.
    pub fn mask(mask: impl IntoIterator<Item = bool>) -> Self {
        Self::Mask(mask.into_iter().collect())
    }
}

impl From<Vec<usize>> for Selection {
    fn from(rows: Vec<usize>) -> Self {
        Self::Rows(rows)
    }
}

impl From<usize> for Selection {
    fn from(row: usize) -> Self {
        Self::Row(row)
    }
}

impl From<Vec<bool>> for Selection {
    fn from(mask: Vec<bool>) -> Self {
        Self::Mask(mask)
    }
}

impl Node {
    /// Applies `selection` to this subtree and validates the result.
    pub fn select(&self, selection: &Selection) -> Result<Self> {
        let selected = select_node(self, selection, "")?;
        selected.validate("")?;
        Ok(selected)
    }
}

pub(crate) fn select_node(node: &Node, selection: &Selection, path: &str) -> Result<Node> {
    match (node, selection) {
        (Node::Branch(children), Selection::Keys(keys)) => {
            select_branch(children, keys, path).map(Node::Branch)
        }
        (Node::Leaf(_), Selection::Keys(_)) => Err(DatasetError::NotABranch {
            path: render(path),
        }),
        (Node::Leaf(array), Selection::Rows(rows)) => gather(array, rows, path).map(Node::Leaf),
        (Node::Leaf(array), Selection::Row(row)) => {
            gather(array, std::slice::from_ref(row), path).map(Node::Leaf)
        }
        (Node::Leaf(array), Selection::Mask(mask)) => {
            let rows = mask_rows(mask, array.len_of(Axis(0)), path)?;
            gather(array, &rows, path).map(Node::Leaf)
        }
        (Node::Branch(children), broadcast) => {
            let mut selected = Branch::with_capacity(children.len());
            for (key, child) in children {
                let child_path = join(path, key);
                selected.insert(key.clone(), select_node(child, broadcast, &child_path)?);
            }
            Ok(Node::Branch(selected))
        }
    }
}

pub(crate) fn select_branch(
    children: &Branch,
    keys: &IndexMap<String, Selection>,
    path: &str,
) -> Result<Branch> {
    let mut selected = Branch::with_capacity(keys.len());
    for (key, selection) in keys {
        let child = children
            .get(key)
            .ok_or_else(|| DatasetError::KeyNotFound {
                path: render(path),
                key: key.clone(),
            })?;
        selected.insert(key.clone(), select_node(child, selection, &join(path, key))?);
    }
    Ok(selected)
}

fn gather(array: &Leaf, rows: &[usize], path: &str) -> Result<Leaf> {
    let available = array.len_of(Axis(0));
    if let Some(&index) = rows.iter().find(|&&index| index >= available) {
        return Err(DatasetError::IndexOutOfBounds {
            path: render(path),
            index,
            rows: available,
        });
    }
    Ok(array.select(Axis(0), rows))
}

fn mask_rows(mask: &[bool], rows: usize, path: &str) -> Result<Vec<usize>> {
    if mask.len() != rows {
        return Err(DatasetError::MaskLength {
            path: render(path),
            expected: rows,
            found: mask.len(),
        });
    }
    Ok(mask
        .iter()
        .enumerate()
        .filter_map(|(index, &keep)| keep.then_some(index))
        .collect())
}
