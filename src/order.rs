//! Ordering of uploaded files before conversion.
//!
//! The caller assigns every file a 1-based target position. Files are then
//! sorted ascending by position; ties keep their original relative order.
//! Positions supplied by a user must form a permutation of `1..=N`, anything
//! else is rejected rather than silently fixed up.

use std::str::FromStr;

use anyhow::{Context, bail};

use crate::error::{MixError, Result};

/// Target position for each uploaded file, indexed by upload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOrder {
    positions: Vec<usize>,
}

impl FileOrder {
    /// Keep files in upload order.
    pub fn identity(len: usize) -> Self {
        Self {
            positions: (1..=len).collect(),
        }
    }

    /// Build an order from user-assigned positions.
    ///
    /// # Errors
    ///
    /// Returns [`MixError::InvalidOrder`] unless `positions` has exactly
    /// `len` entries forming a permutation of `1..=len`.
    pub fn from_positions(positions: Vec<usize>, len: usize) -> Result<Self> {
        if positions.len() != len {
            return Err(MixError::invalid_order(format!(
                "{} position(s) given for {len} file(s)",
                positions.len()
            )));
        }

        let mut seen = vec![false; len];
        for &position in &positions {
            if position == 0 || position > len {
                return Err(MixError::invalid_order(format!(
                    "position {position} is outside 1..={len}"
                )));
            }
            if std::mem::replace(&mut seen[position - 1], true) {
                return Err(MixError::invalid_order(format!(
                    "position {position} is assigned more than once"
                )));
            }
        }

        Ok(Self { positions })
    }

    /// Number of files this order covers.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the order covers no files.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Target positions in upload order.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Reorder `items` by their target positions.
    ///
    /// # Errors
    ///
    /// Returns [`MixError::InvalidOrder`] if `items` and the order differ in
    /// length.
    pub fn apply<T>(&self, items: Vec<T>) -> Result<Vec<T>> {
        if items.len() != self.positions.len() {
            return Err(MixError::invalid_order(format!(
                "order covers {} file(s) but {} were uploaded",
                self.positions.len(),
                items.len()
            )));
        }
        Ok(sort_by_positions(items, &self.positions))
    }
}

/// Stable sort of `items` ascending by `positions`.
///
/// Items without a position keep their original index as position. No
/// validation happens here; duplicate positions keep upload order.
pub fn sort_by_positions<T>(items: Vec<T>, positions: &[usize]) -> Vec<T> {
    let mut keyed: Vec<(usize, T)> = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| (positions.get(idx).copied().unwrap_or(idx + 1), item))
        .collect();

    keyed.sort_by_key(|(position, _)| *position);
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Positions as typed on the command line, e.g. `"3,1,2"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec(pub Vec<usize>);

impl FromStr for OrderSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut positions = Vec::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                bail!("Empty position in order '{s}'");
            }
            let position: usize = part
                .parse()
                .with_context(|| format!("Invalid position: {part}"))?;
            positions.push(position);
        }

        Ok(Self(positions))
    }
}
