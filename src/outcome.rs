//! Weighted Outcome Tables
//!
//! A [`WeightedTable`] partitions `[0, total)` into contiguous intervals, one per entry, in
//! declaration order. [`RandomBranchSelector`] maps a drawn integer onto that partition.
//!
//! Lookup walks the cumulative thresholds from the highest one downward: the first entry whose
//! lower bound is `<= roll` wins. For gap-free half-open intervals that is the same partition
//! as an ascending scan, so `draw` is a pure function of `(table, roll)`.

use crate::error::TableError;
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// One entry of a weighted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub weight: u32,
    pub outcome: T,
}

/// Ordered `(weight, outcome)` pairs with precomputed lower bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedTable<T> {
    entries: Vec<WeightedEntry<T>>,
    /// `lower[i]` is the sum of the weights declared before entry `i`.
    lower: Vec<u32>,
    total: u32,
}

impl<T> WeightedTable<T> {
    pub fn new(pairs: impl IntoIterator<Item = (u32, T)>) -> Result<Self, TableError> {
        let mut entries = Vec::new();
        let mut lower = Vec::new();
        let mut total: u32 = 0;
        for (weight, outcome) in pairs {
            lower.push(total);
            total = total
                .checked_add(weight)
                .ok_or(TableError::WeightOverflow)?;
            entries.push(WeightedEntry { weight, outcome });
        }

        if entries.is_empty() {
            return Err(TableError::Empty);
        }
        if total == 0 {
            return Err(TableError::ZeroTotal);
        }

        Ok(Self {
            entries,
            lower,
            total,
        })
    }

    /// Sum of all weights (`T`).
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[WeightedEntry<T>] {
        &self.entries
    }

    /// Half-open interval `[start, end)` owned by entry `index`.
    pub fn interval(&self, index: usize) -> Option<(u32, u32)> {
        let entry = self.entries.get(index)?;
        let start = self.lower[index];
        Some((start, start + entry.weight))
    }

    /// Index of the entry owning `roll`.
    pub fn index_of(&self, roll: u32) -> Result<usize, TableError> {
        if roll >= self.total {
            return Err(TableError::OutOfRange {
                roll,
                total: self.total,
            });
        }

        // Highest threshold first. Zero-weight entries own nothing and are skipped.
        for index in (0..self.entries.len()).rev() {
            if self.entries[index].weight > 0 && roll >= self.lower[index] {
                return Ok(index);
            }
        }

        // Unreachable for a validated table: entry 0 has lower bound 0, and any zero-weight
        // prefix is followed by a positive entry whose lower bound is still 0.
        Err(TableError::OutOfRange {
            roll,
            total: self.total,
        })
    }
}

/// A drawn outcome together with the integer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw<'a, T> {
    pub roll: u32,
    pub index: usize,
    pub outcome: &'a T,
}

/// Maps integers in `[0, T)` to outcomes of a [`WeightedTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomBranchSelector<T> {
    table: WeightedTable<T>,
}

impl<T> RandomBranchSelector<T> {
    pub fn new(table: WeightedTable<T>) -> Self {
        Self { table }
    }

    pub fn from_weights(pairs: impl IntoIterator<Item = (u32, T)>) -> Result<Self, TableError> {
        Ok(Self::new(WeightedTable::new(pairs)?))
    }

    pub fn table(&self) -> &WeightedTable<T> {
        &self.table
    }

    /// Pure lookup: the outcome owning `roll`.
    pub fn draw(&self, roll: u32) -> Result<&T, TableError> {
        let index = self.table.index_of(roll)?;
        Ok(&self.table.entries[index].outcome)
    }

    /// Consume exactly one value from `rng` and map it.
    pub fn roll<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Draw<'_, T>, TableError> {
        let roll = rng.next_int(self.table.total);
        let index = self.table.index_of(roll)?;
        Ok(Draw {
            roll,
            index,
            outcome: &self.table.entries[index].outcome,
        })
    }
}
