//! Daily series as delivered by the upstream provider and kept in the cache.

use crate::types::variable::Variable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

/// The numeric sentinel NASA POWER uses for "no data".
pub const MISSING_SENTINEL: f64 = -999.0;

/// The `YYYYMMDD` format used for series dates on the wire.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// A single day's observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SeriesValue {
    Value(f64),
    Missing,
}

impl SeriesValue {
    /// Maps a raw upstream number onto a value, folding the sentinel, `null`
    /// and non-finite numbers into [`SeriesValue::Missing`].
    pub fn from_raw(raw: Option<f64>) -> Self {
        match raw {
            Some(v) if v.is_finite() && v != MISSING_SENTINEL => SeriesValue::Value(v),
            _ => SeriesValue::Missing,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            SeriesValue::Value(v) => Some(*v),
            SeriesValue::Missing => None,
        }
    }
}

/// One variable's daily history at one coordinate, ordered by date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailySeries {
    points: BTreeMap<NaiveDate, SeriesValue>,
}

impl DailySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, value: SeriesValue) {
        self.points.insert(date, value);
    }

    pub fn get(&self, date: &NaiveDate) -> Option<SeriesValue> {
        self.points.get(date).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &SeriesValue)> {
        self.points.iter()
    }
}

impl FromIterator<(NaiveDate, SeriesValue)> for DailySeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, SeriesValue)>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Series for several variables at one coordinate.
pub type SeriesMap = BTreeMap<Variable, DailySeries>;

/// Copies the entries of `series` whose variable is in `variables`.
pub fn restrict(series: &SeriesMap, variables: &BTreeSet<Variable>) -> SeriesMap {
    series
        .iter()
        .filter(|(variable, _)| variables.contains(*variable))
        .map(|(variable, s)| (*variable, s.clone()))
        .collect()
}

/// Adds every variable of `incoming` that `existing` does not hold yet.
///
/// Variables already present in `existing` keep their series. Returns the
/// variables that were added.
pub fn merge_new_variables(existing: &mut SeriesMap, incoming: SeriesMap) -> Vec<Variable> {
    let mut added = Vec::new();
    for (variable, series) in incoming {
        if let Entry::Vacant(slot) = existing.entry(variable) {
            slot.insert(series);
            added.push(variable);
        }
    }
    added
}
