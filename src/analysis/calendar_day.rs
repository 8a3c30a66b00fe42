use crate::types::series::{DailySeries, DATE_FORMAT};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// The observations of one month/day across every year of a series,
/// oldest year first, with missing values already dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalendarDaySample {
    points: Vec<(NaiveDate, f64)>,
}

impl CalendarDaySample {
    pub fn from_points(mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.sort_by_key(|(date, _)| *date);
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// `YYYYMMDD` to value, as reported back to callers.
    pub fn by_date_string(&self) -> BTreeMap<String, f64> {
        self.points
            .iter()
            .map(|(date, v)| (date.format(DATE_FORMAT).to_string(), *v))
            .collect()
    }
}

/// Selects the entries of `series` falling on `target`'s month and day.
pub fn extract(series: &DailySeries, target: NaiveDate) -> CalendarDaySample {
    let points = series
        .iter()
        .filter(|(date, _)| date.month() == target.month() && date.day() == target.day())
        .filter_map(|(date, value)| value.value().map(|v| (*date, v)))
        .collect();
    // Series iterate in date order, so the points are already ascending.
    CalendarDaySample { points }
}
