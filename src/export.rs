//! CSV export of calendar-day samples.

use crate::analysis::calendar_day::CalendarDaySample;
use crate::types::variable::Variable;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Lays the samples out as one row per observed date (`YYYYMMDD`, ascending)
/// and one nullable column per variable.
pub fn samples_to_frame(
    samples: &BTreeMap<Variable, CalendarDaySample>,
) -> Result<DataFrame, PolarsError> {
    let by_variable: Vec<(Variable, BTreeMap<String, f64>)> = samples
        .iter()
        .map(|(variable, sample)| (*variable, sample.by_date_string()))
        .collect();
    let dates: BTreeSet<String> = by_variable
        .iter()
        .flat_map(|(_, values)| values.keys().cloned())
        .collect();

    let mut columns = Vec::with_capacity(by_variable.len() + 1);
    columns.push(Column::new(
        "date".into(),
        dates.iter().cloned().collect::<Vec<String>>(),
    ));
    for (variable, values) in &by_variable {
        let column: Vec<Option<f64>> = dates.iter().map(|d| values.get(d).copied()).collect();
        columns.push(Column::new(variable.code().into(), column));
    }
    DataFrame::new(columns)
}

pub fn samples_to_csv(
    samples: &BTreeMap<Variable, CalendarDaySample>,
) -> Result<String, PolarsError> {
    let mut df = samples_to_frame(samples)?;
    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut df)?;
    String::from_utf8(buffer).map_err(|e| PolarsError::ComputeError(e.to_string().into()))
}
