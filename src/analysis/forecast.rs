//! One-step-ahead linear trend forecast with a residual bias correction.
//!
//! The sample is read as `(i, value)` with `i = 0..n` in chronological order.
//! A least-squares line is fitted and evaluated at `i = n`. The mean residual
//! of every point except the three most recent is then added on top. With
//! three points or fewer that slice is empty and no correction is applied.

use crate::analysis::calendar_day::CalendarDaySample;
use crate::analysis::AnalysisError;

/// Points excluded from the residual correction, counted from the end.
pub const RECENT_POINTS_EXCLUDED: usize = 3;

/// Slope and intercept of the least-squares line through the points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fits `values[i]` against `i`. Needs at least two points.
pub fn fit_line(values: &[f64]) -> Result<LinearFit, AnalysisError> {
    let n = values.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            statistic: "forecast",
            required: 2,
            available: n,
        });
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Mean residual over all but the last [`RECENT_POINTS_EXCLUDED`] points,
/// `0` when nothing is left.
pub fn residual_bias(values: &[f64], fit: &LinearFit) -> f64 {
    let kept = values.len().saturating_sub(RECENT_POINTS_EXCLUDED);
    if kept == 0 {
        return 0.0;
    }
    let total: f64 = values[..kept]
        .iter()
        .enumerate()
        .map(|(i, y)| y - fit.at(i as f64))
        .sum();
    total / kept as f64
}

pub fn predict_next(sample: &CalendarDaySample) -> Result<f64, AnalysisError> {
    let values = sample.values();
    let fit = fit_line(&values)?;
    Ok(fit.at(values.len() as f64) + residual_bias(&values, &fit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(values: &[f64]) -> CalendarDaySample {
        CalendarDaySample::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (NaiveDate::from_ymd_opt(2010 + i as i32, 8, 20).unwrap(), *v))
                .collect(),
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_line_extrapolates_exactly() {
        let s = sample(&[1.0, 3.0, 5.0, 7.0, 9.0, 11.0]);
        assert!(close(predict_next(&s).unwrap(), 13.0));
    }

    #[test]
    fn test_residual_bias_excludes_last_three() {
        // Fit: y = 2x - 2, residuals [2, 0, -2, -4, 4], bias = mean([2, 0]) = 1.
        let values = [0.0, 0.0, 0.0, 0.0, 10.0];
        let fit = fit_line(&values).unwrap();
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, -2.0));
        assert!(close(residual_bias(&values, &fit), 1.0));
        assert!(close(predict_next(&sample(&values)).unwrap(), 9.0));
    }

    #[test]
    fn test_three_points_get_no_correction() {
        // Fit: slope 1.5, intercept 5/6; at x = 3 the line gives 16/3.
        let values = [1.0, 2.0, 4.0];
        let fit = fit_line(&values).unwrap();
        assert_eq!(residual_bias(&values, &fit), 0.0);
        assert!(close(predict_next(&sample(&values)).unwrap(), 16.0 / 3.0));
    }

    #[test]
    fn test_two_points_fit_exactly() {
        assert!(close(predict_next(&sample(&[4.0, 6.0])).unwrap(), 8.0));
    }

    #[test]
    fn test_fewer_than_two_points_is_insufficient() {
        assert!(matches!(
            predict_next(&sample(&[4.0])),
            Err(AnalysisError::InsufficientData {
                required: 2,
                available: 1,
                ..
            })
        ));
        assert!(predict_next(&CalendarDaySample::default()).is_err());
    }
}
