//! Statistics Calculator Module
//! Handles the statistics used by the cleaner: medians, quantiles, descriptive
//! summaries, IQR outlier bounds and the linear trend for the daily chart.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn empty(column: &str) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Interquartile range and the fences derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearTrend {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Median of the values, `None` when there are none.
    pub fn median(values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n == 0 {
            return None;
        }
        let sorted = Self::sorted(values);
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Some(median)
    }

    /// `p`-th percentile of already sorted values, interpolating between the two
    /// nearest ranks. Quartiles for the outlier fences and `describe` come from here.
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Count, mean, sample std, min, quartiles and max, like `DataFrame.describe()`.
    pub fn describe(column: &str, values: &[f64]) -> ColumnSummary {
        if values.is_empty() {
            return ColumnSummary::empty(column);
        }

        let sorted = Self::sorted(values);
        ColumnSummary {
            column: column.to_string(),
            count: values.len(),
            mean: values.iter().mean(),
            std: values.iter().std_dev(),
            min: Statistics::min(values.iter()),
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: Statistics::max(values.iter()),
        }
    }

    /// Tukey fences `[Q1 - factor*IQR, Q3 + factor*IQR]`.
    pub fn iqr_bounds(values: &[f64], factor: f64) -> Option<IqrBounds> {
        if values.is_empty() {
            return None;
        }
        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        Some(IqrBounds {
            q1,
            q3,
            iqr,
            lower: q1 - factor * iqr,
            upper: q3 + factor * iqr,
        })
    }

    /// Ordinary least squares fit over `(0, y0), (1, y1), ...`.
    pub fn linear_trend(values: &[f64]) -> Option<LinearTrend> {
        let n = values.len();
        if n < 2 {
            return None;
        }

        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let x_mean = xs.iter().mean();
        let y_mean = values.iter().mean();

        let (num, denom) = xs
            .iter()
            .zip(values)
            .fold((0.0, 0.0), |(num, denom), (x, y)| {
                (num + (x - x_mean) * (y - y_mean), denom + (x - x_mean).powi(2))
            });

        let slope = num / denom;
        Some(LinearTrend {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }
}
