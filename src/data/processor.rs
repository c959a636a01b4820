//! Data Processor Module
//! The individual cleaning passes. Each pass rewrites the table in place and
//! returns whatever the report needs to know about what it did.

use crate::config::Schema;
use crate::error::{CleanerError, Result};
use crate::stats::{IqrBounds, StatsCalculator};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use serde::Serialize;

/// Median imputation applied to one column.
#[derive(Debug, Clone, Serialize)]
pub struct Imputation {
    pub column: String,
    /// `None` when the column had no values to take a median from
    pub median: Option<f64>,
    pub filled: usize,
}

/// Counts from the table-wide non-finite coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoercionCounts {
    pub non_finite: usize,
    pub missing_zeroed: usize,
}

/// Outlier diagnostics for one column. Values are never altered.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierSummary {
    pub column: String,
    pub bounds: Option<IqrBounds>,
    pub count: usize,
}

pub struct DataProcessor;

impl DataProcessor {
    fn has_column(df: &DataFrame, name: &str) -> bool {
        df.get_column_index(name).is_some()
    }

    /// Read a column as `f64` values; null and NaN are both missing.
    pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let casted = df.column(name)?.cast(&DataType::Float64)?;
        let ca = casted.f64()?;
        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect())
    }

    /// Check the source columns exist and coerce the numeric ones to Float64.
    ///
    /// A numeric column holding text that does not parse as a number is a
    /// parse error rather than silently becoming missing.
    pub fn validate_schema(df: &mut DataFrame, schema: &Schema) -> Result<()> {
        for name in schema.required_columns() {
            if !Self::has_column(df, name) {
                return Err(CleanerError::parse(
                    "table structure",
                    format!("required column '{}' is missing", name),
                ));
            }
        }

        for name in schema.numeric_columns() {
            let column = df.column(name)?;
            let nulls_before = column.null_count();
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| CleanerError::parse(format!("column '{}'", name), e))?;
            if casted.null_count() > nulls_before {
                return Err(CleanerError::parse(
                    format!("column '{}'", name),
                    "contains non-numeric values",
                ));
            }
            df.with_column(casted)?;
        }
        Ok(())
    }

    fn parse_timestamp(raw: &str, formats: &[String]) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        formats.iter().find_map(|fmt| {
            NaiveDateTime::parse_from_str(raw, fmt).ok().or_else(|| {
                NaiveDate::parse_from_str(raw, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
    }

    /// Parse the date column into `Datetime(ms)` and return the parsed values.
    ///
    /// Any missing or unparseable date aborts the whole load.
    pub fn parse_dates(
        df: &mut DataFrame,
        column: &str,
        formats: &[String],
    ) -> Result<Vec<NaiveDateTime>> {
        let context = format!("column '{}'", column);
        let as_text = df
            .column(column)?
            .cast(&DataType::String)
            .map_err(|e| CleanerError::parse(context.as_str(), e))?;
        let ca = as_text
            .str()
            .map_err(|e| CleanerError::parse(context.as_str(), e))?;

        let mut parsed = Vec::with_capacity(ca.len());
        for (row, value) in ca.into_iter().enumerate() {
            let raw = value.ok_or_else(|| {
                CleanerError::parse(context.as_str(), format!("row {} has no date", row))
            })?;
            let ts = Self::parse_timestamp(raw, formats).ok_or_else(|| {
                CleanerError::parse(
                    context.as_str(),
                    format!("row {}: cannot parse date '{}'", row, raw),
                )
            })?;
            parsed.push(ts);
        }

        let millis: Vec<i64> = parsed
            .iter()
            .map(|ts| ts.and_utc().timestamp_millis())
            .collect();
        let series = Series::new(column.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        df.with_column(series)?;

        Ok(parsed)
    }

    /// Add day-of-month, hour, month and year columns.
    pub fn decompose_dates(
        df: &mut DataFrame,
        timestamps: &[NaiveDateTime],
        schema: &Schema,
    ) -> Result<()> {
        let day: Vec<i32> = timestamps.iter().map(|t| t.day() as i32).collect();
        let hour: Vec<i32> = timestamps.iter().map(|t| t.hour() as i32).collect();
        let month: Vec<i32> = timestamps.iter().map(|t| t.month() as i32).collect();
        let year: Vec<i32> = timestamps.iter().map(|t| t.year()).collect();

        df.with_column(Column::new(schema.day.as_str().into(), day))?;
        df.with_column(Column::new(schema.hour.as_str().into(), hour))?;
        df.with_column(Column::new(schema.month.as_str().into(), month))?;
        df.with_column(Column::new(schema.year.as_str().into(), year))?;
        Ok(())
    }

    /// Fill missing values of one column with the median of its present values.
    pub fn impute_median(df: &mut DataFrame, column: &str) -> Result<Imputation> {
        let values = Self::float_values(df, column)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let filled = values.len() - present.len();
        let median = StatsCalculator::median(&present);

        if filled > 0 {
            if let Some(m) = median {
                let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(m)).collect();
                df.with_column(Column::new(column.into(), imputed))?;
            }
        }

        Ok(Imputation {
            column: column.to_string(),
            median,
            filled: if median.is_some() { filled } else { 0 },
        })
    }

    fn ratio(
        numerator: &[Option<f64>],
        denominator: &[Option<f64>],
        scale: f64,
    ) -> Vec<Option<f64>> {
        numerator
            .iter()
            .zip(denominator)
            .map(|(n, d)| match (n, d) {
                (Some(n), Some(d)) => Some(n / d * scale),
                _ => None,
            })
            .collect()
    }

    /// Add CTR, CVR, CPC and CPA. Zero denominators leave ±inf or NaN behind.
    pub fn derive_metrics(df: &mut DataFrame, schema: &Schema) -> Result<()> {
        let impressions = Self::float_values(df, &schema.impressions)?;
        let clicks = Self::float_values(df, &schema.clicks)?;
        let conversions = Self::float_values(df, &schema.conversions)?;
        let cost = Self::float_values(df, &schema.cost)?;

        let ctr = Self::ratio(&clicks, &impressions, 100.0);
        let cvr = Self::ratio(&conversions, &clicks, 100.0);
        let cpc = Self::ratio(&cost, &clicks, 1.0);
        let cpa = Self::ratio(&cost, &conversions, 1.0);

        df.with_column(Column::new(schema.ctr.as_str().into(), ctr))?;
        df.with_column(Column::new(schema.cvr.as_str().into(), cvr))?;
        df.with_column(Column::new(schema.cpc.as_str().into(), cpc))?;
        df.with_column(Column::new(schema.cpa.as_str().into(), cpa))?;
        Ok(())
    }

    /// Turn every ±inf/NaN into missing, then zero every missing value in the
    /// whole table. Text columns get `"0"`, boolean columns `false`.
    pub fn coerce_non_finite(df: &mut DataFrame) -> Result<CoercionCounts> {
        let mut counts = CoercionCounts::default();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for name in names {
            let column = df.column(&name)?;
            let replacement: Option<Series> = match column.dtype() {
                DataType::Float32 | DataType::Float64 => {
                    let casted = column.cast(&DataType::Float64)?;
                    let ca = casted.f64()?;
                    let nulls = ca.null_count();
                    let non_finite = ca.into_iter().flatten().filter(|v| !v.is_finite()).count();
                    counts.non_finite += non_finite;
                    counts.missing_zeroed += nulls + non_finite;
                    if nulls + non_finite == 0 {
                        None
                    } else {
                        let out: Vec<f64> = ca
                            .into_iter()
                            .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
                            .collect();
                        Some(Series::new(name.as_str().into(), out))
                    }
                }
                dtype if dtype.is_integer() && column.null_count() > 0 => {
                    counts.missing_zeroed += column.null_count();
                    let casted = column.cast(&DataType::Int64)?;
                    let out: Vec<i64> = casted.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect();
                    Some(Series::new(name.as_str().into(), out).cast(dtype)?)
                }
                DataType::String if column.null_count() > 0 => {
                    counts.missing_zeroed += column.null_count();
                    let out: Vec<String> = column
                        .str()?
                        .into_iter()
                        .map(|v| v.unwrap_or("0").to_string())
                        .collect();
                    Some(Series::new(name.as_str().into(), out))
                }
                DataType::Boolean if column.null_count() > 0 => {
                    counts.missing_zeroed += column.null_count();
                    let out: Vec<bool> = column
                        .bool()?
                        .into_iter()
                        .map(|v| v.unwrap_or(false))
                        .collect();
                    Some(Series::new(name.as_str().into(), out))
                }
                dtype if column.null_count() > 0 => {
                    return Err(CleanerError::Unexpected(format!(
                        "column '{}' of type {} has {} missing values and no zero value",
                        name,
                        dtype,
                        column.null_count()
                    )));
                }
                _ => None,
            };

            if let Some(series) = replacement {
                df.with_column(series)?;
            }
        }

        Ok(counts)
    }

    /// Drop the extraneous column; returns whether it was present.
    pub fn prune_column(df: &mut DataFrame, column: &str) -> Result<bool> {
        if !Self::has_column(df, column) {
            return Ok(false);
        }
        *df = df.drop(column)?;
        Ok(true)
    }

    /// Remove exact full-row duplicates keeping the first occurrence.
    /// Returns the number of rows removed.
    pub fn deduplicate(df: &mut DataFrame) -> Result<usize> {
        let before = df.height();
        *df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        Ok(before - df.height())
    }

    /// Count values outside the IQR fences of each column.
    pub fn detect_outliers(
        df: &DataFrame,
        columns: &[&str],
        factor: f64,
    ) -> Result<Vec<OutlierSummary>> {
        columns
            .iter()
            .map(|&name| {
                let values: Vec<f64> = Self::float_values(df, name)?
                    .into_iter()
                    .flatten()
                    .collect();
                let bounds = StatsCalculator::iqr_bounds(&values, factor);
                let count = bounds
                    .map(|b| values.iter().filter(|v| !b.contains(**v)).count())
                    .unwrap_or(0);
                Ok(OutlierSummary {
                    column: name.to_string(),
                    bounds,
                    count,
                })
            })
            .collect()
    }
}
