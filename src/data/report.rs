//! Diagnostic report produced alongside the cleaned table.

use super::processor::{CoercionCounts, Imputation, OutlierSummary};
use crate::stats::ColumnSummary;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnType {
    pub column: String,
    pub dtype: String,
}

/// Everything the cleaner observed. Building it never touches the data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub source: String,
    pub input_shape: (usize, usize),
    pub input_dtypes: Vec<ColumnType>,
    pub missing_before: BTreeMap<String, usize>,
    pub imputations: Vec<Imputation>,
    pub coercion: CoercionCounts,
    pub dropped_column: Option<String>,
    pub duplicates_removed: usize,
    pub outliers: Vec<OutlierSummary>,
    pub summary: Vec<ColumnSummary>,
    pub missing_after: BTreeMap<String, usize>,
    pub output_shape: (usize, usize),
    pub output_dtypes: Vec<ColumnType>,
    pub output: Option<String>,
}

impl CleaningReport {
    pub fn dtypes(df: &DataFrame) -> Vec<ColumnType> {
        df.get_columns()
            .iter()
            .map(|c| ColumnType {
                column: c.name().to_string(),
                dtype: c.dtype().to_string(),
            })
            .collect()
    }

    pub fn missing_counts(df: &DataFrame) -> BTreeMap<String, usize> {
        df.get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }

    pub fn total_outliers(&self) -> usize {
        self.outliers.iter().map(|o| o.count).sum()
    }

    /// Write the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_counts_and_dtypes() {
        let df = df!(
            "Campagne" => [Some("A"), None],
            "Clics" => [Some(1.0), Some(2.0)],
        )
        .unwrap();

        let missing = CleaningReport::missing_counts(&df);
        assert_eq!(missing["Campagne"], 1);
        assert_eq!(missing["Clics"], 0);

        let dtypes = CleaningReport::dtypes(&df);
        assert_eq!(dtypes[1].column, "Clics");
        assert_eq!(dtypes[1].dtype, DataType::Float64.to_string());
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = CleaningReport {
            source: "data.csv".to_string(),
            duplicates_removed: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["duplicates_removed"], 1);
        assert_eq!(json["source"], "data.csv");
    }
}
