//! Dataset Cleaner
//! Runs the cleaning passes in order over one resident table. The whole
//! operation either yields a fully cleaned table or nothing.

use super::loader::DataLoader;
use super::processor::DataProcessor;
use super::report::CleaningReport;
use crate::config::CleanerConfig;
use crate::error::Result;
use crate::stats::{ColumnSummary, StatsCalculator};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// A cleaned table together with what was done to it.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub df: DataFrame,
    pub report: CleaningReport,
}

pub struct DatasetCleaner {
    config: CleanerConfig,
}

impl Default for DatasetCleaner {
    fn default() -> Self {
        Self::new(CleanerConfig::default())
    }
}

impl DatasetCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Clean `input`, failing with the first error encountered.
    pub fn clean(&self, input: &Path, output: Option<&Path>) -> Result<CleanedDataset> {
        let schema = &self.config.schema;
        let mut report = CleaningReport {
            source: input.display().to_string(),
            ..Default::default()
        };

        let mut df = DataLoader::load_csv(input, self.config.infer_schema_length)?;
        report.input_shape = df.shape();
        report.input_dtypes = CleaningReport::dtypes(&df);
        report.missing_before = CleaningReport::missing_counts(&df);
        info!(
            "Loaded {} rows x {} columns",
            report.input_shape.0, report.input_shape.1
        );
        for (column, missing) in report.missing_before.iter().filter(|(_, n)| **n > 0) {
            debug!("{}: {} missing values", column, missing);
        }

        DataProcessor::validate_schema(&mut df, schema)?;

        let timestamps = DataProcessor::parse_dates(&mut df, &schema.date, &self.config.date_formats)?;
        DataProcessor::decompose_dates(&mut df, &timestamps, schema)?;
        debug!("Parsed {} timestamps", timestamps.len());

        for column in schema.numeric_columns() {
            let imputation = DataProcessor::impute_median(&mut df, column)?;
            match imputation.median {
                Some(median) if imputation.filled > 0 => info!(
                    "{}: filled {} missing values with median {}",
                    column, imputation.filled, median
                ),
                None => warn!("{}: no values present, median undefined", column),
                _ => {}
            }
            report.imputations.push(imputation);
        }

        DataProcessor::derive_metrics(&mut df, schema)?;

        report.coercion = DataProcessor::coerce_non_finite(&mut df)?;
        if report.coercion.missing_zeroed > 0 {
            info!(
                "Replaced {} non-finite values; {} missing values set to zero",
                report.coercion.non_finite, report.coercion.missing_zeroed
            );
        }

        if DataProcessor::prune_column(&mut df, &schema.extraneous)? {
            info!("Dropped column '{}'", schema.extraneous);
            report.dropped_column = Some(schema.extraneous.clone());
        }

        report.duplicates_removed = DataProcessor::deduplicate(&mut df)?;
        info!("Removed {} duplicate rows", report.duplicates_removed);

        report.outliers =
            DataProcessor::detect_outliers(&df, &schema.numeric_columns(), self.config.iqr_factor)?;
        for outliers in &report.outliers {
            info!("{}: {} outliers detected", outliers.column, outliers.count);
        }

        report.summary = Self::summarize(&df)?;
        report.missing_after = CleaningReport::missing_counts(&df);
        report.output_shape = df.shape();
        report.output_dtypes = CleaningReport::dtypes(&df);

        if let Some(path) = output {
            DataLoader::write_csv(&df, path)?;
            report.output = Some(path.display().to_string());
        }

        info!(
            "Cleaning complete: {} rows x {} columns",
            report.output_shape.0, report.output_shape.1
        );
        Ok(CleanedDataset { df, report })
    }

    /// Top-level boundary: log the failure and hand back `None` instead of an error.
    pub fn run(&self, input: &Path, output: Option<&Path>) -> Option<CleanedDataset> {
        match self.clean(input, output) {
            Ok(cleaned) => Some(cleaned),
            Err(e) => {
                error!(kind = ?e.kind(), "Cleaning failed: {}", e);
                None
            }
        }
    }

    fn summarize(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
        df.get_columns()
            .iter()
            .filter(|c| c.dtype().is_primitive_numeric())
            .map(|c| {
                let name = c.name().to_string();
                let values: Vec<f64> = DataProcessor::float_values(df, &name)?
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(StatsCalculator::describe(&name, &values))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const HEADER: &str = "Date,Campagne,Impressions,Clics,Conversions,Coût,Inutile";

    fn write_source(rows: &[&str]) -> (TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dataset_marketing_dataviz.csv");
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn f64_at(df: &DataFrame, column: &str, row: usize) -> f64 {
        df.column(column).unwrap().f64().unwrap().get(row).unwrap()
    }

    #[test]
    fn test_scenario_missing_clicks_takes_median() {
        let (_dir, path) = write_source(&[
            "2024-01-01 10:00,Google Ads,1000,,5,20.0,x",
            "2024-01-01 11:00,Facebook,800,30,3,12.0,x",
            "2024-01-02 09:00,Instagram,900,40,4,16.0,x",
            "2024-01-02 14:00,LinkedIn,700,50,2,25.0,x",
        ]);

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();
        let df = &cleaned.df;

        assert_eq!(f64_at(df, "Clics", 0), 40.0);
        assert_eq!(f64_at(df, "CTR", 0), 4.0);
        assert_eq!(f64_at(df, "CVR", 0), 12.5);
        assert_eq!(f64_at(df, "CPA", 0), 4.0);
        assert_eq!(f64_at(df, "CPC", 0), 0.5);
        assert_eq!(cleaned.report.imputations[1].median, Some(40.0));
        assert_eq!(cleaned.report.imputations[1].filled, 1);
    }

    #[test]
    fn test_scenario_zero_clicks_and_conversions() {
        let (_dir, path) = write_source(&[
            "2024-01-01 10:00,Google Ads,1000,0,0,20.0,x",
            "2024-01-01 11:00,Facebook,800,30,3,12.0,x",
        ]);

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();
        let df = &cleaned.df;

        assert_eq!(f64_at(df, "CVR", 0), 0.0);
        assert_eq!(f64_at(df, "CPA", 0), 0.0);
        assert_eq!(f64_at(df, "CPC", 0), 0.0);
        for metric in ["CTR", "CVR", "CPC", "CPA"] {
            let ca = df.column(metric).unwrap().f64().unwrap();
            assert_eq!(ca.null_count(), 0);
            assert!(ca.into_iter().flatten().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_scenario_duplicate_rows_collapse() {
        let (_dir, path) = write_source(&[
            "2024-01-01 10:00,Google Ads,1000,40,5,20.0,x",
            "2024-01-01 10:00,Google Ads,1000,40,5,20.0,x",
            "2024-01-01 11:00,Facebook,800,30,3,12.0,x",
        ]);

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();

        assert_eq!(cleaned.report.duplicates_removed, 1);
        assert_eq!(cleaned.df.height(), 2);
    }

    #[test]
    fn test_rows_differing_only_in_extraneous_column_are_duplicates() {
        let (_dir, path) = write_source(&[
            "2024-01-01 10:00,Google Ads,1000,40,5,20.0,a",
            "2024-01-01 10:00,Google Ads,1000,40,5,20.0,b",
        ]);

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();

        assert_eq!(cleaned.report.duplicates_removed, 1);
        assert_eq!(cleaned.report.dropped_column.as_deref(), Some("Inutile"));
        assert!(cleaned.df.column("Inutile").is_err());
    }

    #[test]
    fn test_without_extraneous_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(
            &path,
            "Date,Campagne,Impressions,Clics,Conversions,Coût\n\
             2024-01-01 10:00,Google Ads,1000,40,5,20.0\n",
        )
        .unwrap();

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();

        assert!(cleaned.report.dropped_column.is_none());
        assert_eq!(cleaned.df.width(), 14);
    }

    #[test]
    fn test_round_trip_output() {
        let (dir, path) = write_source(&[
            "2024-01-01 10:00,Google Ads,1000,,5,20.0,x",
            "2024-01-02 11:00,Facebook,800,30,3,,x",
            "2024-01-03 12:00,Instagram,,40,4,16.0,x",
        ]);
        let output = dir.path().join("cleaned.csv");

        let cleaned = DatasetCleaner::default().clean(&path, Some(&output)).unwrap();
        let reread = DataLoader::load_csv(&output, 100).unwrap();

        assert_eq!(reread.height(), cleaned.df.height());
        assert_eq!(reread.get_column_names(), cleaned.df.get_column_names());
        assert_eq!(cleaned.report.output.as_deref(), Some(output.display().to_string().as_str()));

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("Date,Campagne,"));
        assert!(content.contains("2024-01-01 10:00:00"));
    }

    #[test]
    fn test_cleaned_numeric_columns_have_no_missing_values() {
        let (_dir, path) = write_source(&[
            "2024-01-01 10:00,Google Ads,,,,,x",
            "2024-01-01 11:00,,800,30,3,12.0,",
            "2024-01-02 12:00,Facebook,1200,50,7,30.0,x",
        ]);

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();

        assert!(cleaned.report.missing_after.values().all(|n| *n == 0));
        assert_eq!(f64_at(&cleaned.df, "Impressions", 0), 1000.0);
        let campaigns = cleaned.df.column("Campagne").unwrap();
        assert_eq!(campaigns.str().unwrap().get(1), Some("0"));
    }

    #[test]
    fn test_outliers_reported_without_changing_rows() {
        let (_dir, path) = write_source(&[
            "2024-01-01 10:00,A,1,10,1,1.0,x",
            "2024-01-01 11:00,A,2,10,1,1.0,x",
            "2024-01-01 12:00,A,3,10,1,1.0,x",
            "2024-01-01 13:00,A,4,10,1,1.0,x",
            "2024-01-01 14:00,A,100,10,1,1.0,x",
        ]);

        let cleaned = DatasetCleaner::default().clean(&path, None).unwrap();

        assert_eq!(cleaned.report.outliers[0].column, "Impressions");
        assert_eq!(cleaned.report.outliers[0].count, 1);
        assert_eq!(cleaned.report.total_outliers(), 1);
        assert_eq!(cleaned.df.height(), 5);
    }

    #[test]
    fn test_failures_are_atomic() {
        let dir = tempdir().unwrap();
        let cleaner = DatasetCleaner::default();

        let missing = dir.path().join("nope.csv");
        assert_eq!(cleaner.clean(&missing, None).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(cleaner.run(&missing, None).is_none());

        let (_dir, bad_dates) = write_source(&[
            "2024-01-01 10:00,Google Ads,1000,40,5,20.0,x",
            "someday,Facebook,800,30,3,12.0,x",
        ]);
        let output = dir.path().join("never.csv");
        let err = cleaner.clean(&bad_dates, Some(&output)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(!output.exists());
    }

    #[test]
    fn test_unwritable_output_is_unexpected_failure() {
        let (dir, path) = write_source(&["2024-01-01 10:00,Google Ads,1000,40,5,20.0,x"]);
        let output = dir.path().join("no_such_dir").join("cleaned.csv");
        let cleaner = DatasetCleaner::default();

        let err = cleaner.clean(&path, Some(&output)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(cleaner.run(&path, Some(&output)).is_none());
        assert!(!output.exists());
    }
}
