//! CSV Data Loader Module
//! Handles reading the source CSV into Polars and writing the cleaned table back.

use crate::error::{CleanerError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Timestamp layout used when persisting the cleaned table.
pub const OUTPUT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Handles CSV file loading and persistence with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Fail with `NotFound` unless `path` is a file we can open for reading.
    pub fn ensure_readable(path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(CleanerError::NotFound(path.to_path_buf()));
        }
        File::open(path).map_err(|_| CleanerError::NotFound(path.to_path_buf()))?;
        Ok(())
    }

    /// Load a CSV file using Polars.
    ///
    /// Structural problems (ragged rows, bad quoting, empty file) are reported
    /// as `Parse` errors; nothing is retried.
    pub fn load_csv(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
        Self::ensure_readable(path)?;
        info!("Loading source file: {}", path.display());

        let context = format!("CSV file {}", path.display());
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(infer_schema_length))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|e| CleanerError::parse(context.as_str(), e))?;

        if df.width() == 0 {
            return Err(CleanerError::parse(context, "no columns found"));
        }

        debug!("Loaded shape {:?}", df.shape());
        Ok(df)
    }

    /// Write the table as CSV with a header row and no index column.
    ///
    /// The rows go to a temporary file next to `path` that is renamed over it
    /// once complete, so a failed write never leaves a partial file behind.
    pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;
        let mut out = df.clone();
        CsvWriter::new(tmp.as_file_mut())
            .include_header(true)
            .with_datetime_format(Some(OUTPUT_DATETIME_FORMAT.to_string()))
            .finish(&mut out)?;
        tmp.persist(path).map_err(|e| e.error)?;

        info!("Cleaned data written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = DataLoader::load_csv(&dir.path().join("absent.csv"), 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let err = DataLoader::load_csv(dir.path(), 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_ragged_rows_are_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Date,Campagne,Impressions").unwrap();
        writeln!(file, "2024-01-01 10:00,Google Ads,100,7,8,9").unwrap();
        drop(file);

        let err = DataLoader::load_csv(&path, 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_write_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let df = df!(
            "Campagne" => ["Google Ads", "Facebook"],
            "Clics" => [40.0, 12.0],
        )
        .unwrap();

        DataLoader::write_csv(&df, &path).unwrap();
        let reloaded = DataLoader::load_csv(&path, 100).unwrap();

        assert_eq!(reloaded.shape(), (2, 2));
        assert_eq!(reloaded.get_column_names(), df.get_column_names());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.csv");
        std::fs::create_dir(&target).unwrap();
        let df = df!("Clics" => [40.0]).unwrap();

        let err = DataLoader::write_csv(&df, &target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("out.csv")]);
        assert!(target.is_dir());
    }
}
