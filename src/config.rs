//! Configuration management
//!
//! Every field has a default matching the marketing dataset layout, so a config
//! file is only needed to rename columns or change the accepted date formats.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Column names of the source table and of the derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub date: String,
    pub campaign: String,
    pub impressions: String,
    pub clicks: String,
    pub conversions: String,
    pub cost: String,
    /// Unused column dropped during pruning
    pub extraneous: String,

    pub day: String,
    pub hour: String,
    pub month: String,
    pub year: String,

    pub ctr: String,
    pub cvr: String,
    pub cpc: String,
    pub cpa: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            campaign: "Campagne".to_string(),
            impressions: "Impressions".to_string(),
            clicks: "Clics".to_string(),
            conversions: "Conversions".to_string(),
            cost: "Coût".to_string(),
            extraneous: "Inutile".to_string(),
            day: "Day".to_string(),
            hour: "Hour".to_string(),
            month: "Month".to_string(),
            year: "Year".to_string(),
            ctr: "CTR".to_string(),
            cvr: "CVR".to_string(),
            cpc: "CPC".to_string(),
            cpa: "CPA".to_string(),
        }
    }
}

impl Schema {
    /// The four numeric source columns, in imputation order.
    pub fn numeric_columns(&self) -> [&str; 4] {
        [
            self.impressions.as_str(),
            self.clicks.as_str(),
            self.conversions.as_str(),
            self.cost.as_str(),
        ]
    }

    /// Columns that must exist in the source file.
    pub fn required_columns(&self) -> [&str; 6] {
        [
            self.date.as_str(),
            self.campaign.as_str(),
            self.impressions.as_str(),
            self.clicks.as_str(),
            self.conversions.as_str(),
            self.cost.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub schema: Schema,
    /// chrono format strings, tried in order
    pub date_formats: Vec<String>,
    /// Multiplier applied to the IQR for outlier bounds
    pub iqr_factor: f64,
    /// Rows scanned by the CSV reader for type inference
    pub infer_schema_length: usize,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            date_formats: [
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%dT%H:%M",
                "%Y-%m-%dT%H:%M:%S%.f",
                "%m/%d/%Y %H:%M:%S",
                "%m/%d/%Y %H:%M",
                "%Y-%m-%d",
                "%m/%d/%Y",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
            iqr_factor: 1.5,
            infer_schema_length: 10000,
        }
    }
}

impl CleanerConfig {
    /// Load configuration from a JSON file; missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        if config.date_formats.is_empty() {
            anyhow::bail!("Config must list at least one date format");
        }
        if !config.iqr_factor.is_finite() || config.iqr_factor < 0.0 {
            anyhow::bail!("iqr_factor must be a non-negative number");
        }

        Ok(config)
    }
}
