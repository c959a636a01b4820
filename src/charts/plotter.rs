//! Chart Data Module
//! Read-only aggregations over the cleaned table that feed the static charts.

use crate::config::Schema;
use crate::data::DataProcessor;
use crate::error::Result;
use crate::stats::{LinearTrend, StatsCalculator};
use chrono::NaiveDate;
use plotters::style::RGBColor;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignTotal {
    pub campaign: String,
    pub impressions: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub clicks: f64,
}

/// Daily click totals in date order plus the fitted trend line.
#[derive(Debug, Clone)]
pub struct ClickSeries {
    pub days: Vec<DailyClicks>,
    pub trend: Option<LinearTrend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignPerformance {
    pub campaign: String,
    pub avg_clicks: f64,
    pub avg_conversions: f64,
    /// Total conversions / total clicks x 100
    pub conversion_rate: f64,
    /// Total cost / total conversions
    pub cost_per_conversion: f64,
}

#[derive(Default)]
struct CampaignAccumulator {
    rows: usize,
    clicks: f64,
    conversions: f64,
    cost: f64,
}

pub struct ChartPlotter;

impl ChartPlotter {
    pub fn get_color(index: usize) -> RGBColor {
        PALETTE[index % PALETTE.len()]
    }

    fn campaigns(df: &DataFrame, schema: &Schema) -> Result<Vec<String>> {
        let casted = df.column(&schema.campaign)?.cast(&DataType::String)?;
        Ok(casted
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect())
    }

    fn numbers(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
        Ok(DataProcessor::float_values(df, column)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    }

    fn ints(df: &DataFrame, column: &str) -> Result<Vec<Option<i32>>> {
        let casted = df.column(column)?.cast(&DataType::Int32)?;
        Ok(casted.i32()?.into_iter().collect())
    }

    /// Total impressions per campaign, largest first.
    pub fn impressions_by_campaign(df: &DataFrame, schema: &Schema) -> Result<Vec<CampaignTotal>> {
        let campaigns = Self::campaigns(df, schema)?;
        let impressions = Self::numbers(df, &schema.impressions)?;

        let mut totals: HashMap<String, f64> = HashMap::new();
        for (campaign, value) in campaigns.into_iter().zip(impressions) {
            *totals.entry(campaign).or_default() += value;
        }

        let mut ranked: Vec<CampaignTotal> = totals
            .into_iter()
            .map(|(campaign, impressions)| CampaignTotal {
                campaign,
                impressions,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.impressions
                .partial_cmp(&a.impressions)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.campaign.cmp(&b.campaign))
        });
        Ok(ranked)
    }

    /// Total clicks per calendar day, keyed on the decomposed date columns.
    pub fn daily_clicks(df: &DataFrame, schema: &Schema) -> Result<ClickSeries> {
        let years = Self::ints(df, &schema.year)?;
        let months = Self::ints(df, &schema.month)?;
        let days = Self::ints(df, &schema.day)?;
        let clicks = Self::numbers(df, &schema.clicks)?;

        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (((y, m), d), c) in years.iter().zip(&months).zip(&days).zip(&clicks) {
            let date = match (y, m, d) {
                (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(*y, *m as u32, *d as u32),
                _ => None,
            };
            if let Some(date) = date {
                *totals.entry(date).or_default() += c;
            }
        }

        let days: Vec<DailyClicks> = totals
            .into_iter()
            .map(|(date, clicks)| DailyClicks { date, clicks })
            .collect();
        let values: Vec<f64> = days.iter().map(|d| d.clicks).collect();
        let trend = StatsCalculator::linear_trend(&values);

        Ok(ClickSeries { days, trend })
    }

    /// Per-campaign averages and ratios, sorted by campaign name.
    pub fn campaign_performance(
        df: &DataFrame,
        schema: &Schema,
    ) -> Result<Vec<CampaignPerformance>> {
        let campaigns = Self::campaigns(df, schema)?;
        let clicks = Self::numbers(df, &schema.clicks)?;
        let conversions = Self::numbers(df, &schema.conversions)?;
        let cost = Self::numbers(df, &schema.cost)?;

        let mut groups: BTreeMap<String, CampaignAccumulator> = BTreeMap::new();
        for (i, campaign) in campaigns.into_iter().enumerate() {
            let acc = groups.entry(campaign).or_default();
            acc.rows += 1;
            acc.clicks += clicks[i];
            acc.conversions += conversions[i];
            acc.cost += cost[i];
        }

        Ok(groups
            .into_iter()
            .map(|(campaign, acc)| {
                let n = acc.rows as f64;
                CampaignPerformance {
                    campaign,
                    avg_clicks: acc.clicks / n,
                    avg_conversions: acc.conversions / n,
                    conversion_rate: if acc.clicks > 0.0 {
                        acc.conversions / acc.clicks * 100.0
                    } else {
                        0.0
                    },
                    cost_per_conversion: if acc.conversions > 0.0 {
                        acc.cost / acc.conversions
                    } else {
                        0.0
                    },
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Campagne" => ["Google Ads", "Facebook", "Google Ads", "Email", "Facebook"],
            "Impressions" => [1000.0, 800.0, 500.0, 200.0, 900.0],
            "Clics" => [40.0, 30.0, 20.0, 0.0, 10.0],
            "Conversions" => [5.0, 3.0, 3.0, 0.0, 1.0],
            "Coût" => [20.0, 12.0, 12.0, 5.0, 8.0],
            "Day" => [1i32, 1, 2, 2, 3],
            "Month" => [1i32, 1, 1, 1, 1],
            "Year" => [2024i32, 2024, 2024, 2024, 2024],
        )
        .unwrap()
    }

    #[test]
    fn test_impressions_ranked_descending() {
        let ranked = ChartPlotter::impressions_by_campaign(&sample(), &Schema::default()).unwrap();
        let names: Vec<&str> = ranked.iter().map(|r| r.campaign.as_str()).collect();
        assert_eq!(names, vec!["Facebook", "Google Ads", "Email"]);
        assert_eq!(ranked[0].impressions, 1700.0);
        assert_eq!(ranked[1].impressions, 1500.0);
    }

    #[test]
    fn test_daily_clicks_with_trend() {
        let series = ChartPlotter::daily_clicks(&sample(), &Schema::default()).unwrap();
        let totals: Vec<f64> = series.days.iter().map(|d| d.clicks).collect();
        assert_eq!(totals, vec![70.0, 20.0, 10.0]);
        assert_eq!(series.days[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let trend = series.trend.unwrap();
        assert!((trend.slope + 30.0).abs() < 1e-9);
        assert!((trend.intercept - 63.333333333333336).abs() < 1e-9);
    }

    #[test]
    fn test_campaign_performance() {
        let perf = ChartPlotter::campaign_performance(&sample(), &Schema::default()).unwrap();
        let google = perf.iter().find(|p| p.campaign == "Google Ads").unwrap();
        assert_eq!(google.avg_clicks, 30.0);
        assert_eq!(google.avg_conversions, 4.0);
        assert_eq!(google.conversion_rate, 8.0 / 60.0 * 100.0);
        assert_eq!(google.cost_per_conversion, 4.0);

        let email = perf.iter().find(|p| p.campaign == "Email").unwrap();
        assert_eq!(email.conversion_rate, 0.0);
        assert_eq!(email.cost_per_conversion, 0.0);
    }
}
