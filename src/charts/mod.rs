//! Charts module - aggregations and static chart rendering

mod plotter;
mod renderer;

pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;

use crate::config::Schema;
use polars::prelude::DataFrame;
use renderer::{CLICKS_CHART, IMPRESSIONS_CHART, PERFORMANCE_CHART};
use std::path::{Path, PathBuf};

/// Render every chart into `dir` from the cleaned table. Only reads `df`.
pub fn render_all(df: &DataFrame, schema: &Schema, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let totals = ChartPlotter::impressions_by_campaign(df, schema)?;
    let path = dir.join(IMPRESSIONS_CHART);
    StaticChartRenderer::draw_impressions_chart(&totals, &path)?;
    written.push(path);

    let clicks = ChartPlotter::daily_clicks(df, schema)?;
    let path = dir.join(CLICKS_CHART);
    StaticChartRenderer::draw_daily_clicks_chart(&clicks, &path)?;
    written.push(path);

    let performance = ChartPlotter::campaign_performance(df, schema)?;
    let path = dir.join(PERFORMANCE_CHART);
    StaticChartRenderer::draw_performance_chart(&performance, &path)?;
    written.push(path);

    Ok(written)
}
