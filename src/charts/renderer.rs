//! Static Chart Renderer
//! Writes the campaign charts as PNG files with plotters.
//!
//! Charts:
//! 1. Ranked bar chart of total impressions per campaign, value above each bar
//! 2. Daily total clicks with the linear trend overlaid
//! 3. Average clicks vs. average conversions per campaign, annotated with
//!    conversion rate and cost per conversion

use super::plotter::{CampaignPerformance, CampaignTotal, ChartPlotter, ClickSeries};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const IMPRESSIONS_CHART: &str = "histogramme_impressions.png";
pub const CLICKS_CHART: &str = "clics_quotidiens.png";
pub const PERFORMANCE_CHART: &str = "performance_campagnes.png";

const CHART_SIZE: (u32, u32) = (1400, 1000);
const GRID: RGBColor = RGBColor(200, 200, 200);
const TREND: RGBColor = RGBColor(231, 76, 60);
const LINE: RGBColor = RGBColor(52, 152, 219);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to plot for {0}")]
    Empty(&'static str),
    #[error("Failed to render {}: {message}", .path.display())]
    Render { path: PathBuf, message: String },
}

fn render_error(path: &Path, e: impl std::fmt::Display) -> ChartError {
    ChartError::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Axis ceiling with headroom for labels drawn above the data.
fn y_ceiling(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Thousands separators, e.g. `1234567` -> `1,234,567`.
fn format_count(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 {
        out.insert(0, '-');
    }
    out
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Ranked bar chart of impressions per campaign.
    pub fn draw_impressions_chart(totals: &[CampaignTotal], path: &Path) -> Result<(), ChartError> {
        if totals.is_empty() {
            return Err(ChartError::Empty("impressions per campaign"));
        }

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_error(path, e))?;

        let n = totals.len() as u32;
        let max = totals.iter().map(|t| t.impressions).fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(&root)
            .caption("Histogramme des impressions par campagne", ("sans-serif", 40))
            .margin(30)
            .x_label_area_size(80)
            .y_label_area_size(120)
            .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_ceiling(max))
            .map_err(|e| render_error(path, e))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID.mix(0.7))
            .x_desc("Campagne")
            .y_desc("Nombre total d'impressions")
            .x_labels(totals.len())
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => totals
                    .get(*i as usize)
                    .map(|t| t.campaign.clone())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .y_label_formatter(&|v| format_count(*v))
            .label_style(("sans-serif", 20))
            .axis_desc_style(("sans-serif", 26))
            .draw()
            .map_err(|e| render_error(path, e))?;

        for (i, total) in totals.iter().enumerate() {
            let color = ChartPlotter::get_color(i);
            let x = i as u32;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [
                        (SegmentValue::Exact(x), 0.0),
                        (SegmentValue::Exact(x + 1), total.impressions),
                    ],
                    color.filled(),
                )))
                .map_err(|e| render_error(path, e))?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format_count(total.impressions),
                    (SegmentValue::CenterOf(x), total.impressions + max * 0.01),
                    ("sans-serif", 22).into_font().color(&BLACK),
                )))
                .map_err(|e| render_error(path, e))?;
        }

        root.present().map_err(|e| render_error(path, e))?;
        info!("Chart saved: {}", path.display());
        Ok(())
    }

    /// Line chart of daily clicks with the least-squares trend.
    pub fn draw_daily_clicks_chart(series: &ClickSeries, path: &Path) -> Result<(), ChartError> {
        if series.days.is_empty() {
            return Err(ChartError::Empty("daily clicks"));
        }

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_error(path, e))?;

        let x_max = (series.days.len() as f64 - 1.0).max(1.0);
        let max = series.days.iter().map(|d| d.clicks).fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(&root)
            .caption("Clics quotidiens", ("sans-serif", 40))
            .margin(30)
            .x_label_area_size(80)
            .y_label_area_size(100)
            .build_cartesian_2d(0f64..x_max, 0f64..y_ceiling(max))
            .map_err(|e| render_error(path, e))?;

        chart
            .configure_mesh()
            .light_line_style(GRID.mix(0.7))
            .x_desc("Date")
            .y_desc("Clics")
            .x_labels(series.days.len().min(12))
            .x_label_formatter(&|x| {
                series
                    .days
                    .get(x.round().max(0.0) as usize)
                    .map(|d| d.date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .label_style(("sans-serif", 18))
            .axis_desc_style(("sans-serif", 26))
            .draw()
            .map_err(|e| render_error(path, e))?;

        chart
            .draw_series(LineSeries::new(
                series.days.iter().enumerate().map(|(i, d)| (i as f64, d.clicks)),
                LINE.stroke_width(3),
            ))
            .map_err(|e| render_error(path, e))?
            .label("Clics")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LINE.stroke_width(3)));

        if let Some(trend) = series.trend {
            chart
                .draw_series(LineSeries::new(
                    (0..series.days.len()).map(|i| (i as f64, trend.at(i as f64))),
                    TREND.stroke_width(2),
                ))
                .map_err(|e| render_error(path, e))?
                .label("Tendance")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], TREND.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 20))
            .draw()
            .map_err(|e| render_error(path, e))?;

        root.present().map_err(|e| render_error(path, e))?;
        info!("Chart saved: {}", path.display());
        Ok(())
    }

    /// Scatter of average clicks vs. average conversions per campaign.
    pub fn draw_performance_chart(
        performance: &[CampaignPerformance],
        path: &Path,
    ) -> Result<(), ChartError> {
        if performance.is_empty() {
            return Err(ChartError::Empty("campaign performance"));
        }

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_error(path, e))?;

        let x_max = performance.iter().map(|p| p.avg_clicks).fold(0.0, f64::max);
        let y_max = performance.iter().map(|p| p.avg_conversions).fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(&root)
            .caption("Clics moyens vs conversions moyennes", ("sans-serif", 40))
            .margin(30)
            .x_label_area_size(80)
            .y_label_area_size(100)
            .build_cartesian_2d(0f64..y_ceiling(x_max) * 1.2, 0f64..y_ceiling(y_max))
            .map_err(|e| render_error(path, e))?;

        chart
            .configure_mesh()
            .light_line_style(GRID.mix(0.7))
            .x_desc("Clics moyens")
            .y_desc("Conversions moyennes")
            .label_style(("sans-serif", 18))
            .axis_desc_style(("sans-serif", 26))
            .draw()
            .map_err(|e| render_error(path, e))?;

        for (i, p) in performance.iter().enumerate() {
            let color = ChartPlotter::get_color(i);
            let point = (p.avg_clicks, p.avg_conversions);
            chart
                .draw_series(std::iter::once(Circle::new(point, 10, color.filled())))
                .map_err(|e| render_error(path, e))?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!(
                        "{} | CVR {:.2}% | CPA {:.2}",
                        p.campaign, p.conversion_rate, p.cost_per_conversion
                    ),
                    point,
                    ("sans-serif", 18).into_font().color(&BLACK),
                )))
                .map_err(|e| render_error(path, e))?;
        }

        root.present().map_err(|e| render_error(path, e))?;
        info!("Chart saved: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1000.0), "1,000");
        assert_eq!(format_count(1234567.4), "1,234,567");
        assert_eq!(format_count(-4500.0), "-4,500");
    }

    #[test]
    fn test_empty_inputs_are_rejected_before_drawing() {
        let path = Path::new("unused.png");
        assert!(matches!(
            StaticChartRenderer::draw_impressions_chart(&[], path),
            Err(ChartError::Empty(_))
        ));
        assert!(matches!(
            StaticChartRenderer::draw_performance_chart(&[], path),
            Err(ChartError::Empty(_))
        ));
        let series = ClickSeries {
            days: Vec::new(),
            trend: None,
        };
        assert!(matches!(
            StaticChartRenderer::draw_daily_clicks_chart(&series, path),
            Err(ChartError::Empty(_))
        ));
        assert!(!path.exists());
    }
}
