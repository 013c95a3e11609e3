//! Faceted category time-series renderer
//!
//! One panel per selected issue, filtered to that issue alone, followed by a
//! combined overview panel overlaying every selected issue. All panels share
//! the color mapping built once per render, so an issue keeps the same color
//! everywhere in the figure.

use crate::palette::{color_mapping, parse_color, IssueColor, Palette};
use crate::types::{ChartStyle, CombinedPanelMode, FacetLayout};
use chrono::{Duration, NaiveDate};
use plotters::coord::types::{RangedCoordf64, RangedDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use pmqgraph_common::{PmqGraphError, PollingTable, Result};
use std::path::Path;
use tracing::{debug, info};

/// Horizontal offset of the combined panel's legend block, past the y-label
/// area so it sits inside the plot.
const LEGEND_X: i32 = 80;
const LEGEND_Y: i32 = 45;
const LEGEND_ROW_HEIGHT: i32 = 20;

/// Fallback axis ranges for a render with no observations at all
fn fallback_date_range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2000, 1, 1).expect("static date"),
        NaiveDate::from_ymd_opt(2000, 12, 31).expect("static date"),
    )
}

/// Faceted category time-series figure configuration.
///
/// The grid must provide at least `categories.len() + 1` cells: one panel
/// per category plus the combined overview panel. Trailing cells stay blank.
#[derive(Debug, Clone)]
pub struct FacetedTimeSeries {
    categories: Vec<String>,
    layout: FacetLayout,
    style: ChartStyle,
    palette: Palette,
}

impl FacetedTimeSeries {
    pub fn new(categories: Vec<String>, layout: FacetLayout) -> Self {
        Self {
            categories,
            layout,
            style: ChartStyle::default(),
            palette: Palette::default(),
        }
    }

    pub fn with_style(mut self, style: ChartStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Panels required for this figure: one per category plus the overview
    pub fn required_panels(&self) -> usize {
        self.categories.len() + 1
    }

    /// Render the figure to a PNG file
    pub fn render_to_file(&self, table: &PollingTable, path: &Path) -> Result<()> {
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        self.render_on(table, &root)?;
        info!(
            "Rendered {} panels for table '{}' to {}",
            self.required_panels(),
            table.name,
            path.display()
        );
        Ok(())
    }

    /// Render the figure to PNG-encoded bytes
    pub fn render_to_bytes(&self, table: &PollingTable) -> Result<Vec<u8>> {
        let width = self.style.width;
        let height = self.style.height;
        let mut buffer = vec![0u8; rgb_buffer_len(width, height)];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
                .into_drawing_area();
            self.render_on(table, &root)?;
        }

        let image = image::RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| PmqGraphError::chart("Pixel buffer size mismatch"))?;
        let mut png = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageOutputFormat::Png,
            )
            .map_err(|e| PmqGraphError::chart_with_source("PNG encoding failed", e))?;
        Ok(png)
    }

    /// Render onto an already-open drawing area.
    ///
    /// Hard failures (layout, palette, backend) abort the whole render; no
    /// partial figure is presented.
    fn render_on<DB>(&self, table: &PollingTable, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        self.layout.ensure_fits(self.required_panels())?;
        let mapping = color_mapping(&self.categories, &self.palette)?;

        let background = parse_color(&self.style.background_color)?;
        root.fill(&background)?;

        let selected = table.filtered(&self.categories);
        let union_range = date_span(selected.iter().map(|obs| obs.date));
        let y_max = selected
            .iter()
            .map(|obs| obs.percentage)
            .fold(0.0_f64, f64::max);
        let y_max = if y_max > 0.0 { y_max * 1.1 } else { 100.0 };

        let panels = root.split_evenly((self.layout.rows, self.layout.cols));

        for (i, (category, color)) in mapping.iter().enumerate() {
            let series = table.series(category);
            debug!(
                "Panel {}: '{}' with {} observations",
                i,
                category,
                series.len()
            );
            let x_range = date_span(series.iter().map(|(date, _)| *date))
                .or(union_range)
                .unwrap_or_else(fallback_date_range);
            self.draw_panel(&panels[i], category, *color, &series, x_range, y_max)?;
        }

        let combined_range = union_range.unwrap_or_else(fallback_date_range);
        // Stacked bands reach the sum over issues, not the single maximum
        let combined_y_max = match self.style.combined_mode {
            CombinedPanelMode::Lines => y_max,
            CombinedPanelMode::StackedArea => {
                let (_, layers) = stacked_layers(table, &mapping);
                let peak = layers
                    .last()
                    .map(|top| top.iter().copied().fold(0.0_f64, f64::max))
                    .unwrap_or(0.0);
                if peak > 0.0 {
                    peak * 1.1
                } else {
                    y_max
                }
            }
        };
        self.draw_combined(
            &panels[mapping.len()],
            table,
            &mapping,
            combined_range,
            combined_y_max,
        )?;

        root.present()?;
        Ok(())
    }

    /// Draw one single-category panel. A category with no observations gets
    /// axes and a title but no line.
    ///
    /// With a rolling window configured, the raw observations become faded
    /// scatter points under a rolling-mean line.
    fn draw_panel<DB>(
        &self,
        panel: &DrawingArea<DB, Shift>,
        title: &str,
        color: RGBColor,
        series: &[(NaiveDate, f64)],
        (x_start, x_end): (NaiveDate, NaiveDate),
        y_max: f64,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let mut chart = self.build_chart(panel, title, x_start, x_end, y_max)?;
        self.draw_mesh(&mut chart)?;

        match self.style.rolling_window {
            Some(window) => {
                chart.draw_series(
                    series
                        .iter()
                        .map(|&point| Circle::new(point, 3, color.mix(0.6).filled())),
                )?;
                chart.draw_series(LineSeries::new(
                    rolling_mean(series, window),
                    color.stroke_width(self.style.line_width),
                ))?;
            }
            None => {
                chart.draw_series(LineSeries::new(
                    series.iter().copied(),
                    color.stroke_width(self.style.line_width),
                ))?;
            }
        }

        Ok(())
    }

    /// Draw the combined overview panel: all categories in one set of axes,
    /// same color mapping, with a legend headed "Issue". Categories are
    /// overlaid as lines or stacked as filled bands per the configured mode.
    fn draw_combined<DB>(
        &self,
        panel: &DrawingArea<DB, Shift>,
        table: &PollingTable,
        mapping: &[IssueColor],
        (x_start, x_end): (NaiveDate, NaiveDate),
        y_max: f64,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let caption = self.style.combined_caption.as_str();
        let mut chart = self.build_chart(panel, caption, x_start, x_end, y_max)?;
        self.draw_mesh(&mut chart)?;

        match self.style.combined_mode {
            CombinedPanelMode::Lines => {
                for (category, color) in mapping {
                    let series = table.series(category);
                    chart.draw_series(LineSeries::new(
                        series.into_iter(),
                        color.stroke_width(self.style.line_width),
                    ))?;
                }
            }
            CombinedPanelMode::StackedArea => {
                let (dates, layers) = stacked_layers(table, mapping);
                // Each band is the polygon between consecutive cumulative
                // boundaries, so lower bands stay visible under later ones
                for (i, (_, color)) in mapping.iter().enumerate() {
                    let lower = layers[i].iter();
                    let upper = layers[i + 1].iter();
                    let mut points: Vec<(NaiveDate, f64)> =
                        dates.iter().copied().zip(upper.copied()).collect();
                    points.extend(dates.iter().rev().copied().zip(lower.rev().copied()));
                    chart.draw_series(std::iter::once(Polygon::new(
                        points,
                        color.mix(0.7).filled(),
                    )))?;
                }
            }
        }

        self.draw_legend(panel, mapping)?;
        Ok(())
    }

    fn build_chart<'a, DB>(
        &self,
        panel: &'a DrawingArea<DB, Shift>,
        title: &str,
        x_start: NaiveDate,
        x_end: NaiveDate,
        y_max: f64,
    ) -> Result<ChartContext<'a, DB, Cartesian2d<RangedDate<NaiveDate>, RangedCoordf64>>>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        // A zero-width date range breaks tick placement
        let (x_start, x_end) = if x_start == x_end {
            (x_start - Duration::days(1), x_end + Duration::days(1))
        } else {
            (x_start, x_end)
        };

        let title_font = (
            self.style.title_font.family.as_str(),
            self.style.title_font.size,
        );
        let chart = ChartBuilder::on(panel)
            .caption(title, title_font)
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(50)
            .build_cartesian_2d(x_start..x_end, 0f64..y_max)?;
        Ok(chart)
    }

    fn draw_mesh<DB>(
        &self,
        chart: &mut ChartContext<'_, DB, Cartesian2d<RangedDate<NaiveDate>, RangedCoordf64>>,
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let label_font = (
            self.style.label_font.family.as_str(),
            self.style.label_font.size,
        )
            .into_font();
        // Bound to a local so the formatter outlives the mesh builder
        let date_formatter = |date: &NaiveDate| date.format("%Y-%m-%d").to_string();
        let mut mesh = chart.configure_mesh();
        mesh.x_desc("Date")
            .y_desc("Percentage")
            .x_labels(6)
            .x_label_formatter(&date_formatter)
            .axis_desc_style(label_font.clone());

        if self.style.rotate_date_labels {
            mesh.x_label_style(label_font.clone().transform(FontTransform::Rotate90));
        } else {
            mesh.x_label_style(label_font.clone());
        }
        mesh.y_label_style(label_font);

        if self.style.grid.show {
            let opacity = self.style.grid.opacity.clamp(0.0, 1.0);
            mesh.bold_line_style(BLACK.mix(opacity));
            mesh.light_line_style(BLACK.mix(opacity * 0.5));
        } else {
            mesh.disable_x_mesh();
            mesh.disable_y_mesh();
        }

        mesh.draw()?;
        Ok(())
    }

    /// Manually drawn legend block with an "Issue" header, one swatch per
    /// category in mapping order.
    fn draw_legend<DB>(&self, panel: &DrawingArea<DB, Shift>, mapping: &[IssueColor]) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: std::error::Error + Send + Sync + 'static,
    {
        let text_style = (
            self.style.label_font.family.as_str(),
            self.style.label_font.size,
        )
            .into_font()
            .color(&BLACK);

        panel.draw(&Text::new(
            "Issue".to_string(),
            (LEGEND_X, LEGEND_Y),
            text_style.clone(),
        ))?;

        for (i, (category, color)) in mapping.iter().enumerate() {
            let y = LEGEND_Y + LEGEND_ROW_HEIGHT * (i as i32 + 1);
            panel.draw(&PathElement::new(
                vec![(LEGEND_X, y + 6), (LEGEND_X + 16, y + 6)],
                color.stroke_width(self.style.line_width),
            ))?;
            panel.draw(&Text::new(
                category.clone(),
                (LEGEND_X + 22, y),
                text_style.clone(),
            ))?;
        }

        Ok(())
    }
}

/// RGB byte length of a `width` × `height` bitmap. Widened before the
/// multiply: large (but valid) dimensions overflow the u32 product.
fn rgb_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Trailing rolling mean over a series: each point becomes the mean of the
/// window ending at it, with shorter windows at the start so no point is
/// dropped. A zero window is treated as one.
fn rolling_mean(series: &[(NaiveDate, f64)], window: usize) -> Vec<(NaiveDate, f64)> {
    let window = window.max(1);
    series
        .iter()
        .enumerate()
        .map(|(i, &(date, _))| {
            let start = (i + 1).saturating_sub(window);
            let tail = &series[start..=i];
            let mean = tail.iter().map(|(_, v)| v).sum::<f64>() / tail.len() as f64;
            (date, mean)
        })
        .collect()
}

/// Cumulative stacking boundaries over the union date grid.
///
/// Returns the sorted union of observation dates and `mapping.len() + 1`
/// boundary rows: row 0 is all zeros, row `k` adds category `k - 1`'s values
/// (missing dates count as zero) to row `k - 1`.
fn stacked_layers(table: &PollingTable, mapping: &[IssueColor]) -> (Vec<NaiveDate>, Vec<Vec<f64>>) {
    let mut dates: Vec<NaiveDate> = mapping
        .iter()
        .flat_map(|(category, _)| table.series(category).into_iter().map(|(date, _)| date))
        .collect();
    dates.sort();
    dates.dedup();

    let mut layers = Vec::with_capacity(mapping.len() + 1);
    let mut boundary = vec![0.0; dates.len()];
    layers.push(boundary.clone());
    for (category, _) in mapping {
        let series: std::collections::BTreeMap<NaiveDate, f64> =
            table.series(category).into_iter().collect();
        boundary = dates
            .iter()
            .zip(&boundary)
            .map(|(date, below)| below + series.get(date).copied().unwrap_or(0.0))
            .collect();
        layers.push(boundary.clone());
    }

    (dates, layers)
}

/// Min and max of a date iterator
fn date_span(dates: impl Iterator<Item = NaiveDate>) -> Option<(NaiveDate, NaiveDate)> {
    let mut span: Option<(NaiveDate, NaiveDate)> = None;
    for date in dates {
        span = Some(match span {
            None => (date, date),
            Some((min, max)) => (min.min(date), max.max(date)),
        });
    }
    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmqgraph_common::Observation;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cats(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn scenario_table() -> PollingTable {
        let mut table = PollingTable::new("All_adults");
        table.push(Observation::new("Health", date(2020, 1, 1), 30.0));
        table.push(Observation::new("Health", date(2020, 2, 1), 35.0));
        table.push(Observation::new("The economy", date(2020, 1, 1), 50.0));
        table
    }

    fn small_style() -> ChartStyle {
        ChartStyle {
            width: 400,
            height: 300,
            ..Default::default()
        }
    }

    #[test]
    fn test_grid_too_small_fails_before_rendering() {
        let table = scenario_table();
        // Two categories need three cells; a (1, 2) grid is one short
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "The economy"]),
            FacetLayout::new(1, 2),
        )
        .with_style(small_style());

        let err = figure.render_to_bytes(&table).unwrap_err();
        assert!(matches!(
            err,
            PmqGraphError::Layout {
                required: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn test_exact_capacity_grid_succeeds() {
        let table = scenario_table();
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "The economy"]),
            FacetLayout::new(1, 3),
        )
        .with_style(small_style());

        let png = figure.render_to_bytes(&table).unwrap();
        assert!(!png.is_empty());
        // PNG magic bytes
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_absent_category_yields_empty_panel_not_error() {
        let table = scenario_table();
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "Defence"]),
            FacetLayout::new(1, 3),
        )
        .with_style(small_style());

        assert!(figure.render_to_bytes(&table).is_ok());
    }

    #[test]
    fn test_empty_dataset_renders_empty_panels() {
        let table = PollingTable::new("empty");
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "The economy"]),
            FacetLayout::new(2, 2),
        )
        .with_style(small_style());

        assert!(figure.render_to_bytes(&table).is_ok());
    }

    #[test]
    fn test_render_is_idempotent() {
        let table = scenario_table();
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "The economy"]),
            FacetLayout::new(1, 3),
        )
        .with_style(small_style());

        let first = figure.render_to_bytes(&table).unwrap();
        let second = figure.render_to_bytes(&table).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_to_file_writes_png() {
        let table = scenario_table();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.png");

        let figure = FacetedTimeSeries::new(cats(&["Health"]), FacetLayout::new(1, 2))
            .with_style(small_style());
        figure.render_to_file(&table, &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_rgb_buffer_len_survives_large_dimensions() {
        // 40000 * 36000 * 3 exceeds u32::MAX; the widened product must not
        assert_eq!(rgb_buffer_len(40_000, 36_000), 4_320_000_000);
        assert_eq!(rgb_buffer_len(400, 300), 360_000);
    }

    #[test]
    fn test_rolling_mean_short_windows_at_start() {
        let series = vec![
            (date(2020, 1, 1), 10.0),
            (date(2020, 1, 8), 20.0),
            (date(2020, 1, 15), 30.0),
            (date(2020, 1, 22), 40.0),
        ];
        let smoothed = rolling_mean(&series, 3);
        assert_eq!(
            smoothed,
            vec![
                (date(2020, 1, 1), 10.0),
                (date(2020, 1, 8), 15.0),
                (date(2020, 1, 15), 20.0),
                (date(2020, 1, 22), 30.0),
            ]
        );
        // A zero window degrades to the raw series
        assert_eq!(rolling_mean(&series, 0), series);
        assert_eq!(rolling_mean(&[], 5), vec![]);
    }

    #[test]
    fn test_rolling_window_render_succeeds() {
        let table = scenario_table();
        let style = ChartStyle {
            rolling_window: Some(5),
            ..small_style()
        };
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "The economy"]),
            FacetLayout::new(1, 3),
        )
        .with_style(style);

        let png = figure.render_to_bytes(&table).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_stacked_layers_accumulate_over_union_dates() {
        let table = scenario_table();
        let mapping = color_mapping(
            &cats(&["Health", "The economy"]),
            &crate::palette::Palette::default(),
        )
        .unwrap();

        let (dates, layers) = stacked_layers(&table, &mapping);
        assert_eq!(dates, vec![date(2020, 1, 1), date(2020, 2, 1)]);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0], vec![0.0, 0.0]);
        // Health alone
        assert_eq!(layers[1], vec![30.0, 35.0]);
        // The economy has no February observation, stacking adds zero there
        assert_eq!(layers[2], vec![80.0, 35.0]);
    }

    #[test]
    fn test_stacked_combined_render_succeeds() {
        let table = scenario_table();
        let style = ChartStyle {
            combined_mode: CombinedPanelMode::StackedArea,
            ..small_style()
        };
        let figure = FacetedTimeSeries::new(
            cats(&["Health", "The economy"]),
            FacetLayout::new(1, 3),
        )
        .with_style(style);

        let png = figure.render_to_bytes(&table).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_combined_caption_is_configurable() {
        let style = ChartStyle {
            combined_caption: "All Key Issues Together".to_string(),
            ..small_style()
        };
        assert_eq!(style.combined_caption, "All Key Issues Together");

        let table = scenario_table();
        let figure = FacetedTimeSeries::new(cats(&["Health"]), FacetLayout::new(1, 2))
            .with_style(style);
        assert!(figure.render_to_bytes(&table).is_ok());
    }

    #[test]
    fn test_date_span() {
        assert_eq!(date_span(std::iter::empty()), None);
        let dates = vec![date(2020, 2, 1), date(2020, 1, 1), date(2020, 3, 1)];
        assert_eq!(
            date_span(dates.into_iter()),
            Some((date(2020, 1, 1), date(2020, 3, 1)))
        );
    }
}
