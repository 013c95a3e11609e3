//! `pmqgraph issues` — render the faceted issue-importance chart

use clap::Args;
use pmqgraph_charts::{
    ChartStyle, CombinedPanelMode, FacetLayout, FacetedTimeSeries, FontSpec, GridSpec,
};
use pmqgraph_common::{PmqGraphError, Result};
use pmqgraph_config::Config;
use pmqgraph_data::WorkbookLoader;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct IssuesArgs {
    /// Workbook tab to chart (default: the configured tab)
    #[arg(long)]
    pub tab: Option<String>,

    /// Restrict the chart to these issues, in the given order
    #[arg(long = "issue", value_name = "ISSUE")]
    pub issues: Vec<String>,

    /// Grid rows (default: computed from the number of issues)
    #[arg(long)]
    pub rows: Option<usize>,

    /// Grid columns (default: computed from the number of issues)
    #[arg(long)]
    pub cols: Option<usize>,

    /// Smooth each issue panel: scatter points under a rolling mean of
    /// this many polls
    #[arg(long, value_name = "POLLS")]
    pub rolling_window: Option<usize>,

    /// Draw the combined panel as a stacked area chart
    #[arg(long)]
    pub stacked: bool,

    /// Caption for the combined panel
    #[arg(long, value_name = "TEXT")]
    pub combined_caption: Option<String>,

    /// Output PNG path
    #[arg(long, short, default_value = "issues.png")]
    pub output: PathBuf,
}

pub fn run(config: &Config, args: IssuesArgs) -> Result<()> {
    let loader =
        WorkbookLoader::new().with_excluded_issues(config.data.excluded_issues.clone());
    let workbook = loader.load_dir(Path::new(&config.data.workbook_dir))?;

    let tab = args.tab.as_deref().unwrap_or(&config.data.default_tab);
    let table = workbook.table(tab)?;

    let categories = if args.issues.is_empty() {
        table.issues()
    } else {
        args.issues.clone()
    };
    if categories.is_empty() {
        return Err(PmqGraphError::chart(format!(
            "Tab '{tab}' has no issues to chart"
        )));
    }

    let layout = resolve_layout(args.rows, args.cols, categories.len() + 1);
    let mut style = chart_style(config);
    style.rolling_window = args.rolling_window;
    if args.stacked {
        style.combined_mode = CombinedPanelMode::StackedArea;
    }
    if let Some(caption) = &args.combined_caption {
        style.combined_caption = caption.clone();
    }

    info!(
        tab = tab,
        issues = categories.len(),
        rows = layout.rows,
        cols = layout.cols,
        "Rendering faceted issues chart"
    );

    let chart = FacetedTimeSeries::new(categories, layout).with_style(style);
    chart.render_to_file(table, &args.output)?;

    info!(path = %args.output.display(), "Chart written");
    println!("Wrote {}", args.output.display());
    Ok(())
}

/// Pick a near-square grid when rows/cols are not both given
fn resolve_layout(rows: Option<usize>, cols: Option<usize>, panels: usize) -> FacetLayout {
    match (rows, cols) {
        (Some(r), Some(c)) => FacetLayout::new(r, c),
        (Some(r), None) => FacetLayout::new(r, panels.div_ceil(r.max(1))),
        (None, Some(c)) => FacetLayout::new(panels.div_ceil(c.max(1)), c),
        (None, None) => {
            let cols = (panels as f64).sqrt().ceil() as usize;
            FacetLayout::new(panels.div_ceil(cols.max(1)), cols.max(1))
        }
    }
}

fn chart_style(config: &Config) -> ChartStyle {
    let chart = &config.chart;
    ChartStyle {
        width: chart.width,
        height: chart.height,
        background_color: chart.background_color.clone(),
        line_width: chart.line_width,
        grid: GridSpec {
            show: chart.show_grid,
            opacity: chart.grid_opacity,
        },
        rotate_date_labels: chart.rotate_date_labels,
        title_font: FontSpec::default(),
        label_font: FontSpec::default(),
        ..ChartStyle::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_layout_near_square() {
        // 11 issues plus the overview panel
        let layout = resolve_layout(None, None, 12);
        assert!(layout.cells() >= 12);
        assert_eq!(layout.cols, 4);
        assert_eq!(layout.rows, 3);
    }

    #[test]
    fn test_resolve_layout_partial_hints() {
        let layout = resolve_layout(Some(2), None, 7);
        assert_eq!(layout, FacetLayout::new(2, 4));

        let layout = resolve_layout(None, Some(3), 7);
        assert_eq!(layout, FacetLayout::new(3, 3));
    }

    #[test]
    fn test_resolve_layout_explicit_untouched() {
        // Explicit dimensions pass through even when too small; the
        // renderer reports the capacity error
        let layout = resolve_layout(Some(1), Some(2), 9);
        assert_eq!(layout, FacetLayout::new(1, 2));
    }
}
