//! Chart style and layout types

use pmqgraph_common::{PmqGraphError, Result};
use serde::{Deserialize, Serialize};

/// Facet grid shape: panels are placed row-major into `rows` × `cols` cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetLayout {
    pub rows: usize,
    pub cols: usize,
}

impl FacetLayout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total number of grid cells
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Check the grid can hold `required` panels
    pub fn ensure_fits(&self, required: usize) -> Result<()> {
        if self.cells() < required {
            Err(PmqGraphError::layout(required, self.cells()))
        } else {
            Ok(())
        }
    }
}

/// Font family and size used for captions and axis labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 12,
        }
    }
}

/// Gridline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    /// Whether gridlines are drawn at all
    pub show: bool,
    /// Gridline opacity in [0, 1]
    pub opacity: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            show: true,
            opacity: 0.3,
        }
    }
}

/// How the combined overview panel draws the overlaid issues
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinedPanelMode {
    /// One line per issue
    #[default]
    Lines,
    /// Issues stacked on top of each other as filled bands
    StackedArea,
}

/// Styling for the faceted figure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
    /// Background color (hex format)
    pub background_color: String,
    /// Line stroke width in pixels
    pub line_width: u32,
    /// Gridlines
    pub grid: GridSpec,
    /// Rotate date tick labels a quarter turn, the closest the glyph
    /// transform gets to the slanted labels of the source figures
    pub rotate_date_labels: bool,
    /// Panel caption font
    pub title_font: FontSpec,
    /// Axis and legend font
    pub label_font: FontSpec,
    /// When set, per-issue panels draw scatter points with a trailing
    /// rolling-mean line of this window instead of a plain line
    pub rolling_window: Option<usize>,
    /// Combined overview panel mode
    pub combined_mode: CombinedPanelMode,
    /// Combined overview panel caption
    pub combined_caption: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 1200,
            background_color: "#FFFFFF".to_string(),
            line_width: 2,
            grid: GridSpec::default(),
            rotate_date_labels: true,
            title_font: FontSpec {
                family: "sans-serif".to_string(),
                size: 20,
            },
            label_font: FontSpec::default(),
            rolling_window: None,
            combined_mode: CombinedPanelMode::default(),
            combined_caption: "All issues".to_string(),
        }
    }
}
