//! Application configuration structures

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// TheyWorkForYou API configuration
    #[validate]
    pub twfy: TwfySettings,

    /// Polling data location and filtering
    #[validate]
    pub data: DataSettings,

    /// Chart rendering settings
    #[validate]
    pub chart: ChartSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            twfy: TwfySettings::default(),
            data: DataSettings::default(),
            chart: ChartSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    /// Validate the whole configuration tree
    pub fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()
    }
}

/// TheyWorkForYou API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TwfySettings {
    /// API base URL
    #[validate(url(message = "TheyWorkForYou URL must be a valid URL"))]
    pub base_url: String,

    /// API key; may stay empty until a debates fetch is requested
    pub api_key: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for TwfySettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.theyworkforyou.com/api".to_string(),
            api_key: String::new(),
            timeout_seconds: 30,
        }
    }
}

/// Polling data location and filtering
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding one CSV file per tracker tab
    #[validate(length(min = 1, message = "Workbook directory cannot be empty"))]
    pub workbook_dir: String,

    /// Tab used when none is requested explicitly
    #[validate(custom(
        function = "crate::validation::validate_tab_name",
        message = "Tab name must be non-empty and contain no path separators"
    ))]
    pub default_tab: String,

    /// Bookkeeping rows dropped during the wide-to-long melt
    pub excluded_issues: Vec<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            workbook_dir: "data/yougov".to_string(),
            default_tab: "All_adults".to_string(),
            excluded_issues: vec![
                "Base".to_string(),
                "Unweighted base".to_string(),
                "Don't know / None of these".to_string(),
            ],
        }
    }
}

/// Chart rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChartSettings {
    /// Figure width in pixels
    #[validate(range(min = 100, max = 8000, message = "Width must be between 100 and 8000 pixels"))]
    pub width: u32,

    /// Figure height in pixels
    #[validate(range(min = 100, max = 8000, message = "Height must be between 100 and 8000 pixels"))]
    pub height: u32,

    /// Background color (hex format)
    #[validate(custom(function = "crate::validation::validate_hex_color", message = "Background color must be a valid hex color"))]
    pub background_color: String,

    /// Line stroke width in pixels
    #[validate(range(min = 1, max = 10, message = "Line width must be between 1 and 10"))]
    pub line_width: u32,

    /// Gridline opacity in [0, 1]
    #[validate(range(min = 0.0, max = 1.0, message = "Grid opacity must be between 0 and 1"))]
    pub grid_opacity: f64,

    /// Whether to draw gridlines
    pub show_grid: bool,

    /// Whether to rotate date tick labels on the x axis
    pub rotate_date_labels: bool,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 1200,
            background_color: "#FFFFFF".to_string(),
            line_width: 2,
            grid_opacity: 0.3,
            show_grid: true,
            rotate_date_labels: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter (e.g. "info", "debug")
    pub level: String,

    /// Use the compact single-line format
    pub compact: bool,

    /// Optional log file path
    pub file: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            compact: false,
            file: None,
        }
    }
}
