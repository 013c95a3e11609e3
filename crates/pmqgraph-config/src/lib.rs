//! Configuration management for pmqgraph

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader};
pub use settings::{ChartSettings, Config, DataSettings, LoggingSettings, TwfySettings};
