//! Common utilities and types for pmqgraph

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{PmqGraphError, Result};
pub use logging::{init_default_logging, init_logging, LoggingConfig};
pub use types::{Observation, PollingTable, Workbook};
