//! Data acquisition for pmqgraph: polling workbooks and parliamentary debates

pub mod hansard;
pub mod pmq;
pub mod twfy;
pub mod workbook;

pub use hansard::{fetch_sitting_day, parse_debates_xml, sitting_url};
pub use pmq::{analyze_session, extract_pmq_session, PmqAnalysis, PmqSession, SpeechRecord};
pub use twfy::{DebateRecord, TwfyClient, TwfyConfig};
pub use workbook::WorkbookLoader;
