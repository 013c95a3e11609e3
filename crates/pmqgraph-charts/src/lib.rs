//! Faceted category time-series rendering for pmqgraph
//!
//! The central piece is [`FacetedTimeSeries`]: given a polling table and an
//! ordered list of issue labels, it renders one line-chart panel per issue
//! plus a combined overview panel, all sharing one deterministic color
//! mapping, laid out in a grid.

pub mod facet;
pub mod palette;
pub mod types;

pub use facet::FacetedTimeSeries;
pub use palette::{color_mapping, IssueColor, Palette};
pub use types::{ChartStyle, CombinedPanelMode, FacetLayout, FontSpec, GridSpec};
