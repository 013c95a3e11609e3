//! Subcommand implementations

pub mod debates;
pub mod issues;
pub mod pmq;
