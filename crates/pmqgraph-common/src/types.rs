//! Core data model: polling observations, named tables and workbooks

use crate::error::{PmqGraphError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of polling data: an issue's polled share on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Category label, e.g. "The economy"
    pub issue: String,
    /// Polling date
    pub date: NaiveDate,
    /// Polled share in [0, 100]
    pub percentage: f64,
}

impl Observation {
    pub fn new(issue: impl Into<String>, date: NaiveDate, percentage: f64) -> Self {
        Self {
            issue: issue.into(),
            date,
            percentage,
        }
    }
}

/// A named, ordered collection of observations (one tracker tab)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollingTable {
    /// Tab name, e.g. "All_adults"
    pub name: String,
    /// Observations in load order; duplicates are not validated against
    pub observations: Vec<Observation>,
}

impl PollingTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observations: Vec::new(),
        }
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Distinct issue labels in first-appearance order
    pub fn issues(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for obs in &self.observations {
            if !seen.iter().any(|s: &String| s == &obs.issue) {
                seen.push(obs.issue.clone());
            }
        }
        seen
    }

    /// The time series for one issue, sorted by date ascending
    pub fn series(&self, issue: &str) -> Vec<(NaiveDate, f64)> {
        let mut points: Vec<(NaiveDate, f64)> = self
            .observations
            .iter()
            .filter(|obs| obs.issue == issue)
            .map(|obs| (obs.date, obs.percentage))
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    /// Observations restricted to the given issues, original order preserved
    pub fn filtered(&self, issues: &[String]) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|obs| issues.iter().any(|issue| issue == &obs.issue))
            .collect()
    }

    /// Earliest and latest observation dates, if any observations exist
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.observations.iter().map(|obs| obs.date).min()?;
        let max = self.observations.iter().map(|obs| obs.date).max()?;
        Some((min, max))
    }

    /// Sort observations by date ascending, preserving within-date order
    pub fn sort_by_date(&mut self) {
        self.observations.sort_by_key(|obs| obs.date);
    }
}

/// A collection of polling tables keyed by tab name.
///
/// Lookup of a missing tab is an explicit error rather than a silent
/// default substitution, so a typo in a tab name surfaces at the lookup
/// site and not deep inside filtering.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    tables: BTreeMap<String, PollingTable>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: PollingTable) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look up a table by tab name, failing fast when it is absent
    pub fn table(&self, name: &str) -> Result<&PollingTable> {
        self.tables
            .get(name)
            .ok_or_else(|| PmqGraphError::table_not_found(name, self.tab_names()))
    }

    pub fn tab_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
