//! Tracker workbook loading
//!
//! YouGov publishes "The Most Important Issues" tracker data as a workbook of
//! audience-segment tabs, each a wide table: one row per issue, one column
//! per polling date. This module reads a directory of per-tab CSV exports and
//! melts each into the long-format [`PollingTable`] the charts consume.

use chrono::NaiveDate;
use pmqgraph_common::{utils, Observation, PmqGraphError, PollingTable, Result, Workbook};
use std::path::Path;
use tracing::{debug, info, warn};

/// Loader for per-tab CSV exports of tracker workbooks
#[derive(Debug, Clone)]
pub struct WorkbookLoader {
    /// Bookkeeping rows dropped during the melt
    excluded_issues: Vec<String>,
}

impl Default for WorkbookLoader {
    fn default() -> Self {
        Self {
            excluded_issues: vec![
                "Base".to_string(),
                "Unweighted base".to_string(),
                "Don't know / None of these".to_string(),
            ],
        }
    }
}

impl WorkbookLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excluded_issues(mut self, excluded: Vec<String>) -> Self {
        self.excluded_issues = excluded;
        self
    }

    /// Load every `*.csv` file in `dir` as one tab; the file stem names it
    pub fn load_dir(&self, dir: &Path) -> Result<Workbook> {
        let mut workbook = Workbook::new();

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        paths.sort();

        for path in paths {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| {
                    PmqGraphError::validation_field(
                        format!("'{}' is not a usable tab filename", path.display()),
                        "workbook_dir",
                    )
                })?
                .to_string();
            let table = self.load_table(&path, &name)?;
            debug!("Loaded tab '{}' with {} observations", name, table.len());
            workbook.insert(table);
        }

        info!(
            "Loaded workbook from {} with {} tabs",
            dir.display(),
            workbook.len()
        );
        Ok(workbook)
    }

    /// Load one wide-format CSV and melt it into a long-format table.
    ///
    /// The first header cell must be `Issue`; every remaining header cell is
    /// a date. Blank cells are skipped. When every value in the file is a
    /// fraction (≤ 1.0), the whole table is rescaled to the 0–100 range.
    pub fn load_table(&self, path: &Path, name: &str) -> Result<PollingTable> {
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let mut header_iter = headers.iter();

        let first = header_iter.next().unwrap_or("");
        if !first.trim().eq_ignore_ascii_case("issue") {
            return Err(PmqGraphError::schema_in_table("Issue", name));
        }

        let dates: Vec<NaiveDate> = header_iter
            .map(|header| {
                utils::parse_date(header)
                    .map_err(|_| PmqGraphError::schema_in_table(header, name))
            })
            .collect::<Result<_>>()?;

        if dates.is_empty() {
            return Err(PmqGraphError::schema_in_table("Date", name));
        }

        let mut table = PollingTable::new(name);
        for record in reader.records() {
            let record = record?;
            let issue = record.get(0).unwrap_or("").trim();
            if issue.is_empty() {
                continue;
            }
            if self.excluded_issues.iter().any(|excluded| excluded == issue) {
                debug!("Dropping bookkeeping row '{}'", issue);
                continue;
            }

            for (date, cell) in dates.iter().zip(record.iter().skip(1)) {
                let cell = cell.trim();
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell.parse().map_err(|_| {
                    PmqGraphError::schema_in_table(utils::format_date(date), name)
                })?;
                table.push(Observation::new(issue, *date, value));
            }
        }

        if table.is_empty() {
            warn!("Tab '{}' contains no observations", name);
            return Ok(table);
        }

        // Source exports store shares as fractions; rescale when the whole
        // table fits in [0, 1]
        let max = table
            .observations
            .iter()
            .map(|obs| obs.percentage)
            .fold(f64::NEG_INFINITY, f64::max);
        if max <= 1.0 {
            for obs in &mut table.observations {
                obs.percentage *= 100.0;
            }
        }

        table.sort_by_date();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    #[test]
    fn test_melt_wide_to_long() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "All_adults.csv",
            "Issue,2020-01-06,2020-01-13\n\
             Health,0.30,0.35\n\
             The economy,0.50,\n",
        );

        let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
        let table = workbook.table("All_adults").unwrap();

        // Blank cell skipped, fractions rescaled, sorted by date
        assert_eq!(table.len(), 3);
        let health = table.series("Health");
        assert_eq!(health.len(), 2);
        assert!((health[0].1 - 30.0).abs() < 1e-9);
        assert!((health[1].1 - 35.0).abs() < 1e-9);
        assert_eq!(table.series("The economy").len(), 1);
    }

    #[test]
    fn test_excluded_issues_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "All_adults.csv",
            "Issue,2020-01-06\n\
             Base,1754\n\
             Unweighted base,1800\n\
             Don't know / None of these,0.05\n\
             Health,0.30\n",
        );

        let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
        let table = workbook.table("All_adults").unwrap();
        assert_eq!(table.issues(), vec!["Health"]);
    }

    #[test]
    fn test_already_scaled_values_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "All_adults.csv",
            "Issue,2020-01-06\n\
             Health,30\n\
             The economy,50\n",
        );

        let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
        let table = workbook.table("All_adults").unwrap();
        assert!((table.series("Health")[0].1 - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_issue_header_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "broken.csv",
            "Topic,2020-01-06\nHealth,0.30\n",
        );

        let err = WorkbookLoader::new().load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PmqGraphError::Schema { ref column, .. } if column == "Issue"));
    }

    #[test]
    fn test_unparseable_date_header_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "broken.csv",
            "Issue,not-a-date\nHealth,0.30\n",
        );

        let err = WorkbookLoader::new().load_dir(dir.path()).unwrap_err();
        assert!(
            matches!(err, PmqGraphError::Schema { ref column, .. } if column == "not-a-date")
        );
    }

    #[test]
    fn test_non_numeric_cell_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "broken.csv",
            "Issue,2020-01-06\nHealth,thirty\n",
        );

        let err = WorkbookLoader::new().load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PmqGraphError::Schema { .. }));
    }

    #[test]
    fn test_multiple_tabs_keyed_by_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "All_adults.csv", "Issue,2020-01-06\nHealth,0.3\n");
        write_csv(dir.path(), "18-24.csv", "Issue,2020-01-06\nHealth,0.4\n");

        let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
        assert_eq!(workbook.tab_names(), vec!["18-24", "All_adults"]);
        assert!(workbook.table("Pensioners").is_err());
    }
}
