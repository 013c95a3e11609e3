//! Integration tests for pmqgraph-charts.
//!
//! Drive the renderer from a workbook on disk, the way the CLI does.

use pmqgraph_charts::{ChartStyle, FacetLayout, FacetedTimeSeries};
use pmqgraph_common::PmqGraphError;
use pmqgraph_data::WorkbookLoader;
use std::io::Write;
use std::path::Path;

fn write_csv(dir: &Path, name: &str, content: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    write!(file, "{}", content).unwrap();
}

fn small_style() -> ChartStyle {
    ChartStyle {
        width: 400,
        height: 300,
        ..Default::default()
    }
}

#[test]
fn test_workbook_to_png_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "All_adults.csv",
        "Issue,2020-01-06,2020-01-13,2020-01-20\n\
         Health,0.30,0.35,0.32\n\
         The economy,0.50,0.48,0.52\n\
         Crime,0.20,0.22,0.19\n",
    );

    let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
    let table = workbook.table("All_adults").unwrap();

    let figure = FacetedTimeSeries::new(table.issues(), FacetLayout::new(2, 2))
        .with_style(small_style());

    let out = dir.path().join("issues.png");
    figure.render_to_file(table, &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
}

#[test]
fn test_unknown_tab_error_lists_available_tabs() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "All_adults.csv", "Issue,2020-01-06\nHealth,0.3\n");
    write_csv(dir.path(), "18-24.csv", "Issue,2020-01-06\nHealth,0.4\n");

    let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
    let err = workbook.table("Pensioners").unwrap_err();

    assert!(matches!(err, PmqGraphError::TableNotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("Pensioners"));
    assert!(message.contains("All_adults"));
    assert!(message.contains("18-24"));
}

#[test]
fn test_undersized_grid_fails_with_both_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
        dir.path(),
        "All_adults.csv",
        "Issue,2020-01-06\nHealth,0.3\nThe economy,0.5\nCrime,0.2\n",
    );

    let workbook = WorkbookLoader::new().load_dir(dir.path()).unwrap();
    let table = workbook.table("All_adults").unwrap();

    // Three issues plus the overview need four cells
    let figure = FacetedTimeSeries::new(table.issues(), FacetLayout::new(1, 3))
        .with_style(small_style());
    let err = figure.render_to_bytes(table).unwrap_err();
    assert!(matches!(
        err,
        PmqGraphError::Layout {
            required: 4,
            available: 3
        }
    ));
}
