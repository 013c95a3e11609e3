//! `pmqgraph pmq` — extract the PMQ session from a sitting day
//!
//! The sitting day comes from one of three places: the debates archive
//! (fetched by date), a local debates XML file, or a speech-record CSV
//! written by a previous run.

use chrono::NaiveDate;
use clap::Args;
use pmqgraph_common::{PmqGraphError, Result};
use pmqgraph_config::Config;
use pmqgraph_data::{
    analyze_session, extract_pmq_session, fetch_sitting_day, parse_debates_xml, SpeechRecord,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct PmqArgs {
    /// Local sitting day: a debates XML file, or a speech-record CSV
    #[arg(long, short, conflicts_with = "date")]
    pub input: Option<PathBuf>,

    /// Sitting date to fetch from the debates archive (YYYY-MM-DD)
    #[arg(long, short)]
    pub date: Option<NaiveDate>,

    /// Archive republication letter for the fetched sitting
    #[arg(long, default_value = "a")]
    pub revision: char,

    /// Write the extracted session records as CSV to this path
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub async fn run(config: &Config, args: PmqArgs) -> Result<()> {
    let records = match (&args.input, args.date) {
        (Some(path), _) => load_records(path)?,
        (None, Some(date)) => {
            fetch_sitting_day(date, args.revision, config.twfy.timeout_seconds).await?
        }
        (None, None) => {
            return Err(PmqGraphError::config(
                "Provide --input <FILE> or --date <YYYY-MM-DD>",
            ))
        }
    };

    info!(records = records.len(), "Loaded speech records");

    let session = extract_pmq_session(&records)?;
    let analysis = analyze_session(&session);

    println!(
        "PMQ session: records {}..{} ({} entries)",
        session.start_index, session.end_index, analysis.total_entries
    );
    println!(
        "Questions: {} ({}), speakers: {}",
        analysis.num_questions,
        analysis.question_numbers.join(", "),
        analysis.num_speakers
    );
    if !analysis.missing_question_numbers.is_empty() {
        let missing: Vec<String> = analysis
            .missing_question_numbers
            .iter()
            .map(|n| format!("Q{n}"))
            .collect();
        println!("Missing from sequence: {}", missing.join(", "));
    }

    if let Some(path) = &args.output {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &session.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        println!("Wrote session to {}", path.display());
    }
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<SpeechRecord>> {
    let is_xml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));

    if is_xml {
        let xml = std::fs::read_to_string(path)?;
        parse_debates_xml(&xml)
    } else {
        let mut reader = csv::Reader::from_path(path)?;
        reader
            .deserialize()
            .collect::<std::result::Result<_, csv::Error>>()
            .map_err(PmqGraphError::from)
    }
}
