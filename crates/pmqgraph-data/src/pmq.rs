//! PMQ session extraction
//!
//! A full sitting day of Commons speeches contains several sections headed
//! "Prime Minister". The PMQ session proper is the contiguous run that opens
//! with the marker "The Prime Minister was asked—" and whose Q1 is the
//! engagements question. Extraction validates that structure instead of
//! trusting the heading alone.

use pmqgraph_common::{PmqGraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Heading that marks Prime Minister business
const PM_HEADING: &str = "Prime Minister";
/// Marker speech that opens the PMQ session
const SESSION_MARKER: &str = "The Prime Minister was asked—";

/// One speech row of a sitting day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRecord {
    #[serde(default)]
    pub major_heading: Option<String>,
    #[serde(default)]
    pub speech_content: Option<String>,
    #[serde(default)]
    pub question_number: Option<String>,
    #[serde(default)]
    pub speaker_name: Option<String>,
    #[serde(default)]
    pub speech_type: Option<String>,
}

impl SpeechRecord {
    fn content(&self) -> &str {
        self.speech_content.as_deref().unwrap_or("")
    }

    fn is_pm_heading(&self) -> bool {
        self.major_heading.as_deref() == Some(PM_HEADING)
    }
}

/// The extracted PMQ session: a contiguous slice of the sitting day
#[derive(Debug, Clone)]
pub struct PmqSession {
    /// Index of the first session record in the input
    pub start_index: usize,
    /// Index of the last session record in the input (inclusive)
    pub end_index: usize,
    /// The session records, in original order
    pub records: Vec<SpeechRecord>,
}

/// Structural summary of an extracted session
#[derive(Debug, Clone, Serialize)]
pub struct PmqAnalysis {
    pub total_entries: usize,
    pub num_questions: usize,
    pub num_speakers: usize,
    /// Question numbers present, in numeric order (e.g. `["Q1", "Q2", "Q4"]`)
    pub question_numbers: Vec<String>,
    /// Gaps in the 1..=max question sequence
    pub missing_question_numbers: Vec<u32>,
    pub has_start_marker: bool,
    pub has_engagement_question: bool,
}

impl PmqAnalysis {
    pub fn question_sequence_complete(&self) -> bool {
        self.missing_question_numbers.is_empty()
    }
}

/// Extract the PMQ session from one sitting day of speeches.
///
/// Fails when no "Prime Minister" run carries the session marker, when the
/// selected run has no Q1, or when Q1 is not the engagements question.
pub fn extract_pmq_session(records: &[SpeechRecord]) -> Result<PmqSession> {
    let runs = pm_heading_runs(records);
    debug!("Found {} Prime Minister heading runs", runs.len());

    let (start, end) = runs
        .into_iter()
        .find(|&(start, end)| {
            records[start..=end]
                .iter()
                .any(|record| record.content().contains(SESSION_MARKER))
        })
        .ok_or_else(|| PmqGraphError::extraction("Could not find main PMQ section"))?;

    let session = &records[start..=end];

    let q1 = session
        .iter()
        .find(|record| record.question_number.as_deref() == Some("Q1"))
        .ok_or_else(|| PmqGraphError::extraction("Could not find Q1 in PMQ section"))?;

    let q1_content = q1.content().to_lowercase();
    if !q1_content.contains("engagements") && !q1_content.contains("duties") {
        return Err(PmqGraphError::extraction(
            "Q1 does not appear to be the engagements question",
        ));
    }

    Ok(PmqSession {
        start_index: start,
        end_index: end,
        records: session.to_vec(),
    })
}

/// Summarize the structure of an extracted session
pub fn analyze_session(session: &PmqSession) -> PmqAnalysis {
    let records = &session.records;

    let mut speakers = BTreeSet::new();
    for record in records {
        if let Some(name) = record.speaker_name.as_deref() {
            if !name.is_empty() {
                speakers.insert(name.to_string());
            }
        }
    }

    let mut numbered: Vec<(u32, String)> = records
        .iter()
        .filter_map(|record| record.question_number.as_deref())
        .filter_map(|q| {
            q.strip_prefix('Q')
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| (n, q.to_string()))
        })
        .collect();
    numbered.sort();
    numbered.dedup();

    let present: BTreeSet<u32> = numbered.iter().map(|(n, _)| *n).collect();
    let missing: Vec<u32> = match present.iter().max() {
        Some(&max) => (1..=max).filter(|n| !present.contains(n)).collect(),
        None => Vec::new(),
    };

    let num_questions = records
        .iter()
        .filter(|record| record.question_number.is_some())
        .count();

    PmqAnalysis {
        total_entries: records.len(),
        num_questions,
        num_speakers: speakers.len(),
        question_numbers: numbered.into_iter().map(|(_, q)| q).collect(),
        missing_question_numbers: missing,
        has_start_marker: records
            .iter()
            .any(|record| record.content().contains(SESSION_MARKER)),
        has_engagement_question: records.iter().any(|record| {
            record.question_number.as_deref() == Some("Q1") && {
                let content = record.content().to_lowercase();
                content.contains("engagements") || content.contains("duties")
            }
        }),
    }
}

/// Contiguous index runs whose major heading is "Prime Minister"
fn pm_heading_runs(records: &[SpeechRecord]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut current: Option<(usize, usize)> = None;

    for (i, record) in records.iter().enumerate() {
        if record.is_pm_heading() {
            current = Some(match current {
                None => (i, i),
                Some((start, _)) => (start, i),
            });
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}
