//! Hansard debates XML parser
//!
//! Sitting days are published as `debates{date}{revision}.xml` files in the
//! TheyWorkForYou scrapedxml archive. The document is a flat stream of
//! heading and speech elements; headings set the context that the speeches
//! after them belong to. The parser walks the stream once, carrying the
//! current major heading, and turns each `<speech>` element into a
//! [`SpeechRecord`].

use crate::pmq::SpeechRecord;
use crate::twfy::clean_html;
use chrono::NaiveDate;
use pmqgraph_common::{PmqGraphError, Result};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Base URL of the scrapedxml debates archive
pub const DEBATES_ARCHIVE_URL: &str = "https://www.theyworkforyou.com/pwdata/scrapedxml/debates";

/// URL of the archive file for one sitting day.
///
/// `revision` is the archive's republication letter; sittings start at `a`
/// and move down the alphabet as corrections are published.
pub fn sitting_url(date: NaiveDate, revision: char) -> String {
    format!(
        "{}/debates{}{}.xml",
        DEBATES_ARCHIVE_URL,
        date.format("%Y-%m-%d"),
        revision
    )
}

/// Fetch and parse one sitting day from the debates archive.
#[instrument(fields(date = %date, revision = %revision))]
pub async fn fetch_sitting_day(
    date: NaiveDate,
    revision: char,
    timeout_secs: u64,
) -> Result<Vec<SpeechRecord>> {
    let url = sitting_url(date, revision);
    info!("Fetching sitting day from {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PmqGraphError::network_with_source("Failed to create HTTP client", e))?;

    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(PmqGraphError::twfy_with_status(
            format!("Debates archive returned {} for {}", status, url),
            status.as_u16(),
        ));
    }

    let xml = response
        .text()
        .await
        .map_err(|e| PmqGraphError::network_with_source("Failed to read response body", e))?;

    parse_debates_xml(&xml)
}

/// Parse a debates XML document into speech records, in document order.
///
/// Heading elements (`oral-heading`, `major-heading`, `minor-heading`) update
/// the running context; every `<speech>` element becomes one record carrying
/// the major heading in force when it was spoken. `oral-qnum` attributes are
/// normalized to the `Q1` form.
pub fn parse_debates_xml(xml: &str) -> Result<Vec<SpeechRecord>> {
    let mut records = Vec::new();
    let mut major_heading: Option<String> = None;
    let mut pos = 0;

    while let Some(open_start) = find_from(xml, pos, "<") {
        let Some(open_end) = find_from(xml, open_start, ">") else {
            break;
        };
        let tag = &xml[open_start + 1..open_end];
        let name = tag_name(tag);

        // Self-closing elements have no body to scan
        if tag.ends_with('/') {
            pos = open_end + 1;
            continue;
        }

        match name {
            "major-heading" => match element_body(xml, open_end + 1, name) {
                Some((body, after)) => {
                    let heading = clean_html(body);
                    major_heading = (!heading.is_empty()).then_some(heading);
                    pos = after;
                }
                None => pos = open_end + 1,
            },
            "speech" => match element_body(xml, open_end + 1, name) {
                Some((body, after)) => {
                    records.push(speech_record(tag, body, major_heading.clone()));
                    pos = after;
                }
                None => pos = open_end + 1,
            },
            _ => pos = open_end + 1,
        }
    }

    if records.is_empty() {
        return Err(PmqGraphError::extraction(
            "No speech elements found in debates XML",
        ));
    }

    debug!("Parsed {} speech records", records.len());
    Ok(records)
}

fn speech_record(open_tag: &str, body: &str, major_heading: Option<String>) -> SpeechRecord {
    SpeechRecord {
        major_heading,
        speech_content: paragraph_text(body),
        question_number: question_number(open_tag),
        speaker_name: attr(open_tag, "speakername"),
        speech_type: attr(open_tag, "type"),
    }
}

/// All `<p>` texts of a speech body, stripped and joined with a space
fn paragraph_text(body: &str) -> Option<String> {
    let mut paragraphs = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_from(body, pos, "<p") {
        // Reject tags that merely start with "p" (e.g. <phrase>)
        let after = &body[start + 2..];
        if !after.starts_with('>') && !after.starts_with(' ') {
            pos = start + 2;
            continue;
        }
        let Some(open_end) = find_from(body, start, ">") else {
            break;
        };
        let Some(close) = find_from(body, open_end + 1, "</p>") else {
            break;
        };
        let text = clean_html(&body[open_end + 1..close]);
        if !text.is_empty() {
            paragraphs.push(text);
        }
        pos = close + 4;
    }

    (!paragraphs.is_empty()).then(|| paragraphs.join(" "))
}

/// Oral question number, normalized to the `Q<n>` form
fn question_number(open_tag: &str) -> Option<String> {
    let raw = attr(open_tag, "oral-qnum")?;
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if raw.starts_with('Q') {
        Some(raw.to_string())
    } else {
        Some(format!("Q{raw}"))
    }
}

/// Value of a quoted attribute in an open tag, entity-decoded
fn attr(open_tag: &str, name: &str) -> Option<String> {
    let pattern = format!("{name}=\"");
    let mut search = 0;

    while let Some(at) = find_from(open_tag, search, &pattern) {
        let value_start = at + pattern.len();
        let value_end = find_from(open_tag, value_start, "\"")?;
        // The match must be a whole attribute name, not a suffix of one
        if open_tag[..at].ends_with(|c: char| c.is_whitespace()) {
            return Some(clean_html(&open_tag[value_start..value_end]));
        }
        search = value_end + 1;
    }
    None
}

/// Body and end offset of the element whose open tag just closed at `start`
fn element_body<'a>(s: &'a str, start: usize, name: &str) -> Option<(&'a str, usize)> {
    let close = format!("</{name}>");
    let at = find_from(s, start, &close)?;
    Some((&s[start..at], at + close.len()))
}

fn find_from(s: &str, from: usize, pattern: &str) -> Option<usize> {
    s.get(from..)?.find(pattern).map(|i| from + i)
}

fn tag_name(tag: &str) -> &str {
    tag.split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
}
