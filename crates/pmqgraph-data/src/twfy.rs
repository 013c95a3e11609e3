//! TheyWorkForYou API client
//!
//! Thin async client for the `getDebates` endpoint, used to pull Prime
//! Minister's Questions transcripts. Requests are single-shot: failures
//! surface immediately as typed errors.

use chrono::{Duration, NaiveDate, Utc};
use pmqgraph_common::{PmqGraphError, Result};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument, warn};

/// Search phrase that selects PMQ sessions in the debates index
pub const PMQ_SEARCH: &str = "Prime Minister Engagements";

/// Configuration for the TheyWorkForYou API client
#[derive(Debug, Clone)]
pub struct TwfyConfig {
    /// API base URL
    pub base_url: String,
    /// API key passed as the `key` query parameter
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TwfyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.theyworkforyou.com/api".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl TwfyConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// One cleaned debate contribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebateRecord {
    pub date: NaiveDate,
    pub time: Option<String>,
    pub gid: String,
    pub speaker_name: Option<String>,
    pub speaker_party: Option<String>,
    pub speaker_constituency: Option<String>,
    /// Contribution body with markup stripped and entities decoded
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct DebatesResponse {
    #[serde(default)]
    rows: Vec<DebateRow>,
}

#[derive(Debug, Deserialize)]
struct DebateRow {
    hdate: Option<String>,
    htime: Option<String>,
    gid: Option<String>,
    body: Option<String>,
    speaker: Option<SpeakerRow>,
}

#[derive(Debug, Deserialize)]
struct SpeakerRow {
    name: Option<String>,
    party: Option<String>,
    constituency: Option<String>,
}

/// TheyWorkForYou API client
#[derive(Debug, Clone)]
pub struct TwfyClient {
    client: Client,
    config: TwfyConfig,
}

impl TwfyClient {
    /// Create a new client with the given configuration
    pub fn new(config: TwfyConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(PmqGraphError::config(
                "TheyWorkForYou API key is required (set TWFY_API_KEY)",
            ));
        }

        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PmqGraphError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Fetch Commons debate contributions matching `search` over the last
    /// `months` months, newest sitting first.
    #[instrument(skip(self), fields(search = %search, months = months))]
    pub async fn get_debates(&self, search: &str, months: u32) -> Result<Vec<DebateRecord>> {
        let end_date = Utc::now().date_naive();
        let start_date = end_date - Duration::days(30 * i64::from(months));

        info!("Fetching debates from {} to {}", start_date, end_date);

        let start = start_date.format("%Y-%m-%d").to_string();
        let end = end_date.format("%Y-%m-%d").to_string();
        let params = [
            ("key", self.config.api_key.as_str()),
            ("type", "commons"),
            ("search", search),
            ("num", "100"),
            ("order", "d"),
            ("start_date", start.as_str()),
            ("end_date", end.as_str()),
        ];

        let url = self.build_url("getDebates");
        debug!("Requesting {}", url);

        let response = self.client.get(&url).query(&params).send().await?;
        let response = self.check_status(response)?;

        let text = response
            .text()
            .await
            .map_err(|e| PmqGraphError::network_with_source("Failed to read response body", e))?;
        let parsed: DebatesResponse = serde_json::from_str(&text)?;

        let mut records: Vec<DebateRecord> = parsed
            .rows
            .into_iter()
            .filter_map(|row| match Self::convert_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed debate row: {}", e);
                    None
                }
            })
            .collect();

        // Newest sitting first, contributions within a sitting in time order
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.time.cmp(&b.time)));

        info!("Fetched {} debate contributions", records.len());
        Ok(records)
    }

    /// Fetch the PMQ sessions specifically
    pub async fn get_pmq_debates(&self, months: u32) -> Result<Vec<DebateRecord>> {
        self.get_debates(PMQ_SEARCH, months).await
    }

    fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(PmqGraphError::twfy_with_status(
                format!("API returned {}", status),
                status.as_u16(),
            ))
        }
    }

    fn convert_row(row: DebateRow) -> Result<DebateRecord> {
        let hdate = row
            .hdate
            .ok_or_else(|| PmqGraphError::twfy("Debate row without a date"))?;
        let date = NaiveDate::parse_from_str(&hdate, "%Y-%m-%d")
            .map_err(|e| PmqGraphError::with_source(format!("Bad debate date '{}'", hdate), e))?;

        let (speaker_name, speaker_party, speaker_constituency) = match row.speaker {
            Some(speaker) => (speaker.name, speaker.party, speaker.constituency),
            None => (None, None, None),
        };

        Ok(DebateRecord {
            date,
            time: row.htime,
            gid: row.gid.unwrap_or_default(),
            speaker_name,
            speaker_party,
            speaker_constituency,
            text: clean_html(&row.body.unwrap_or_default()),
        })
    }
}

/// Strip markup from a debate body and decode the entities that show up in
/// Hansard text, collapsing runs of whitespace.
pub fn clean_html(body: &str) -> String {
    let mut stripped = String::with_capacity(body.len());
    let mut in_tag = false;
    for ch in body.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named and numeric HTML entities
fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.char_indices();

    while let Some((start, ch)) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        // Entities are short; look for the terminating semicolon nearby
        let rest = &text[start..];
        let Some(end) = rest
            .char_indices()
            .take(12)
            .find(|(_, c)| *c == ';')
            .map(|(i, _)| i)
        else {
            result.push(ch);
            continue;
        };
        let entity = &rest[1..end];

        let replacement = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match replacement {
            Some(decoded) => {
                result.push(decoded);
                // Skip the entity body and semicolon
                let skip = rest[1..=end].chars().count();
                for _ in 0..skip {
                    chars.next();
                }
            }
            None => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let result = TwfyClient::new(TwfyConfig::default());
        assert!(result.is_err());

        let result = TwfyClient::new(TwfyConfig::new(
            "https://www.theyworkforyou.com/api",
            "secret",
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_url_handles_trailing_slash() {
        let client =
            TwfyClient::new(TwfyConfig::new("https://example.org/api/", "secret")).unwrap();
        assert_eq!(client.build_url("getDebates"), "https://example.org/api/getDebates");
    }

    #[test]
    fn test_clean_html_strips_tags_and_entities() {
        let body = "<p class=\"speech\">The Prime Minister was asked&#8212;</p>\n<p>about\n\n  engagements &amp; duties.</p>";
        assert_eq!(
            clean_html(body),
            "The Prime Minister was asked\u{2014} about engagements & duties."
        );
    }

    #[test]
    fn test_decode_entities_passes_through_bare_ampersand() {
        assert_eq!(decode_entities("M &amp; S"), "M & S");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("&#65;BC"), "ABC");
        assert_eq!(decode_entities("&#x41;BC"), "ABC");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "rows": [
                {
                    "hdate": "2025-01-29",
                    "htime": "12:00:00",
                    "gid": "2025-01-29a.123.4",
                    "body": "<p>Q1. Engagements</p>",
                    "speaker": {
                        "name": "A Member",
                        "party": "Independent",
                        "constituency": "Somewhere"
                    }
                },
                {
                    "hdate": "2025-01-29",
                    "gid": "2025-01-29a.123.5",
                    "body": "The Prime Minister replied."
                }
            ]
        }"#;

        let parsed: DebatesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.rows.len(), 2);

        let record = TwfyClient::convert_row(parsed.rows.into_iter().next().unwrap()).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 29).unwrap());
        assert_eq!(record.speaker_name.as_deref(), Some("A Member"));
        assert_eq!(record.text, "Q1. Engagements");
    }

    #[test]
    fn test_row_without_date_is_rejected() {
        let row = DebateRow {
            hdate: None,
            htime: None,
            gid: None,
            body: None,
            speaker: None,
        };
        assert!(TwfyClient::convert_row(row).is_err());
    }
}
