//! On-demand investigation reports about a single feed message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /investigation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationRequest {
    pub message_id: String,
    pub message_content: String,
    pub provider_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub content: String,
}

/// Explanatory report produced by the backend.
///
/// Owned by whoever requested it and discarded with that view; it never
/// enters the state store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationReport {
    pub subject_message_id: String,
    pub title: String,
    #[serde(deserialize_with = "clamped_percent")]
    pub confidence_percent: u8,
    #[serde(default)]
    pub sections: Vec<ReportSection>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub generated_at_utc: DateTime<Utc>,
}

fn clamped_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, 100) as u8)
}
