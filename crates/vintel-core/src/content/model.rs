//! SEO content module models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// One of the manageable SEO content categories.
///
/// The string form (`faq`, `localSeo`, ...) is used both on the wire and in
/// request paths.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ContentModuleType {
    Faq,
    LocalSeo,
    VoiceSearch,
    KnowledgeBase,
}

impl ContentModuleType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Faq => "FAQ Pages",
            Self::LocalSeo => "Local SEO",
            Self::VoiceSearch => "Voice Search",
            Self::KnowledgeBase => "Knowledge Base",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Faq => "AI-generated FAQ content targeting search queries",
            Self::LocalSeo => "Location-specific pages for better local search",
            Self::VoiceSearch => "Content optimized for voice search queries",
            Self::KnowledgeBase => "Industry expertise articles and important guides",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ContentStatus {
    #[default]
    NotGenerated,
    Generating,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentModuleStatus {
    pub module_type: ContentModuleType,
    pub status: ContentStatus,
    #[serde(default)]
    pub generated_at_utc: Option<DateTime<Utc>>,
}

impl ContentModuleStatus {
    pub fn not_generated(module_type: ContentModuleType) -> Self {
        Self {
            module_type,
            status: ContentStatus::NotGenerated,
            generated_at_utc: None,
        }
    }
}

/// Generated content returned by `GET /content/{module}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    pub module_type: ContentModuleType,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub generated_at_utc: Option<DateTime<Utc>>,
}

/// Opaque file bytes from `GET /content/{module}/download`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDownload {
    pub module_type: ContentModuleType,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ContentDownload {
    /// File name used when the server does not suggest one.
    pub fn default_file_name(module_type: ContentModuleType, on: DateTime<Utc>) -> String {
        format!(
            "perfect_roofing_{}_{}.md",
            module_type.as_ref(),
            on.format("%Y%m%d")
        )
    }
}
