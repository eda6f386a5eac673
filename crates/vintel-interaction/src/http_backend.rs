//! HttpBackend - reqwest implementation of the conversation and content APIs.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use vintel_core::config::VintelConfig;
use vintel_core::content::{
    ContentApi, ContentDocument, ContentDownload, ContentModuleStatus, ContentModuleType,
};
use vintel_core::conversation::{ConversationApi, Message, StartResponse, StatusSnapshot};
use vintel_core::investigation::{InvestigationReport, InvestigationRequest};
use vintel_core::mood::MoodPalette;
use vintel_core::{Result, VintelError};

use crate::error::{from_reqwest, server_error};

/// `{"success": true, "palette": {...}}` or `{"success": false, "error": "..."}`
#[derive(Deserialize)]
struct PaletteEnvelope {
    success: bool,
    #[serde(default)]
    palette: Option<MoodPalette>,
    #[serde(default)]
    error: Option<String>,
}

/// JSON-over-HTTP client for the backend.
///
/// Every request carries the configured timeout. Cloning is cheap and
/// shares the connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    business_id: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &VintelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.transport.request_timeout())
            .build()
            .map_err(|e| VintelError::internal(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            "[HttpBackend] Initialized with URL: {}, business: {}",
            config.base_url,
            config.business_id.as_deref().unwrap_or("none")
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            business_id: config.business_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `/content/{module}[/suffix]`, scoped under `/business/{id}` when a
    /// business is configured.
    fn content_url(&self, module: ContentModuleType, suffix: Option<&str>) -> String {
        let mut path = match &self.business_id {
            Some(id) => format!("business/{}/content/{}", id, module.as_ref()),
            None => format!("content/{}", module.as_ref()),
        };
        if let Some(suffix) = suffix {
            path.push('/');
            path.push_str(suffix);
        }
        self.url(&path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(from_reqwest)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(server_error(response).await)
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(from_reqwest)
    }
}

#[async_trait]
impl ConversationApi for HttpBackend {
    async fn fetch_status(&self) -> Result<StatusSnapshot> {
        self.json(self.client.get(self.url("conversation/status")))
            .await
    }

    async fn fetch_messages(&self) -> Result<Vec<Message>> {
        self.json(self.client.get(self.url("conversation/messages")))
            .await
    }

    async fn start_conversation(&self) -> Result<StartResponse> {
        tracing::info!("[HttpBackend] Requesting manual conversation start");
        self.json(self.client.post(self.url("conversation/start")))
            .await
    }

    async fn request_investigation(
        &self,
        request: &InvestigationRequest,
    ) -> Result<InvestigationReport> {
        tracing::debug!(
            "[HttpBackend] Investigating message {} from {}",
            request.message_id,
            request.provider_id
        );
        self.json(self.client.post(self.url("investigation")).json(request))
            .await
    }

    async fn fetch_palette(&self, conversation_id: &str) -> Result<MoodPalette> {
        if !is_path_segment(conversation_id) {
            return Err(VintelError::not_found("palette", conversation_id));
        }
        let path = format!("conversation/{}/colors", conversation_id);
        let envelope: PaletteEnvelope = self.json(self.client.get(self.url(&path))).await?;
        match envelope {
            PaletteEnvelope {
                success: true,
                palette: Some(palette),
                ..
            } => Ok(palette),
            PaletteEnvelope { error, .. } => {
                tracing::debug!(
                    "[HttpBackend] No palette for {}: {}",
                    conversation_id,
                    error.as_deref().unwrap_or("unknown error")
                );
                Err(VintelError::not_found("palette", conversation_id))
            }
        }
    }
}

fn is_path_segment(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl ContentApi for HttpBackend {
    async fn content_status(&self, module: ContentModuleType) -> Result<ContentModuleStatus> {
        self.json(self.client.get(self.content_url(module, Some("status"))))
            .await
    }

    async fn generate(&self, module: ContentModuleType) -> Result<ContentModuleStatus> {
        self.json(self.client.post(self.content_url(module, Some("generate"))))
            .await
    }

    async fn fetch(&self, module: ContentModuleType) -> Result<ContentDocument> {
        self.json(self.client.get(self.content_url(module, None)))
            .await
    }

    async fn download(&self, module: ContentModuleType) -> Result<ContentDownload> {
        let response = self
            .execute(self.client.get(self.content_url(module, Some("download"))))
            .await?;

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_file_name)
            .unwrap_or_else(|| ContentDownload::default_file_name(module, Utc::now()));

        let bytes = response.bytes().await.map_err(from_reqwest)?;
        Ok(ContentDownload {
            module_type: module,
            file_name,
            bytes: bytes.to_vec(),
        })
    }

    async fn delete(&self, module: ContentModuleType) -> Result<()> {
        self.execute(self.client.delete(self.content_url(module, None)))
            .await?;
        Ok(())
    }
}

/// File name from a `Content-Disposition` header value.
///
/// Path components are stripped so the name is always a bare file name.
fn attachment_file_name(header: &str) -> Option<String> {
    let raw = header.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("filename")
            .then(|| value.trim().trim_matches('"'))
    })?;

    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(business_id: Option<&str>) -> HttpBackend {
        let config = VintelConfig {
            base_url: "https://intel.example.com/api/".into(),
            business_id: business_id.map(String::from),
            ..VintelConfig::default()
        };
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_content_urls() {
        let unscoped = backend(None);
        assert_eq!(
            unscoped.content_url(ContentModuleType::LocalSeo, Some("status")),
            "https://intel.example.com/api/content/localSeo/status"
        );

        let scoped = backend(Some("7"));
        assert_eq!(
            scoped.content_url(ContentModuleType::Faq, None),
            "https://intel.example.com/api/business/7/content/faq"
        );
    }

    #[test]
    fn test_palette_envelope() {
        let ok: PaletteEnvelope = serde_json::from_str(
            r##"{"success": true, "palette": {
                "mood": "urgent", "intensity": 40,
                "primary": "#f44336", "secondary": "#ff9800", "accent": "#d32f2f",
                "background": "#ffebee", "text": "#b71c1c", "primary_light": "#e57373",
                "primary_dark": "#c62828", "secondary_light": "#ffb74d"}}"##,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(ok.palette.unwrap().mood, "urgent");

        let failed: PaletteEnvelope =
            serde_json::from_str(r#"{"success": false, "error": "Conversation not found"}"#)
                .unwrap();
        assert!(!failed.success);
        assert!(failed.palette.is_none());
        assert_eq!(failed.error.as_deref(), Some("Conversation not found"));
    }

    #[test]
    fn test_palette_id_must_be_a_path_segment() {
        assert!(is_path_segment("42"));
        assert!(is_path_segment("conv-7_a"));
        assert!(!is_path_segment(""));
        assert!(!is_path_segment("../status"));
    }

    #[test]
    fn test_attachment_file_name() {
        assert_eq!(
            attachment_file_name(r#"attachment; filename="faq_2025.md""#).as_deref(),
            Some("faq_2025.md")
        );
        assert_eq!(
            attachment_file_name("attachment; filename=kb.md").as_deref(),
            Some("kb.md")
        );
        assert_eq!(
            attachment_file_name(r#"attachment; filename="../../etc/passwd""#).as_deref(),
            Some("passwd")
        );
        assert_eq!(attachment_file_name("inline"), None);
    }
}
