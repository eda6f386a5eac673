//! Server-sent events push channel.
//!
//! Events arrive either as named SSE events (`event: new_message`, data =
//! payload) or as unnamed `message` events whose data is the full
//! `{type, payload}` envelope. Both decode into the same `FeedEvent`.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest_eventsource::{Event, EventSource};
use std::time::Duration;
use vintel_core::conversation::{FeedEvent, PushChannel, PushStream};
use vintel_core::{Result, VintelError};

const ENVELOPE_EVENT: &str = "message";
const FEED_EVENT_TYPES: [&str; 4] = [
    "new_message",
    "state_change",
    "conversation_started",
    "conversation_completed",
];

/// Push channel backed by `GET {base_url}{push_path}`.
///
/// Uses its own client without a total request timeout so the stream can
/// stay open indefinitely; only connecting is bounded. The library's own
/// reconnect logic is disabled by closing the source on the first error;
/// reconnect policy belongs to the transport adapter.
#[derive(Clone)]
pub struct SsePushChannel {
    client: Client,
    url: String,
}

impl SsePushChannel {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| VintelError::internal(format!("failed to build SSE client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PushChannel for SsePushChannel {
    async fn subscribe(&self) -> Result<PushStream> {
        let request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream");
        let mut source = EventSource::new(request)
            .map_err(|e| VintelError::internal(format!("cannot open push channel: {}", e)))?;

        // Wait for the connection to be accepted before reporting success.
        let first = match source.next().await {
            Some(Ok(Event::Open)) => None,
            Some(Ok(Event::Message(message))) => decode_event(&message.event, &message.data),
            Some(Err(err)) => {
                source.close();
                return Err(map_sse_error(err));
            }
            None => {
                return Err(VintelError::network(
                    "push channel closed before it was opened",
                ));
            }
        };
        tracing::info!("[Push] Connected to {}", self.url);

        let events = stream::unfold(Some(source), |state| async move {
            let mut source = state?;
            loop {
                match source.next().await {
                    Some(Ok(Event::Open)) => continue,
                    Some(Ok(Event::Message(message))) => {
                        if let Some(decoded) = decode_event(&message.event, &message.data) {
                            return Some((decoded, Some(source)));
                        }
                    }
                    Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                        tracing::info!("[Push] Stream ended by server");
                        source.close();
                        return None;
                    }
                    Some(Err(err)) => {
                        source.close();
                        return Some((Err(map_sse_error(err)), None));
                    }
                }
            }
        });

        Ok(stream::iter(first).chain(events).boxed())
    }
}

/// Decodes one SSE event. Unknown event names yield `None` and are skipped.
pub fn decode_event(event: &str, data: &str) -> Option<Result<FeedEvent>> {
    if event.is_empty() || event == ENVELOPE_EVENT {
        return Some(serde_json::from_str::<FeedEvent>(data).map_err(VintelError::from));
    }
    if !FEED_EVENT_TYPES.contains(&event) {
        tracing::debug!("[Push] Ignoring unknown event '{}'", event);
        return None;
    }
    let decoded = serde_json::from_str::<serde_json::Value>(data)
        .and_then(|payload| {
            serde_json::from_value::<FeedEvent>(serde_json::json!({
                "type": event,
                "payload": payload,
            }))
        })
        .map_err(VintelError::from);
    Some(decoded)
}

fn map_sse_error(err: reqwest_eventsource::Error) -> VintelError {
    use reqwest_eventsource::Error;
    match err {
        Error::InvalidStatusCode(status, _) => VintelError::server(
            status.as_u16(),
            format!("push channel refused with status {}", status.as_u16()),
        ),
        Error::InvalidContentType(content_type, _) => VintelError::server(
            200,
            format!(
                "push channel answered with {}",
                content_type.to_str().unwrap_or("an unexpected content type")
            ),
        ),
        Error::Transport(e) => crate::error::from_reqwest(e),
        other => VintelError::network(other.to_string()),
    }
}
