use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vintel_application::FeedPage;
use vintel_core::clock::ManualClock;
use vintel_core::config::VintelConfig;
use vintel_core::conversation::{ConversationApi, Message, StartResponse, StatusSnapshot};
use vintel_core::investigation::{InvestigationReport, InvestigationRequest};
use vintel_core::mood::MoodPalette;
use vintel_core::notification::NotificationLevel;
use vintel_core::{Result, VintelError};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

#[derive(Default)]
struct FakeApi {
    status_calls: AtomicUsize,
    palette_requests: Mutex<Vec<String>>,
    investigations: Mutex<Vec<InvestigationRequest>>,
    fail_investigation: bool,
}

#[async_trait]
impl ConversationApi for FakeApi {
    async fn fetch_status(&self) -> Result<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatusSnapshot {
            active: false,
            round_number: 2,
            message_count: 3,
            next_event_time_utc: Some(t0() + ChronoDuration::seconds(120)),
            provider_availability: BTreeMap::from([("gemini".to_string(), true)]),
            server_time_utc: Some(t0()),
            conversation_id: Some("conv-1".to_string()),
        })
    }

    async fn fetch_messages(&self) -> Result<Vec<Message>> {
        Ok(["m1", "m2", "m3"]
            .iter()
            .enumerate()
            .map(|(i, id)| Message {
                id: id.to_string(),
                provider_id: "gemini".to_string(),
                display_name: "Business Analyst AI".to_string(),
                text: format!("Observation {}", i + 1),
                created_at_utc: t0() + ChronoDuration::seconds(i as i64),
                round_number: 2,
            })
            .collect())
    }

    async fn start_conversation(&self) -> Result<StartResponse> {
        Ok(StartResponse {
            success: true,
            message: "Conversation started".to_string(),
        })
    }

    async fn request_investigation(
        &self,
        request: &InvestigationRequest,
    ) -> Result<InvestigationReport> {
        self.investigations.lock().unwrap().push(request.clone());
        if self.fail_investigation {
            return Err(VintelError::server(500, "Investigation unavailable"));
        }
        Ok(InvestigationReport {
            subject_message_id: request.message_id.clone(),
            title: "Business Analysis & Market Position".to_string(),
            confidence_percent: 87,
            sections: Vec::new(),
            recommendations: vec!["Highlight emergency response".to_string()],
            generated_at_utc: t0(),
        })
    }

    async fn fetch_palette(&self, conversation_id: &str) -> Result<MoodPalette> {
        self.palette_requests
            .lock()
            .unwrap()
            .push(conversation_id.to_string());
        Ok(MoodPalette {
            mood: "trustworthy".to_string(),
            intensity: 64.0,
            primary: "#1976d2".to_string(),
            secondary: "#42a5f5".to_string(),
            accent: "#0d47a1".to_string(),
            background: "#e3f2fd".to_string(),
            text: "#0d47a1".to_string(),
            primary_light: "#64b5f6".to_string(),
            primary_dark: "#1565c0".to_string(),
            secondary_light: "#90caf9".to_string(),
        })
    }
}

fn poll_only_config() -> VintelConfig {
    let mut config = VintelConfig::default();
    config.transport.prefer_push = false;
    config
}

async fn open_loaded(api: Arc<FakeApi>) -> FeedPage {
    let page = FeedPage::open(
        &poll_only_config(),
        api,
        None,
        Arc::new(ManualClock::new(t0())),
    );
    let mut snapshots = page.subscribe();
    snapshots
        .wait_for(|s| s.messages.len() == 3 && s.state.round_number == 2)
        .await
        .unwrap();
    page
}

#[tokio::test(start_paused = true)]
async fn page_loads_state_and_countdown() {
    let page = open_loaded(Arc::new(FakeApi::default())).await;

    let snapshot = page.current();
    assert_eq!(snapshot.state.message_count, 3);
    assert_eq!(snapshot.state.messages_remaining, 13);
    assert_eq!(snapshot.countdown.remaining_secs, 120);
    assert_eq!(snapshot.state.available_provider_count(), 1);

    page.close().await;
}

#[tokio::test(start_paused = true)]
async fn investigation_uses_the_stored_message() {
    let api = Arc::new(FakeApi::default());
    let page = open_loaded(api.clone()).await;

    let report = page.request_investigation("m2").await.unwrap();
    assert_eq!(report.subject_message_id, "m2");
    assert_eq!(
        api.investigations.lock().unwrap()[0],
        InvestigationRequest {
            message_id: "m2".to_string(),
            message_content: "Observation 2".to_string(),
            provider_id: "gemini".to_string(),
        }
    );

    let err = page.request_investigation("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(api.investigations.lock().unwrap().len(), 1);

    page.close().await;
}

#[tokio::test(start_paused = true)]
async fn failed_investigation_is_notified() {
    let api = Arc::new(FakeApi {
        fail_investigation: true,
        ..FakeApi::default()
    });
    let page = open_loaded(api).await;
    let mut snapshots = page.subscribe();

    assert!(page.request_investigation("m1").await.is_err());
    let snapshot = snapshots
        .wait_for(|s| !s.notifications.is_empty())
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.notifications[0].level, NotificationLevel::Error);
    assert_eq!(
        snapshot.notifications[0].message,
        "Failed to investigate message. Investigation unavailable"
    );

    page.actions()
        .dismiss(snapshot.notifications[0].id.clone())
        .await;
    snapshots
        .wait_for(|s| s.notifications.is_empty())
        .await
        .unwrap();

    page.close().await;
}

#[tokio::test(start_paused = true)]
async fn manual_start_refreshes_immediately() {
    let api = Arc::new(FakeApi::default());
    let page = open_loaded(api.clone()).await;
    let before = api.status_calls.load(Ordering::SeqCst);

    let response = page.start_conversation_manually().await.unwrap();
    assert!(response.success);

    // Refresh happens before the 1s poll interval elapses.
    tokio::time::timeout(Duration::from_millis(500), async {
        while api.status_calls.load(Ordering::SeqCst) == before {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    page.close().await;
}

#[tokio::test(start_paused = true)]
async fn conversation_palette_is_fetched_once() {
    let api = Arc::new(FakeApi::default());
    let page = open_loaded(api.clone()).await;
    let mut snapshots = page.subscribe();

    let snapshot = snapshots
        .wait_for(|s| s.palette.is_some())
        .await
        .unwrap()
        .clone();
    assert_eq!(snapshot.palette.as_ref().unwrap().mood, "trustworthy");

    // Later polls report the same conversation.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(*api.palette_requests.lock().unwrap(), vec!["conv-1"]);

    page.close().await;
}
