//! Content dashboard: dispatches generate/view/download/delete actions for
//! the SEO content modules.
//!
//! Every action is checked against the module's state machine before any
//! request goes out, shows its optimistic status immediately, and either
//! commits or reverts when the response arrives. Responses overtaken by a
//! newer request for the same module are ignored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::Mutex;
use vintel_core::clock::Clock;
use vintel_core::content::{
    ContentAction, ContentApi, ContentDocument, ContentDownload, ContentModuleStatus,
    ContentModuleType, ContentStatus, Transition,
};
use vintel_core::notification::{Notification, NotificationCenter, NotificationLevel};
use vintel_core::sequence::{RequestTracker, Ticket};
use vintel_core::{Result, VintelError};

/// Asks the user to confirm a destructive action.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything. Used for `--yes`.
pub struct AssumeYes;

#[async_trait]
impl Confirmer for AssumeYes {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// What the dashboard shows for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
    pub module_type: ContentModuleType,
    pub status: ContentStatus,
    pub generated_at_utc: Option<DateTime<Utc>>,
    /// Action currently waiting for a response, if any.
    pub in_flight: Option<ContentAction>,
}

impl ModuleEntry {
    fn new(module_type: ContentModuleType) -> Self {
        Self {
            module_type,
            status: ContentStatus::NotGenerated,
            generated_at_utc: None,
            in_flight: None,
        }
    }
}

struct DashboardState {
    modules: BTreeMap<ContentModuleType, ModuleEntry>,
    /// Tickets for generate/view/download/delete.
    tracker: RequestTracker<ContentModuleType>,
    /// Tickets for status reads, kept apart so a read never supersedes an
    /// action.
    status_reads: RequestTracker<ContentModuleType>,
    notifications: NotificationCenter,
}

/// A started request: its ticket plus the statuses it moves through.
struct Pending {
    action: ContentAction,
    ticket: Ticket<ContentModuleType>,
    transition: Transition,
}

pub struct Dashboard {
    api: Arc<dyn ContentApi>,
    clock: Arc<dyn Clock>,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new(
        api: Arc<dyn ContentApi>,
        clock: Arc<dyn Clock>,
        notifications: NotificationCenter,
    ) -> Self {
        let modules = ContentModuleType::iter()
            .map(|m| (m, ModuleEntry::new(m)))
            .collect();
        Self {
            api,
            clock,
            state: Mutex::new(DashboardState {
                modules,
                tracker: RequestTracker::new(),
                status_reads: RequestTracker::new(),
                notifications,
            }),
        }
    }

    /// All modules in display order.
    pub async fn modules(&self) -> Vec<ModuleEntry> {
        self.state.lock().await.modules.values().cloned().collect()
    }

    pub async fn module(&self, module: ContentModuleType) -> ModuleEntry {
        self.state
            .lock()
            .await
            .modules
            .get(&module)
            .cloned()
            .unwrap_or_else(|| ModuleEntry::new(module))
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.notifications.prune(now);
        state.notifications.active(now)
    }

    pub async fn dismiss(&self, notification_id: &str) -> bool {
        self.state.lock().await.notifications.dismiss(notification_id)
    }

    /// Loads the status of every module.
    ///
    /// Failures are recorded per module and leave that module as it was.
    pub async fn load_all(&self) {
        for module in ContentModuleType::iter() {
            let _ = self.refresh_status(module).await;
        }
    }

    /// Reloads one module's status from the backend.
    ///
    /// While an action is in flight for the module the entry keeps its
    /// optimistic status; the action's own response settles it.
    pub async fn refresh_status(&self, module: ContentModuleType) -> Result<ContentModuleStatus> {
        let ticket = self.state.lock().await.status_reads.issue(module);
        let result = self.api.content_status(module).await;

        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if !state.status_reads.is_current(&ticket) {
            tracing::debug!("[Dashboard] Ignoring superseded status of {}", module);
            return Err(VintelError::Cancelled);
        }
        match &result {
            Ok(status) => {
                let entry = state.modules.entry(module).or_insert_with(|| ModuleEntry::new(module));
                if let Some(action) = entry.in_flight {
                    tracing::debug!(
                        "[Dashboard] Keeping {} state of {} until it settles",
                        action,
                        module
                    );
                } else {
                    entry.status = status.status;
                    entry.generated_at_utc = status.generated_at_utc;
                }
            }
            Err(err) => {
                tracing::warn!("[Dashboard] Failed to load {} status: {}", module, err);
                state.notifications.push_error(
                    format!("load {} status", module.display_name()),
                    err,
                    now,
                );
            }
        }
        result
    }

    pub async fn generate(&self, module: ContentModuleType) -> Result<ContentModuleStatus> {
        let pending = self.begin(module, ContentAction::Generate).await?;
        let result = self.api.generate(module).await;
        let generated_at = result.as_ref().ok().and_then(|s| s.generated_at_utc);
        self.finish(module, pending, result, |state, _| {
            state.generated_at_utc = generated_at;
            Some(format!("{} generated successfully", module.display_name()))
        })
        .await
    }

    pub async fn view(&self, module: ContentModuleType) -> Result<ContentDocument> {
        let pending = self.begin(module, ContentAction::View).await?;
        let result = self.api.fetch(module).await;
        self.finish(module, pending, result, |_, _| None).await
    }

    pub async fn download(&self, module: ContentModuleType) -> Result<ContentDownload> {
        let pending = self.begin(module, ContentAction::Download).await?;
        let result = self.api.download(module).await;
        self.finish(module, pending, result, |_, download: &ContentDownload| {
            Some(format!("Downloaded {}", download.file_name))
        })
        .await
    }

    /// Deletes generated content after confirmation.
    ///
    /// Returns `Ok(false)` when the user declined; nothing is sent then.
    pub async fn delete(&self, module: ContentModuleType, confirmer: &dyn Confirmer) -> Result<bool> {
        // Reject invalid deletes before bothering the user.
        {
            let state = self.state.lock().await;
            let from = state
                .modules
                .get(&module)
                .map_or(ContentStatus::NotGenerated, |e| e.status);
            ContentAction::Delete.plan(module, from)?;
        }

        let prompt = format!(
            "Are you sure you want to delete the generated {} content?",
            module.display_name()
        );
        if !confirmer.confirm(&prompt).await {
            tracing::debug!("[Dashboard] Delete of {} declined", module);
            return Ok(false);
        }

        let pending = self.begin(module, ContentAction::Delete).await?;
        let result = self.api.delete(module).await;
        self.finish(module, pending, result, |state, _| {
            state.generated_at_utc = None;
            Some(format!("{} content deleted", module.display_name()))
        })
        .await?;
        Ok(true)
    }

    async fn begin(&self, module: ContentModuleType, action: ContentAction) -> Result<Pending> {
        let mut state = self.state.lock().await;
        let entry = state
            .modules
            .entry(module)
            .or_insert_with(|| ModuleEntry::new(module));

        if let Some(busy @ (ContentAction::Generate | ContentAction::Delete)) = entry.in_flight {
            tracing::debug!("[Dashboard] {} rejected, {} {} in flight", action, busy, module);
            return Err(VintelError::InvalidTransition {
                module: module.display_name().to_string(),
                from: entry.status.to_string(),
                action: action.to_string(),
            });
        }
        let transition = action.plan(module, entry.status).inspect_err(|err| {
            tracing::debug!("[Dashboard] Rejected: {}", err);
        })?;
        entry.status = transition.optimistic;
        entry.in_flight = Some(action);

        let ticket = state.tracker.issue(module);
        tracing::info!("[Dashboard] {} {}", action, module);
        Ok(Pending {
            action,
            ticket,
            transition,
        })
    }

    /// Commits or reverts a finished request. `on_success` may adjust the
    /// entry and return a success notification.
    async fn finish<T, F>(
        &self,
        module: ContentModuleType,
        pending: Pending,
        result: Result<T>,
        on_success: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut ModuleEntry, &T) -> Option<String>,
    {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if !state.tracker.is_current(&pending.ticket) {
            tracing::debug!(
                "[Dashboard] Ignoring superseded {} response for {}",
                pending.action,
                module
            );
            return Err(VintelError::Cancelled);
        }

        let DashboardState {
            modules,
            notifications,
            ..
        } = &mut *state;
        let entry = modules
            .entry(module)
            .or_insert_with(|| ModuleEntry::new(module));
        entry.in_flight = None;
        entry.status = pending.transition.settle(result.is_ok());

        let action_phrase = format!("{} {}", pending.action.verb(), module.display_name());
        match &result {
            Ok(value) => {
                if let Some(message) = on_success(entry, value) {
                    notifications.push(NotificationLevel::Success, action_phrase, message, now);
                }
            }
            Err(err) => {
                tracing::warn!("[Dashboard] Failed to {}: {}", action_phrase, err);
                notifications.push_error(action_phrase, err, now);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vintel_core::clock::ManualClock;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct FakeContent {
        fail_with: StdMutex<Option<VintelError>>,
        calls: AtomicUsize,
    }

    impl FakeContent {
        fn failing(err: VintelError) -> Self {
            Self {
                fail_with: StdMutex::new(Some(err)),
                ..Self::default()
            }
        }

        fn outcome<T>(&self, value: T) -> Result<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(value),
            }
        }
    }

    #[async_trait]
    impl ContentApi for FakeContent {
        async fn content_status(&self, module: ContentModuleType) -> Result<ContentModuleStatus> {
            self.outcome(ContentModuleStatus {
                module_type: module,
                status: ContentStatus::Generated,
                generated_at_utc: Some(t0()),
            })
        }

        async fn generate(&self, module: ContentModuleType) -> Result<ContentModuleStatus> {
            self.outcome(ContentModuleStatus {
                module_type: module,
                status: ContentStatus::Generated,
                generated_at_utc: Some(t0()),
            })
        }

        async fn fetch(&self, module: ContentModuleType) -> Result<ContentDocument> {
            self.outcome(ContentDocument {
                module_type: module,
                title: "Roofing FAQ".into(),
                content: "# FAQ".into(),
                generated_at_utc: Some(t0()),
            })
        }

        async fn download(&self, module: ContentModuleType) -> Result<ContentDownload> {
            self.outcome(ContentDownload {
                module_type: module,
                file_name: "faq.md".into(),
                bytes: b"# FAQ".to_vec(),
            })
        }

        async fn delete(&self, _module: ContentModuleType) -> Result<()> {
            self.outcome(())
        }
    }

    struct Decline;

    #[async_trait]
    impl Confirmer for Decline {
        async fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn dashboard(api: Arc<FakeContent>) -> Dashboard {
        Dashboard::new(
            api,
            Arc::new(ManualClock::new(t0())),
            NotificationCenter::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_commits_generated() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api.clone());

        dashboard.generate(ContentModuleType::Faq).await.unwrap();

        let entry = dashboard.module(ContentModuleType::Faq).await;
        assert_eq!(entry.status, ContentStatus::Generated);
        assert_eq!(entry.generated_at_utc, Some(t0()));
        assert_eq!(entry.in_flight, None);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_generate_reverts_and_notifies() {
        let api = Arc::new(FakeContent::failing(VintelError::server(
            500,
            "Generation failed",
        )));
        let dashboard = dashboard(api);

        let err = dashboard.generate(ContentModuleType::Faq).await.unwrap_err();
        assert!(err.is_server());

        let entry = dashboard.module(ContentModuleType::Faq).await;
        assert_eq!(entry.status, ContentStatus::NotGenerated);
        let notifications = dashboard.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].message,
            "Failed to generate FAQ Pages. Generation failed"
        );
    }

    #[tokio::test]
    async fn test_invalid_transition_sends_nothing() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api.clone());

        let err = dashboard.view(ContentModuleType::LocalSeo).await.unwrap_err();
        assert!(matches!(err, VintelError::InvalidTransition { .. }));
        let err = dashboard
            .delete(ContentModuleType::LocalSeo, &AssumeYes)
            .await
            .unwrap_err();
        assert!(matches!(err, VintelError::InvalidTransition { .. }));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api.clone());
        dashboard.load_all().await;
        let loaded = api.calls.load(Ordering::SeqCst);

        assert!(!dashboard
            .delete(ContentModuleType::VoiceSearch, &Decline)
            .await
            .unwrap());
        assert_eq!(api.calls.load(Ordering::SeqCst), loaded);
        assert_eq!(
            dashboard.module(ContentModuleType::VoiceSearch).await.status,
            ContentStatus::Generated
        );
    }

    #[tokio::test]
    async fn test_confirmed_delete_and_failed_delete() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api.clone());
        dashboard.load_all().await;

        assert!(dashboard
            .delete(ContentModuleType::Faq, &AssumeYes)
            .await
            .unwrap());
        assert_eq!(
            dashboard.module(ContentModuleType::Faq).await.status,
            ContentStatus::NotGenerated
        );

        *api.fail_with.lock().unwrap() = Some(VintelError::network("timeout"));
        dashboard
            .delete(ContentModuleType::KnowledgeBase, &AssumeYes)
            .await
            .unwrap_err();
        assert_eq!(
            dashboard.module(ContentModuleType::KnowledgeBase).await.status,
            ContentStatus::Generated
        );
    }

    #[tokio::test]
    async fn test_view_and_download_after_load() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api);
        dashboard.load_all().await;

        let doc = dashboard.view(ContentModuleType::Faq).await.unwrap();
        assert_eq!(doc.title, "Roofing FAQ");
        let file = dashboard.download(ContentModuleType::Faq).await.unwrap();
        assert_eq!(file.file_name, "faq.md");
        assert_eq!(
            dashboard.module(ContentModuleType::Faq).await.status,
            ContentStatus::Generated
        );
    }

    #[tokio::test]
    async fn test_superseded_response_is_ignored() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api);
        dashboard.load_all().await;

        let first = dashboard
            .begin(ContentModuleType::Faq, ContentAction::View)
            .await
            .unwrap();
        let second = dashboard
            .begin(ContentModuleType::Faq, ContentAction::View)
            .await
            .unwrap();

        let late = dashboard
            .finish(
                ContentModuleType::Faq,
                first,
                Err::<(), _>(VintelError::network("late")),
                |_, _| None,
            )
            .await;
        assert_eq!(late.unwrap_err(), VintelError::Cancelled);
        assert!(dashboard.notifications().await.is_empty());

        dashboard
            .finish(ContentModuleType::Faq, second, Ok(()), |_, _| None)
            .await
            .unwrap();
        let entry = dashboard.module(ContentModuleType::Faq).await;
        assert_eq!(entry.status, ContentStatus::Generated);
        assert_eq!(entry.in_flight, None);
    }

    #[tokio::test]
    async fn test_failed_status_read_does_not_strand_generate() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api.clone());

        let pending = dashboard
            .begin(ContentModuleType::Faq, ContentAction::Generate)
            .await
            .unwrap();
        *api.fail_with.lock().unwrap() = Some(VintelError::network("timeout"));
        dashboard
            .refresh_status(ContentModuleType::Faq)
            .await
            .unwrap_err();
        assert_eq!(
            dashboard.module(ContentModuleType::Faq).await.status,
            ContentStatus::Generating
        );

        dashboard
            .finish(
                ContentModuleType::Faq,
                pending,
                Err::<ContentModuleStatus, _>(VintelError::server(500, "Generation failed")),
                |_, _| None,
            )
            .await
            .unwrap_err();
        let entry = dashboard.module(ContentModuleType::Faq).await;
        assert_eq!(entry.status, ContentStatus::NotGenerated);
        assert_eq!(entry.in_flight, None);

        // The module accepts a new generate afterwards.
        *api.fail_with.lock().unwrap() = None;
        dashboard.generate(ContentModuleType::Faq).await.unwrap();
        assert_eq!(
            dashboard.module(ContentModuleType::Faq).await.status,
            ContentStatus::Generated
        );
    }

    #[tokio::test]
    async fn test_status_read_during_generate_leaves_it_in_flight() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api);

        let pending = dashboard
            .begin(ContentModuleType::LocalSeo, ContentAction::Generate)
            .await
            .unwrap();
        dashboard
            .refresh_status(ContentModuleType::LocalSeo)
            .await
            .unwrap();
        let entry = dashboard.module(ContentModuleType::LocalSeo).await;
        assert_eq!(entry.status, ContentStatus::Generating);
        assert_eq!(entry.in_flight, Some(ContentAction::Generate));

        let status = ContentModuleStatus {
            module_type: ContentModuleType::LocalSeo,
            status: ContentStatus::Generated,
            generated_at_utc: Some(t0()),
        };
        dashboard
            .finish(ContentModuleType::LocalSeo, pending, Ok(status), |_, _| None)
            .await
            .unwrap();
        let entry = dashboard.module(ContentModuleType::LocalSeo).await;
        assert_eq!(entry.status, ContentStatus::Generated);
        assert_eq!(entry.in_flight, None);
    }

    #[tokio::test]
    async fn test_no_generate_while_delete_is_in_flight() {
        let api = Arc::new(FakeContent::default());
        let dashboard = dashboard(api);
        dashboard.load_all().await;

        let _pending = dashboard
            .begin(ContentModuleType::Faq, ContentAction::Delete)
            .await
            .unwrap();
        let err = dashboard.generate(ContentModuleType::Faq).await.unwrap_err();
        assert!(matches!(err, VintelError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_dismiss_removes_a_notification() {
        let api = Arc::new(FakeContent::failing(VintelError::server(500, "Down")));
        let dashboard = dashboard(api);
        dashboard.generate(ContentModuleType::Faq).await.unwrap_err();

        let id = dashboard.notifications().await[0].id.clone();
        assert!(dashboard.dismiss(&id).await);
        assert!(!dashboard.dismiss(&id).await);
        assert!(dashboard.notifications().await.is_empty());
    }
}
