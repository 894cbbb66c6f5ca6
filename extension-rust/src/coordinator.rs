use crate::{
    clock::{Clock, SystemClock},
    messages::{Ack, Message, Response, SummarizeReply},
    video_url::{extract_video_id, CONTEXT_MENU},
    Badge, CacheEntry, ExtensionError, ExtensionResult, HostUi, Notification, SelectedVideo,
    SelectionSource, SettingsStore, TabId, VideoDetected,
};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, sync::Arc, sync::Mutex};
use tracing::{debug, info, warn};
use video_summarizer::{SummarizeError, Summarizer, Summary, SummaryInput, SummaryMode};

/// A click on the extension's context-menu entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextMenuClick {
    pub menu_item_id: String,
    pub link_url: Option<String>,
    pub page_url: Option<String>,
    pub tab_id: Option<TabId>,
}

impl ContextMenuClick {
    /// A click on our entry over a link.
    pub fn on_link(link_url: impl Into<String>, tab_id: TabId) -> Self {
        Self {
            menu_item_id: CONTEXT_MENU.id.to_string(),
            link_url: Some(link_url.into()),
            page_url: None,
            tab_id: Some(tab_id),
        }
    }
}

#[derive(Default)]
struct CoordinatorState {
    selection: Option<SelectedVideo>,
    cache: HashMap<String, CacheEntry>,
}

/// Dependencies of a [`Coordinator`].
/// # Default Values
/// - `clock`: `SystemClock`
pub struct CoordinatorParams {
    pub summarizer: Arc<dyn Summarizer>,
    pub settings: Arc<dyn SettingsStore>,
    pub host: Arc<dyn HostUi>,
    pub clock: Arc<dyn Clock>,
}

impl CoordinatorParams {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        settings: Arc<dyn SettingsStore>,
        host: Arc<dyn HostUi>,
    ) -> Self {
        Self {
            summarizer,
            settings,
            host,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// The long-lived background service. Owns the current selection and the
/// summary cache; neither survives a restart.
///
/// Selections are last-write-wins by arrival order regardless of source.
/// Every write is stamped strictly later than the previous one so that
/// pollers comparing `selected_at` observe each write as new.
pub struct Coordinator {
    state: Mutex<CoordinatorState>,
    summarizer: Arc<dyn Summarizer>,
    settings: Arc<dyn SettingsStore>,
    host: Arc<dyn HostUi>,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    #[must_use]
    pub fn new(params: CoordinatorParams) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::default()),
            summarizer: params.summarizer,
            settings: params.settings,
            host: params.host,
            clock: params.clock,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CoordinatorState> {
        self.state.lock().expect("coordinator state poisoned")
    }

    fn select(
        &self,
        video_id: String,
        url: String,
        title: String,
        source: SelectionSource,
    ) -> SelectedVideo {
        let mut state = self.lock();
        let selected_at = next_stamp(
            self.clock.now(),
            state.selection.as_ref().map(|selection| selection.selected_at),
        );
        let selection = SelectedVideo {
            video_id,
            url,
            title,
            source,
            selected_at,
        };
        state.selection = Some(selection.clone());
        selection
    }

    /// Record a video seen by a page detector. Always overwrites.
    pub fn notify_detected(&self, detected: VideoDetected) -> SelectedVideo {
        let selection = self.select(
            detected.video_id,
            detected.url,
            detected.title,
            SelectionSource::PageDetection,
        );
        info!(video_id = %selection.video_id, url = %selection.url, "video detected on page");
        selection
    }

    /// Select the clicked video without touching any UI. Returns `None` when
    /// the click is not ours or the link is not a recognized video URL.
    pub fn select_from_context_menu(&self, click: &ContextMenuClick) -> Option<SelectedVideo> {
        if click.menu_item_id != CONTEXT_MENU.id {
            return None;
        }
        let link_url = click.link_url.as_deref()?;
        let Some(video_id) = extract_video_id(link_url) else {
            warn!(link_url, "could not extract a video id from context menu link");
            return None;
        };

        let selection = self.select(
            video_id.clone(),
            link_url.to_string(),
            format!("YouTube Video: {video_id}"),
            SelectionSource::ContextMenu,
        );
        info!(video_id = %selection.video_id, url = %selection.url, "video selected from context menu");
        Some(selection)
    }

    /// Mark the originating tab and try to bring up the popup, falling back
    /// to a notification. Never fails; UI errors are logged.
    pub async fn surface_selection(&self, tab_id: Option<TabId>) {
        if let Some(tab_id) = tab_id {
            if let Err(error) = self.host.set_badge(tab_id, Badge::ready()).await {
                warn!(tab_id, %error, "failed to set badge");
            }
        }

        match self.host.open_popup().await {
            Ok(()) => debug!("popup opened"),
            Err(error) => {
                debug!(%error, "openPopup refused, posting notification instead");
                if let Err(error) = self.host.notify(Notification::video_ready()).await {
                    warn!(%error, "failed to post notification");
                }
            }
        }
    }

    /// Handle a context-menu click end to end.
    pub async fn context_menu_activated(&self, click: ContextMenuClick) -> Option<SelectedVideo> {
        let selection = self.select_from_context_menu(&click)?;
        self.surface_selection(click.tab_id).await;
        Some(selection)
    }

    #[must_use]
    pub fn current_video(&self) -> Option<SelectedVideo> {
        self.lock().selection.clone()
    }

    /// Exact-string lookup.
    #[must_use]
    pub fn cached_summary(&self, url: &str) -> Option<CacheEntry> {
        self.lock().cache.get(url).cloned()
    }

    /// Insert or fully replace the entry for `url`.
    pub fn cache_summary(&self, url: &str, summary_text: String, mode: SummaryMode) -> CacheEntry {
        let entry = CacheEntry {
            summary_text,
            mode,
            cached_at: self.clock.now(),
        };
        debug!(%url, %mode, "caching summary");
        self.lock().cache.insert(url.to_string(), entry.clone());
        entry
    }

    /// Summarize `url`, caching the result on success. Concurrent calls for
    /// the same URL run independently; the last to finish owns the cache
    /// entry.
    pub async fn summarize(&self, url: &str, mode: SummaryMode) -> ExtensionResult<Summary> {
        let api_key = self
            .settings
            .api_key()
            .await?
            .ok_or(SummarizeError::MissingApiKey)?;

        let summary = self
            .summarizer
            .summarize(SummaryInput::new(url, mode, api_key))
            .await?;

        self.cache_summary(url, summary.text.clone(), mode);
        Ok(summary)
    }

    /// Dispatch one message. Returns `None` for messages that take no reply.
    pub async fn handle(&self, message: Message) -> Option<Response> {
        match message {
            Message::VideoDetected {
                video_id,
                url,
                title,
            } => {
                self.notify_detected(VideoDetected {
                    video_id,
                    url,
                    title,
                });
                None
            }
            Message::GetCurrentVideo => Some(Response::CurrentVideo(self.current_video())),
            Message::GetCachedSummary { url } => {
                Some(Response::CachedSummary(self.cached_summary(&url)))
            }
            Message::CacheSummary { url, summary, mode } => {
                self.cache_summary(&url, summary, mode);
                Some(Response::Ack(Ack { success: true }))
            }
            Message::SummarizeVideo { url, mode } => {
                let mode = SummaryMode::from_flag(mode.as_deref());
                let reply = match self.summarize(&url, mode).await {
                    Ok(summary) => SummarizeReply::Success(summary.into()),
                    Err(error) => {
                        warn!(%url, %error, "summarization failed");
                        error.into()
                    }
                };
                Some(Response::Summarize(reply))
            }
        }
    }

    /// Drop all state, as happens when the host restarts the background
    /// process.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.selection = None;
        state.cache.clear();
    }
}

impl From<ExtensionError> for SummarizeReply {
    fn from(error: ExtensionError) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }
}

fn next_stamp(now: DateTime<Utc>, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match previous {
        Some(previous) if now <= previous => previous + chrono::Duration::milliseconds(1),
        _ => now,
    }
}
