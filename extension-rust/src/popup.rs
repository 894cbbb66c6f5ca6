use crate::{
    runtime::CoordinatorClient, video_url::is_watch_url, ExtensionError, ExtensionResult,
    HostUi, SelectedVideo, SettingsStore, SummarizeReply,
};
use chrono::{DateTime, Utc};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};
use video_summarizer::SummaryMode;

/// Progress shown while a summary is being produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingProgress {
    pub step: u8,
    pub percent: u8,
    pub message: String,
}

impl LoadingProgress {
    pub const TOTAL_STEPS: u8 = 5;

    fn new(step: u8, percent: u8, message: &str) -> Self {
        Self {
            step,
            percent,
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn step_label(&self) -> String {
        format!("Step {} of {}", self.step, Self::TOTAL_STEPS)
    }
}

/// Intermediate steps shown while waiting, one per progress interval.
fn progress_steps(mode: SummaryMode) -> [LoadingProgress; 3] {
    match mode {
        SummaryMode::Full => [
            LoadingProgress::new(1, 30, "Connecting to Gemini 2.5 Flash..."),
            LoadingProgress::new(2, 60, "Sending video for analysis..."),
            LoadingProgress::new(3, 90, "Processing summary... (may take up to 1 minute)"),
        ],
        SummaryMode::Short => [
            LoadingProgress::new(1, 30, "Connecting to Gemini 2.5 Flash..."),
            LoadingProgress::new(2, 60, "Creating short summary..."),
            LoadingProgress::new(3, 90, "Extracting key points... (may take up to 1 minute)"),
        ],
    }
}

fn completed_step(mode: SummaryMode) -> LoadingProgress {
    match mode {
        SummaryMode::Full => LoadingProgress::new(5, 100, "Summary complete!"),
        SummaryMode::Short => LoadingProgress::new(5, 100, "Short summary complete!"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupState {
    Default,
    Loading(LoadingProgress),
    ShowingSummary(String),
    ShowingError(String),
    /// The settings dialog, drawn over whatever was showing before.
    SettingsOpen(Box<PopupState>),
}

/// Everything a renderer needs to draw the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub state: PopupState,
    pub video: Option<SelectedVideo>,
    /// False once a short summary was produced in this session.
    pub short_summary_available: bool,
    pub api_key: String,
    pub default_short_mode: bool,
}

/// User actions, delivered to a running popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupCommand {
    Retry,
    NewShortSummary,
    OpenSettings,
    CloseSettings,
    SaveApiKey(String),
    SetDefaultShortMode(bool),
    Close,
}

/// # Default Values
/// - `poll_interval`: 1 second
/// - `progress_interval`: 500 ms
#[derive(Debug, Clone)]
pub struct PopupConfig {
    pub poll_interval: Duration,
    pub progress_interval: Duration,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            progress_interval: Duration::from_millis(500),
        }
    }
}

/// Pick the URL to summarize. A context-menu selection always wins. A
/// page-detected selection gives way to the active tab when that tab is
/// itself a watch page. With no selection the active tab is all there is.
#[must_use]
pub fn resolve_summary_url(
    selection: Option<&SelectedVideo>,
    active_tab_url: Option<&str>,
) -> Option<String> {
    match selection {
        None => active_tab_url.map(str::to_string),
        Some(selection) if selection.is_from_context_menu() => Some(selection.url.clone()),
        Some(selection) => Some(
            active_tab_url
                .filter(|url| is_watch_url(url))
                .map_or_else(|| selection.url.clone(), str::to_string),
        ),
    }
}

/// Lives for as long as the popup is open. Created fresh on every open.
pub struct PopupController {
    coordinator: Arc<dyn CoordinatorClient>,
    host: Arc<dyn HostUi>,
    settings: Arc<dyn SettingsStore>,
    config: PopupConfig,
    content: PopupState,
    settings_open: bool,
    video: Option<SelectedVideo>,
    last_seen_selected_at: Option<DateTime<Utc>>,
    short_summary_used: bool,
    api_key: String,
    default_short_mode: bool,
    view: watch::Sender<PopupView>,
}

impl PopupController {
    pub fn new(
        coordinator: Arc<dyn CoordinatorClient>,
        host: Arc<dyn HostUi>,
        settings: Arc<dyn SettingsStore>,
        config: PopupConfig,
    ) -> Self {
        let (view, _) = watch::channel(PopupView {
            state: PopupState::Default,
            video: None,
            short_summary_available: true,
            api_key: String::new(),
            default_short_mode: false,
        });

        Self {
            coordinator,
            host,
            settings,
            config,
            content: PopupState::Default,
            settings_open: false,
            video: None,
            last_seen_selected_at: None,
            short_summary_used: false,
            api_key: String::new(),
            default_short_mode: false,
            view,
        }
    }

    /// Receive every view change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PopupView> {
        self.view.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> PopupState {
        if self.settings_open {
            PopupState::SettingsOpen(Box::new(self.content.clone()))
        } else {
            self.content.clone()
        }
    }

    #[must_use]
    pub fn view(&self) -> PopupView {
        PopupView {
            state: self.state(),
            video: self.video.clone(),
            short_summary_available: !self.short_summary_used,
            api_key: self.api_key.clone(),
            default_short_mode: self.default_short_mode,
        }
    }

    #[must_use]
    pub fn video(&self) -> Option<&SelectedVideo> {
        self.video.as_ref()
    }

    /// The summary currently on screen, for copying.
    #[must_use]
    pub fn summary_text(&self) -> Option<&str> {
        match &self.content {
            PopupState::ShowingSummary(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn short_summary_available(&self) -> bool {
        !self.short_summary_used
    }

    fn publish(&self) {
        self.view.send_replace(self.view());
    }

    fn set_content(&mut self, content: PopupState) {
        self.content = content;
        self.publish();
    }

    /// Load settings and show whatever the coordinator has selected:
    /// a cached summary if there is one, otherwise start summarizing.
    pub async fn open(&mut self) {
        match self.settings.load().await {
            Ok(settings) => {
                self.api_key = settings.api_key.unwrap_or_default();
                self.default_short_mode = settings.default_short_mode;
            }
            Err(error) => warn!(%error, "failed to load settings"),
        }

        match self.coordinator.current_video().await {
            Ok(Some(video)) => self.show_selection(video).await,
            Ok(None) => self.set_content(PopupState::Default),
            Err(error) => {
                warn!(%error, "failed to query current video");
                self.set_content(PopupState::Default);
            }
        }
    }

    /// Check once for a newer selection. Returns whether one was found.
    pub async fn poll(&mut self) -> bool {
        let video = match self.coordinator.current_video().await {
            Ok(Some(video)) => video,
            Ok(None) => return false,
            Err(error) => {
                warn!(%error, "failed to poll current video");
                return false;
            }
        };

        let is_new = self
            .last_seen_selected_at
            .is_none_or(|last_seen| video.selected_at > last_seen);
        if is_new {
            info!(video_id = %video.video_id, "new selection while popup is open");
            self.show_selection(video).await;
        }
        is_new
    }

    async fn show_selection(&mut self, video: SelectedVideo) {
        self.last_seen_selected_at = Some(video.selected_at);
        let url = video.url.clone();
        self.video = Some(video);
        self.publish();

        match self.coordinator.cached_summary(&url).await {
            Ok(Some(entry)) => {
                debug!(%url, "showing cached summary");
                self.set_content(PopupState::ShowingSummary(entry.summary_text));
            }
            Ok(None) => self.start_summarization().await,
            Err(error) => {
                warn!(%url, %error, "failed to query summary cache");
                self.set_content(PopupState::Default);
            }
        }
    }

    /// The automatic flow, also bound to Retry. Runs a full summary unless
    /// the user prefers short ones.
    pub async fn start_summarization(&mut self) {
        let short = match self.settings.default_short_mode().await {
            Ok(short) => short,
            Err(error) => {
                warn!(%error, "failed to read short mode preference");
                false
            }
        };
        let mode = if short {
            SummaryMode::Short
        } else {
            SummaryMode::Full
        };
        self.run_summary(mode).await;
    }

    /// The "new short summary" action. Only available once per session.
    pub async fn start_short_summarization(&mut self) -> ExtensionResult<()> {
        if self.short_summary_used {
            return Err(ExtensionError::ShortSummaryUsed);
        }
        self.run_summary(SummaryMode::Short).await;
        Ok(())
    }

    async fn active_tab_url(&self) -> Option<String> {
        match self.host.active_tab_url().await {
            Ok(url) => url,
            Err(error) => {
                warn!(%error, "failed to read active tab url");
                None
            }
        }
    }

    async fn run_summary(&mut self, mode: SummaryMode) {
        let active_tab_url = self.active_tab_url().await;
        let Some(url) = resolve_summary_url(self.video.as_ref(), active_tab_url.as_deref())
        else {
            self.set_content(PopupState::ShowingError(
                ExtensionError::NoVideoUrl.to_string(),
            ));
            return;
        };
        info!(%url, %mode, "starting summarization");

        let [first, rest @ ..] = progress_steps(mode);
        self.set_content(PopupState::Loading(first));

        let coordinator = Arc::clone(&self.coordinator);
        let reply = coordinator.summarize(&url, mode);
        tokio::pin!(reply);

        let mut upcoming = rest.into_iter();
        let mut next_step = upcoming.next();
        let tick = time::sleep(self.config.progress_interval);
        tokio::pin!(tick);

        let outcome = loop {
            tokio::select! {
                outcome = &mut reply => break outcome,
                () = &mut tick, if next_step.is_some() => {
                    if let Some(step) = next_step.take() {
                        self.set_content(PopupState::Loading(step));
                    }
                    next_step = upcoming.next();
                    tick.as_mut().reset(Instant::now() + self.config.progress_interval);
                }
            }
        };

        match outcome {
            Ok(SummarizeReply::Success(response)) => {
                self.set_content(PopupState::Loading(completed_step(mode)));
                if let Err(error) = self
                    .coordinator
                    .cache_summary(&url, &response.summary, mode)
                    .await
                {
                    warn!(%url, %error, "failed to cache summary");
                }
                if mode.is_short() {
                    self.short_summary_used = true;
                }
                self.set_content(PopupState::ShowingSummary(response.summary));
            }
            Ok(SummarizeReply::Failure { error }) => {
                self.set_content(PopupState::ShowingError(error));
            }
            Err(error) => {
                self.set_content(PopupState::ShowingError(error.to_string()));
            }
        }
    }

    pub fn open_settings(&mut self) {
        self.settings_open = true;
        self.publish();
    }

    pub fn close_settings(&mut self) {
        self.settings_open = false;
        self.publish();
    }

    /// Persist the API key and close the dialog.
    pub async fn save_api_key(&mut self, api_key: String) -> ExtensionResult<()> {
        self.settings.set_api_key(api_key.clone()).await?;
        self.api_key = api_key;
        self.close_settings();
        Ok(())
    }

    pub async fn set_default_short_mode(&mut self, enabled: bool) -> ExtensionResult<()> {
        self.settings.set_default_short_mode(enabled).await?;
        self.default_short_mode = enabled;
        self.publish();
        Ok(())
    }

    /// Apply one user action. Returns `false` when the popup should close.
    pub async fn apply(&mut self, command: PopupCommand) -> bool {
        match command {
            PopupCommand::Retry => self.start_summarization().await,
            PopupCommand::NewShortSummary => {
                if let Err(error) = self.start_short_summarization().await {
                    debug!(%error, "short summary action ignored");
                }
            }
            PopupCommand::OpenSettings => self.open_settings(),
            PopupCommand::CloseSettings => self.close_settings(),
            PopupCommand::SaveApiKey(api_key) => {
                if let Err(error) = self.save_api_key(api_key).await {
                    warn!(%error, "failed to save api key");
                }
            }
            PopupCommand::SetDefaultShortMode(enabled) => {
                if let Err(error) = self.set_default_short_mode(enabled).await {
                    warn!(%error, "failed to save short mode preference");
                }
            }
            PopupCommand::Close => return false,
        }
        true
    }

    /// Open, then poll the coordinator and apply commands until closed.
    /// Closing the command channel closes the popup too.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PopupCommand>) {
        self.open().await;

        let mut poll = time::interval_at(
            Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.apply(command).await {
                        break;
                    }
                }
                _ = poll.tick() => {
                    self.poll().await;
                }
            }
        }

        debug!("popup closed");
    }
}
