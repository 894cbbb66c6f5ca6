use async_trait::async_trait;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use video_summarizer::google::{GeminiSummarizer, GeminiSummarizerOptions};
use video_summary_extension::{
    spawn_coordinator, Badge, BoxedError, ContextMenuClick, Coordinator, CoordinatorParams,
    HostUi, MemorySettingsStore, Notification, PopupConfig, PopupController, PopupState, TabId,
};

/// A host without a browser: UI calls are printed.
struct TerminalHost;

#[async_trait]
impl HostUi for TerminalHost {
    async fn set_badge(&self, tab_id: TabId, badge: Badge) -> Result<(), BoxedError> {
        println!("[tab {tab_id}] badge {} ({})", badge.text, badge.color);
        Ok(())
    }

    async fn open_popup(&self) -> Result<(), BoxedError> {
        Err("no popup outside a browser".into())
    }

    async fn notify(&self, notification: Notification) -> Result<(), BoxedError> {
        println!("{}: {}", notification.title, notification.message);
        Ok(())
    }

    async fn active_tab_url(&self) -> Result<Option<String>, BoxedError> {
        Ok(None)
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string());
    let api_key =
        std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY environment variable must be set");

    let settings = Arc::new(MemorySettingsStore::with_api_key(api_key));
    let host = Arc::new(TerminalHost);
    let coordinator = Arc::new(Coordinator::new(CoordinatorParams::new(
        Arc::new(GeminiSummarizer::new(GeminiSummarizerOptions::default())),
        settings.clone(),
        host.clone(),
    )));
    let (handle, _task) = spawn_coordinator(coordinator);

    handle
        .context_menu_clicked(ContextMenuClick::on_link(url, 1))
        .unwrap();

    let mut popup =
        PopupController::new(Arc::new(handle), host, settings, PopupConfig::default());
    popup.open().await;

    match popup.state() {
        PopupState::ShowingSummary(summary) => println!("{summary}"),
        PopupState::ShowingError(error) => eprintln!("error: {error}"),
        other => println!("{other:?}"),
    }
}
