use crate::{
    coordinator::{ContextMenuClick, Coordinator},
    messages::{Message, Response, SummarizeReply},
    CacheEntry, ExtensionError, ExtensionResult, SelectedVideo,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};
use video_summarizer::SummaryMode;

enum Envelope {
    Message {
        message: Message,
        reply: Option<oneshot::Sender<Option<Response>>>,
    },
    ContextMenu(ContextMenuClick),
}

/// Cloneable sender side of a running coordinator. Messages are delivered
/// in the order they were sent.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::UnboundedSender<Envelope>,
}

/// Run `coordinator` on its own task. The task ends once every handle has
/// been dropped.
///
/// Summarize requests and context-menu UI work are spawned onto separate
/// tasks so a slow upstream never holds up other messages. State changes
/// still happen in arrival order.
pub fn spawn_coordinator(coordinator: Arc<Coordinator>) -> (CoordinatorHandle, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel::<Envelope>();

    let task = tokio::spawn(async move {
        while let Some(envelope) = receiver.recv().await {
            match envelope {
                Envelope::Message {
                    message: message @ Message::SummarizeVideo { .. },
                    reply,
                } => {
                    let coordinator = coordinator.clone();
                    tokio::spawn(async move {
                        let response = coordinator.handle(message).await;
                        respond(reply, response);
                    });
                }
                Envelope::Message { message, reply } => {
                    let response = coordinator.handle(message).await;
                    respond(reply, response);
                }
                Envelope::ContextMenu(click) => {
                    if coordinator.select_from_context_menu(&click).is_some() {
                        let coordinator = coordinator.clone();
                        tokio::spawn(async move {
                            coordinator.surface_selection(click.tab_id).await;
                        });
                    }
                }
            }
        }
        debug!("coordinator channel closed");
    });

    (CoordinatorHandle { sender }, task)
}

fn respond(reply: Option<oneshot::Sender<Option<Response>>>, response: Option<Response>) {
    if let Some(reply) = reply {
        if reply.send(response).is_err() {
            debug!("requester went away before the reply was ready");
        }
    }
}

impl CoordinatorHandle {
    /// Fire-and-forget. Fails only if the coordinator is gone.
    pub fn send(&self, message: Message) -> ExtensionResult<()> {
        self.sender
            .send(Envelope::Message {
                message,
                reply: None,
            })
            .map_err(|_| ExtensionError::CoordinatorUnavailable)
    }

    /// Send and wait for the reply. Messages that take no reply resolve to
    /// `None`.
    pub async fn request(&self, message: Message) -> ExtensionResult<Option<Response>> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(Envelope::Message {
                message,
                reply: Some(reply),
            })
            .map_err(|_| ExtensionError::CoordinatorUnavailable)?;
        receiver
            .await
            .map_err(|_| ExtensionError::CoordinatorUnavailable)
    }

    pub fn context_menu_clicked(&self, click: ContextMenuClick) -> ExtensionResult<()> {
        self.sender
            .send(Envelope::ContextMenu(click))
            .map_err(|_| ExtensionError::CoordinatorUnavailable)
    }
}

/// Where fire-and-forget notifications go.
pub trait MessageSink: Send + Sync {
    fn send(&self, message: Message) -> ExtensionResult<()>;
}

impl MessageSink for CoordinatorHandle {
    fn send(&self, message: Message) -> ExtensionResult<()> {
        Self::send(self, message)
    }
}

/// The coordinator operations the popup relies on.
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    async fn current_video(&self) -> ExtensionResult<Option<SelectedVideo>>;
    async fn cached_summary(&self, url: &str) -> ExtensionResult<Option<CacheEntry>>;
    async fn cache_summary(&self, url: &str, summary: &str, mode: SummaryMode)
        -> ExtensionResult<()>;
    async fn summarize(&self, url: &str, mode: SummaryMode) -> ExtensionResult<SummarizeReply>;
}

#[async_trait]
impl CoordinatorClient for CoordinatorHandle {
    async fn current_video(&self) -> ExtensionResult<Option<SelectedVideo>> {
        match self.request(Message::GetCurrentVideo).await? {
            Some(Response::CurrentVideo(video)) => Ok(video),
            _ => Err(ExtensionError::UnexpectedResponse),
        }
    }

    async fn cached_summary(&self, url: &str) -> ExtensionResult<Option<CacheEntry>> {
        let message = Message::GetCachedSummary {
            url: url.to_string(),
        };
        match self.request(message).await? {
            Some(Response::CachedSummary(entry)) => Ok(entry),
            _ => Err(ExtensionError::UnexpectedResponse),
        }
    }

    async fn cache_summary(
        &self,
        url: &str,
        summary: &str,
        mode: SummaryMode,
    ) -> ExtensionResult<()> {
        let message = Message::CacheSummary {
            url: url.to_string(),
            summary: summary.to_string(),
            mode,
        };
        match self.request(message).await? {
            Some(Response::Ack(ack)) if ack.success => Ok(()),
            other => {
                warn!(?other, "cache write was not acknowledged");
                Err(ExtensionError::UnexpectedResponse)
            }
        }
    }

    async fn summarize(&self, url: &str, mode: SummaryMode) -> ExtensionResult<SummarizeReply> {
        match self.request(Message::summarize(url, mode)).await? {
            Some(Response::Summarize(reply)) => Ok(reply),
            _ => Err(ExtensionError::UnexpectedResponse),
        }
    }
}
