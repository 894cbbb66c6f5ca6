use crate::BoxedError;
use async_trait::async_trait;

pub type TabId = i64;

/// A small indicator drawn over the extension icon for one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub color: String,
}

impl Badge {
    /// Shown on the tab a video was picked from.
    #[must_use]
    pub fn ready() -> Self {
        Self {
            text: "✓".to_string(),
            color: "#28a745".to_string(),
        }
    }
}

/// A system notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub icon_url: String,
}

impl Notification {
    /// Posted when the popup could not be opened on the user's behalf.
    #[must_use]
    pub fn video_ready() -> Self {
        Self {
            title: "YouTube Video Ready".to_string(),
            message: "Click the extension icon to summarize this video!".to_string(),
            icon_url: "icons/icon48.svg".to_string(),
        }
    }
}

/// The browser-provided UI surface. Every call may fail; callers decide
/// whether a failure matters.
#[async_trait]
pub trait HostUi: Send + Sync {
    async fn set_badge(&self, tab_id: TabId, badge: Badge) -> Result<(), BoxedError>;
    /// Hosts may refuse, e.g. without a user gesture.
    async fn open_popup(&self) -> Result<(), BoxedError>;
    async fn notify(&self, notification: Notification) -> Result<(), BoxedError>;
    /// URL of the active tab in the current window, if any.
    async fn active_tab_url(&self) -> Result<Option<String>, BoxedError>;
}
