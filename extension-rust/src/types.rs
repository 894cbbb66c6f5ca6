use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use video_summarizer::SummaryMode;

/// Where the current selection came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SelectionSource {
    /// An explicit right-click on a video link or page.
    ContextMenu,
    /// Passive detection of navigation on the video site.
    PageDetection,
}

/// The single video currently of interest. Replaced wholesale on every new
/// selection, never merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVideo {
    pub video_id: String,
    pub url: String,
    pub title: String,
    pub source: SelectionSource,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub selected_at: DateTime<Utc>,
}

impl SelectedVideo {
    #[must_use]
    pub fn is_from_context_menu(&self) -> bool {
        self.source == SelectionSource::ContextMenu
    }
}

/// A summary remembered for a video URL (exact string key).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub summary_text: String,
    pub mode: SummaryMode,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub cached_at: DateTime<Utc>,
}

/// What the page detector reports for a newly seen video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetected {
    pub video_id: String,
    pub url: String,
    pub title: String,
}
