use crate::{CacheEntry, SelectedVideo, VideoDetected};
use serde::{Deserialize, Serialize};
use video_summarizer::{SummaryMode, SummaryResponse};

/// Messages accepted by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Fire-and-forget notification from the page detector.
    #[serde(rename_all = "camelCase")]
    VideoDetected {
        video_id: String,
        url: String,
        title: String,
    },
    GetCurrentVideo,
    GetCachedSummary {
        url: String,
    },
    CacheSummary {
        url: String,
        summary: String,
        mode: SummaryMode,
    },
    /// `mode` is a loose flag: `"SHORT"` selects the short summary, anything
    /// else (or nothing) the full one.
    SummarizeVideo {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
}

impl Message {
    pub fn summarize(url: impl Into<String>, mode: SummaryMode) -> Self {
        Self::SummarizeVideo {
            url: url.into(),
            mode: mode.is_short().then(|| mode.to_string()),
        }
    }

    /// Whether the sender waits for a reply.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Self::VideoDetected { .. })
    }

    /// Parse a message, returning `None` for unknown or malformed ones.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

impl From<VideoDetected> for Message {
    fn from(detected: VideoDetected) -> Self {
        Self::VideoDetected {
            video_id: detected.video_id,
            url: detected.url,
            title: detected.title,
        }
    }
}

/// Outcome of a `SUMMARIZE_VIDEO` request as it crosses the channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SummarizeReply {
    Success(SummaryResponse),
    Failure { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
}

/// Replies, serialized the way the message surface expects them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Response {
    CurrentVideo(Option<SelectedVideo>),
    CachedSummary(Option<CacheEntry>),
    Ack(Ack),
    Summarize(SummarizeReply),
}
