use serde::{Deserialize, Serialize};
use std::fmt;

/// Which flavour of summary to produce.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SummaryMode {
    /// Headline points only.
    #[serde(rename = "SHORT")]
    Short,
    /// Four-part structured summary.
    #[default]
    #[serde(rename = "NORMAL", alias = "FULL")]
    Full,
}

impl SummaryMode {
    /// Interpret a loosely typed wire flag. Only `"SHORT"` selects the short
    /// mode; anything else, including no flag at all, is a full summary.
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("SHORT") => Self::Short,
            _ => Self::Full,
        }
    }

    #[must_use]
    pub fn is_short(self) -> bool {
        matches!(self, Self::Short)
    }

    /// The instruction sent alongside the video.
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Short => SHORT_PROMPT,
            Self::Full => FULL_PROMPT,
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => f.write_str("SHORT"),
            Self::Full => f.write_str("NORMAL"),
        }
    }
}

pub const SHORT_PROMPT: &str = "Provide a SHORT summary of this video with ONLY the most important information:\n\
• Main topic (1 sentence)\n\
• Top 3 key points (bullet points)\n\
• Most important conclusion or takeaway (1 sentence)\n\
\n\
Keep it concise and focused on only the essential information.";

pub const FULL_PROMPT: &str = "Provide a comprehensive summary of this video including:\n\
1. Main topic and key points\n\
2. Important insights or conclusions\n\
3. Any actionable takeaways\n\
4. Overall summary of the video's message";

/// Fixed generation parameters. Not user configurable.
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 8192;
pub const THINKING_BUDGET: i32 = 1024;
pub const VIDEO_MIME_TYPE: &str = "video/*";

/// One summarization request. The video is passed by reference; the
/// provider fetches it itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryInput {
    pub video_url: String,
    pub mode: SummaryMode,
    pub api_key: String,
}

impl SummaryInput {
    pub fn new(
        video_url: impl Into<String>,
        mode: SummaryMode,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            video_url: video_url.into(),
            mode,
            api_key: api_key.into(),
        }
    }
}

/// A successful summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Trimmed, non-empty summary text.
    pub text: String,
    /// Number of HTTP attempts it took, including the successful one.
    pub attempts: u32,
}

/// The success payload as it travels back over the message channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryResponse {
    pub success: bool,
    pub summary: String,
}

impl From<Summary> for SummaryResponse {
    fn from(summary: Summary) -> Self {
        Self {
            success: true,
            summary: summary.text,
        }
    }
}
