use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizeError {
    /// No API key is configured. Never retried.
    #[error("Please configure your Gemini API key in settings")]
    MissingApiKey,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request never completed (connection, TLS, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered with a non-success status.
    /// `retries_exhausted` is set when the status was retryable but the
    /// retry budget ran out.
    #[error(
        "Gemini API error ({}){}: {detail}",
        .status.as_u16(),
        retry_marker(.retries_exhausted, .retries)
    )]
    Status {
        status: reqwest::StatusCode,
        detail: String,
        retries_exhausted: bool,
        retries: u32,
    },
    /// The response did not have the expected shape.
    #[error("Invalid response from Gemini API - {0}")]
    MalformedResponse(String),
    /// The first candidate carried no usable text.
    #[error("Gemini returned empty content")]
    EmptyContent,
}

impl SummarizeError {
    /// The HTTP status, for errors that carry one.
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn retry_marker(retries_exhausted: &bool, retries: &u32) -> String {
    if *retries_exhausted {
        format!(" (after {retries} retries)")
    } else {
        String::new()
    }
}

pub type SummarizeResult<T> = Result<T, SummarizeError>;
