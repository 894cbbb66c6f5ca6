use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error(transparent)]
    Summarize(#[from] video_summarizer::SummarizeError),
    #[error("No video URL found")]
    NoVideoUrl,
    #[error("Short summary already created for this session")]
    ShortSummaryUsed,
    #[error("Coordinator is not listening")]
    CoordinatorUnavailable,
    #[error("Unexpected response format")]
    UnexpectedResponse,
    #[error("Settings error: {0}")]
    Settings(#[source] BoxedError),
}

impl From<std::io::Error> for ExtensionError {
    fn from(error: std::io::Error) -> Self {
        Self::Settings(Box::new(error))
    }
}

impl From<serde_json::Error> for ExtensionError {
    fn from(error: serde_json::Error) -> Self {
        Self::Settings(Box::new(error))
    }
}

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

pub type ExtensionResult<T> = Result<T, ExtensionError>;
