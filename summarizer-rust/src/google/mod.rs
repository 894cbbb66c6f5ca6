mod api;
mod model;

pub use api::*;
pub use model::{GeminiSummarizer, GeminiSummarizerOptions, DEFAULT_BASE_URL, DEFAULT_MODEL_ID};
