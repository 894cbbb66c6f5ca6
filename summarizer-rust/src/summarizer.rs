use crate::{Summary, SummaryInput, SummarizeResult};

/// Anything that can turn a video reference into a summary.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    fn provider(&self) -> &'static str;
    fn model_id(&self) -> String;
    async fn summarize(&self, input: SummaryInput) -> SummarizeResult<Summary>;
}
