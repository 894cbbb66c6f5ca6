use crate::{
    Summary, SummaryInput, SummaryMode, SummarizeResult, MAX_OUTPUT_TOKENS, TEMPERATURE,
    THINKING_BUDGET,
};
use opentelemetry::trace::Status;
use std::time::Instant;
use tracing::{info_span, Span};
use tracing_futures::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub struct SummarySpan {
    span: Span,
    mode: SummaryMode,
    attempts: Option<u32>,
    start_time: Instant,
}

impl SummarySpan {
    pub fn new(provider: &str, model_id: &str, input: &SummaryInput) -> Self {
        let span = info_span!("video_summarizer.summarize", video_url = %input.video_url);
        span.set_attribute("gen_ai.operation.name", "generate_content");
        span.set_attribute("gen_ai.provider.name", provider.to_string());
        span.set_attribute("gen_ai.request.model", model_id.to_string());

        Self {
            span,
            mode: input.mode,
            attempts: None,
            start_time: Instant::now(),
        }
    }

    fn span(&self) -> Span {
        self.span.clone()
    }

    pub async fn instrument_future<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        future.instrument(self.span()).await
    }

    pub fn on_summary(&mut self, summary: &Summary) {
        self.attempts = Some(summary.attempts);
        self.span.set_attribute(
            "video_summarizer.summary_chars",
            i64::try_from(summary.text.len()).unwrap_or(i64::MAX),
        );
    }

    pub fn on_error(&mut self, error: &(dyn std::error::Error + 'static)) {
        self.span
            .set_attribute("exception.message", error.to_string());
        self.span.set_status(Status::error(error.to_string()));
    }

    pub fn on_end(&mut self) {
        self.span
            .set_attribute("video_summarizer.mode", self.mode.to_string());
        self.span
            .set_attribute("gen_ai.request.temperature", TEMPERATURE);
        self.span
            .set_attribute("gen_ai.request.max_tokens", i64::from(MAX_OUTPUT_TOKENS));
        self.span
            .set_attribute("video_summarizer.thinking_budget", i64::from(THINKING_BUDGET));
        if let Some(attempts) = self.attempts {
            self.span
                .set_attribute("video_summarizer.attempts", i64::from(attempts));
        }
        self.span.set_attribute(
            "video_summarizer.duration_seconds",
            self.start_time.elapsed().as_secs_f64(),
        );
    }
}

/// Runs one summarization inside a `video_summarizer.summarize` span.
pub async fn trace_summarize<F, Fut>(
    provider: &str,
    model_id: &str,
    input: SummaryInput,
    f: F,
) -> SummarizeResult<Summary>
where
    F: FnOnce(SummaryInput) -> Fut,
    Fut: std::future::Future<Output = SummarizeResult<Summary>>,
{
    let mut span = SummarySpan::new(provider, model_id, &input);
    let result = span.instrument_future(f(input)).await;

    match &result {
        Ok(summary) => span.on_summary(summary),
        Err(error) => span.on_error(error),
    }

    span.on_end();
    result
}
