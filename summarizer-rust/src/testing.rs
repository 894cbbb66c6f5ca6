use std::{collections::VecDeque, sync::Mutex, time::Duration};

use crate::{Summarizer, Summary, SummaryInput, SummarizeError, SummarizeResult};

/// Result for a mocked `summarize` call.
pub enum MockSummarizeResult {
    Summary(Summary),
    Error(SummarizeError),
}

impl MockSummarizeResult {
    /// Construct a result that yields a summary produced on the first attempt.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Summary(Summary {
            text: text.into(),
            attempts: 1,
        })
    }

    /// Construct a result that yields the provided error.
    pub fn error(error: SummarizeError) -> Self {
        Self::Error(error)
    }
}

impl From<Summary> for MockSummarizeResult {
    fn from(summary: Summary) -> Self {
        Self::Summary(summary)
    }
}

impl From<SummarizeError> for MockSummarizeResult {
    fn from(error: SummarizeError) -> Self {
        Self::Error(error)
    }
}

impl From<&str> for MockSummarizeResult {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

#[derive(Default)]
struct MockSummarizerState {
    mocked_results: VecDeque<MockSummarizeResult>,
    tracked_inputs: Vec<SummaryInput>,
}

/// A summarizer for tests that records its inputs and replays queued results
/// in order.
pub struct MockSummarizer {
    provider: &'static str,
    model_id: String,
    latency: Option<Duration>,
    state: Mutex<MockSummarizerState>,
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self {
            provider: "mock",
            model_id: "mock-model".to_string(),
            latency: None,
            state: Mutex::new(MockSummarizerState::default()),
        }
    }
}

impl MockSummarizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call take `latency` before resolving.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Convenience to enqueue a single mocked result.
    pub fn enqueue<R>(&self, result: R) -> &Self
    where
        R: Into<MockSummarizeResult>,
    {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.push_back(result.into());
        drop(state);
        self
    }

    /// Retrieve the tracked inputs accumulated so far.
    pub fn tracked_inputs(&self) -> Vec<SummaryInput> {
        let state = self.state.lock().expect("mock state poisoned");
        state.tracked_inputs.clone()
    }

    /// Clear both tracked inputs and enqueued results.
    pub fn restore(&self) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.mocked_results.clear();
        state.tracked_inputs.clear();
    }
}

#[async_trait::async_trait]
impl Summarizer for MockSummarizer {
    fn provider(&self) -> &'static str {
        self.provider
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    async fn summarize(&self, input: SummaryInput) -> SummarizeResult<Summary> {
        let result = {
            let mut state = self.state.lock().expect("mock state poisoned");
            state.tracked_inputs.push(input);
            state.mocked_results.pop_front()
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = result.ok_or_else(|| {
            SummarizeError::InvalidInput("no mocked summarize results available".into())
        })?;

        match result {
            MockSummarizeResult::Summary(summary) => Ok(summary),
            MockSummarizeResult::Error(error) => Err(error),
        }
    }
}
