use super::api::{
    Content, ErrorResponse, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part, ThinkingConfig,
};
use crate::{
    client_utils, RetryPolicy, Sleeper, Summarizer, Summary, SummaryInput, SummaryMode,
    SummarizeError, SummarizeResult, TokioSleeper, MAX_OUTPUT_TOKENS, TEMPERATURE,
    THINKING_BUDGET, VIDEO_MIME_TYPE,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{debug, warn};

const PROVIDER: &str = "google";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

/// Summarizes videos with the Gemini `generateContent` endpoint, passing
/// the video URL as file data so the API fetches the media itself.
pub struct GeminiSummarizer {
    model_id: String,
    base_url: String,
    client: Client,
    headers: HashMap<String, String>,
    retry_policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    timeout: Option<Duration>,
}

/// # Default Values
/// - `base_url`: `DEFAULT_BASE_URL`
/// - `model_id`: `DEFAULT_MODEL_ID`
/// - `retry_policy`: `RetryPolicy::default()`
/// - `sleeper`: `TokioSleeper`
/// - `timeout`: `None`, the client's own default applies
#[derive(Clone, Default)]
pub struct GeminiSummarizerOptions {
    pub base_url: Option<String>,
    pub model_id: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
    pub retry_policy: Option<RetryPolicy>,
    pub sleeper: Option<Arc<dyn Sleeper>>,
    pub timeout: Option<Duration>,
}

impl GeminiSummarizer {
    #[must_use]
    pub fn new(options: GeminiSummarizerOptions) -> Self {
        let GeminiSummarizerOptions {
            base_url,
            model_id,
            headers,
            client,
            retry_policy,
            sleeper,
            timeout,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            model_id: model_id.unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            base_url,
            client: client.unwrap_or_else(Client::new),
            headers: headers.unwrap_or_default(),
            retry_policy: retry_policy.unwrap_or_default(),
            sleeper: sleeper.unwrap_or_else(|| Arc::new(TokioSleeper)),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_id)
    }

    fn request_headers(&self, api_key: &str) -> SummarizeResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
                SummarizeError::InvalidInput(format!("Invalid header name '{key}': {error}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                SummarizeError::InvalidInput(format!("Invalid header value for '{key}': {error}"))
            })?;
            headers.insert(header_name, header_value);
        }

        let mut api_key = HeaderValue::from_str(api_key).map_err(|error| {
            SummarizeError::InvalidInput(format!("Invalid API key: {error}"))
        })?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);

        Ok(headers)
    }

    /// Issue requests until one succeeds, fails terminally, or the retry
    /// budget is spent.
    async fn summarize_with_retry(&self, input: SummaryInput) -> SummarizeResult<Summary> {
        if input.api_key.trim().is_empty() {
            return Err(SummarizeError::MissingApiKey);
        }

        let params = build_request(&input.video_url, input.mode);
        let headers = self.request_headers(&input.api_key)?;
        let url = self.endpoint();

        let mut retry_count = 0;
        loop {
            debug!(
                video_url = %input.video_url,
                mode = %input.mode,
                retry_count,
                "sending video to Gemini"
            );

            let response = client_utils::post_json(
                &self.client,
                &url,
                &params,
                headers.clone(),
                self.timeout,
            )
            .await?;

            debug!(status = %response.status, "Gemini responded");

            if response.status.is_success() {
                let text = extract_summary_text(&response.body)?;
                return Ok(Summary {
                    text,
                    attempts: retry_count + 1,
                });
            }

            if self.retry_policy.should_retry(response.status, retry_count) {
                let delay = self.retry_policy.delay_for(retry_count);
                warn!(
                    status = %response.status,
                    attempt = retry_count + 1,
                    max_retries = self.retry_policy.max_retries,
                    delay_seconds = delay.as_secs_f64(),
                    "transient Gemini failure, retrying"
                );
                self.sleeper.sleep(delay).await;
                retry_count += 1;
                continue;
            }

            return Err(SummarizeError::Status {
                status: response.status,
                detail: ErrorResponse::detail_from_body(&response.body),
                retries_exhausted: self.retry_policy.is_retryable(response.status)
                    && retry_count >= self.retry_policy.max_retries
                    && retry_count > 0,
                retries: retry_count,
            });
        }
    }
}

#[async_trait::async_trait]
impl Summarizer for GeminiSummarizer {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    async fn summarize(&self, input: SummaryInput) -> SummarizeResult<Summary> {
        crate::opentelemetry::trace_summarize(
            self.provider(),
            &self.model_id(),
            input,
            |input| self.summarize_with_retry(input),
        )
        .await
    }
}

fn build_request(video_url: &str, mode: SummaryMode) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: Some(vec![
                Part::file(video_url, VIDEO_MIME_TYPE),
                Part::text(mode.prompt()),
            ]),
            role: None,
        }],
        generation_config: Some(GenerationConfig {
            temperature: Some(TEMPERATURE),
            max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            response_modalities: Some(vec!["TEXT".to_string()]),
            thinking_config: Some(ThinkingConfig {
                thinking_budget: Some(THINKING_BUDGET),
                include_thoughts: None,
            }),
        }),
    }
}

/// First candidate, first content part, trimmed text.
fn extract_summary_text(body: &str) -> SummarizeResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|error| SummarizeError::MalformedResponse(format!("{error}")))?;

    let content = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .ok_or_else(|| SummarizeError::MalformedResponse("no candidates found".to_string()))?;

    let part = content
        .parts
        .and_then(|parts| parts.into_iter().next())
        .ok_or_else(|| {
            SummarizeError::MalformedResponse("no content parts found".to_string())
        })?;

    let text = part.text.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(SummarizeError::EmptyContent);
    }

    Ok(text.to_string())
}
