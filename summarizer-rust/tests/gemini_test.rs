use serde_json::json;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use video_summarizer::{
    google::{GeminiSummarizer, GeminiSummarizerOptions},
    Sleeper, SummarizeError, Summarizer, SummaryInput, SummaryMode,
};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ENDPOINT: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn summarizer(server: &MockServer, sleeper: Arc<RecordingSleeper>) -> GeminiSummarizer {
    GeminiSummarizer::new(GeminiSummarizerOptions {
        base_url: Some(format!("{}/v1beta", server.uri())),
        sleeper: Some(sleeper),
        ..Default::default()
    })
}

fn input(mode: SummaryMode) -> SummaryInput {
    SummaryInput::new(VIDEO_URL, mode, "test-key")
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "modelVersion": "gemini-2.5-flash"
    }))
}

fn unavailable() -> ResponseTemplate {
    ResponseTemplate::new(503).set_body_json(json!({
        "error": {
            "code": 503,
            "message": "The model is overloaded. Please try again later.",
            "status": "UNAVAILABLE"
        }
    }))
}

#[tokio::test]
async fn summarize_sends_video_reference_with_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "fileData": { "fileUri": VIDEO_URL, "mimeType": "video/*" } },
                    { "text": SummaryMode::Full.prompt() }
                ]
            }],
            "generationConfig": { "thinkingConfig": { "thinkingBudget": 1024 } }
        })))
        .respond_with(text_response("\n  A video about a song.  \n"))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let summary = summarizer(&server, sleeper.clone())
        .summarize(input(SummaryMode::Full))
        .await
        .expect("summarize succeeds");

    assert_eq!(summary.text, "A video about a song.");
    assert_eq!(summary.attempts, 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn short_mode_uses_short_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{}, { "text": SummaryMode::Short.prompt() }] }]
        })))
        .respond_with(text_response("• Topic"))
        .expect(1)
        .mount(&server)
        .await;

    let summary = summarizer(&server, Arc::new(RecordingSleeper::default()))
        .summarize(input(SummaryMode::Short))
        .await
        .expect("summarize succeeds");

    assert_eq!(summary.text, "• Topic");
}

#[tokio::test]
async fn retries_503_with_exponential_backoff_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(unavailable())
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(text_response("Third time lucky"))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let summary = summarizer(&server, sleeper.clone())
        .summarize(input(SummaryMode::Full))
        .await
        .expect("summarize succeeds after retries");

    assert_eq!(summary.text, "Third time lucky");
    assert_eq!(summary.attempts, 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn persistent_503_fails_after_three_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(unavailable())
        .expect(4)
        .mount(&server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let error = summarizer(&server, sleeper.clone())
        .summarize(input(SummaryMode::Full))
        .await
        .expect_err("summarize fails");

    assert_eq!(
        error.to_string(),
        "Gemini API error (503) (after 3 retries): The model is overloaded. Please try again later."
    );
    assert!(matches!(
        error,
        SummarizeError::Status {
            retries_exhausted: true,
            retries: 3,
            ..
        }
    ));
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[tokio::test]
async fn other_statuses_fail_without_retry() {
    for status in [400_u16, 403, 429, 500] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "code": status, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = Arc::new(RecordingSleeper::default());
        let error = summarizer(&server, sleeper.clone())
            .summarize(input(SummaryMode::Full))
            .await
            .expect_err("summarize fails");

        assert_eq!(
            error.to_string(),
            format!("Gemini API error ({status}): API key not valid.")
        );
        assert_eq!(error.status().map(|s| s.as_u16()), Some(status));
        assert!(sleeper.delays().is_empty());
    }
}

#[tokio::test]
async fn non_json_error_body_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .mount(&server)
        .await;

    let error = summarizer(&server, Arc::new(RecordingSleeper::default()))
        .summarize(input(SummaryMode::Full))
        .await
        .expect_err("summarize fails");

    assert_eq!(error.to_string(), "Gemini API error (502): Bad gateway");
}

#[tokio::test]
async fn empty_candidates_is_a_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let error = summarizer(&server, Arc::new(RecordingSleeper::default()))
        .summarize(input(SummaryMode::Full))
        .await
        .expect_err("summarize fails");

    assert_eq!(
        error.to_string(),
        "Invalid response from Gemini API - no candidates found"
    );
}

#[tokio::test]
async fn blank_text_is_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(text_response("   \n  "))
        .mount(&server)
        .await;

    let error = summarizer(&server, Arc::new(RecordingSleeper::default()))
        .summarize(input(SummaryMode::Full))
        .await
        .expect_err("summarize fails");

    assert!(matches!(error, SummarizeError::EmptyContent));
    assert_eq!(error.to_string(), "Gemini returned empty content");
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let error = summarizer(&server, Arc::new(RecordingSleeper::default()))
        .summarize(SummaryInput::new(VIDEO_URL, SummaryMode::Full, ""))
        .await
        .expect_err("summarize fails");

    assert!(matches!(error, SummarizeError::MissingApiKey));
    assert_eq!(
        error.to_string(),
        "Please configure your Gemini API key in settings"
    );
}

#[tokio::test]
async fn connection_failure_is_a_transport_error_and_not_retried() {
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let sleeper = Arc::new(RecordingSleeper::default());
    let summarizer = GeminiSummarizer::new(GeminiSummarizerOptions {
        base_url: Some(uri),
        sleeper: Some(sleeper.clone()),
        ..Default::default()
    });

    let error = summarizer
        .summarize(input(SummaryMode::Full))
        .await
        .expect_err("summarize fails");

    assert!(matches!(error, SummarizeError::Transport(_)));
    assert!(sleeper.delays().is_empty());
}

// No timeout is applied unless configured: a hung upstream keeps the call
// pending for as long as the upstream does.
#[tokio::test]
async fn hung_upstream_blocks_without_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("late").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let summarizer = summarizer(&server, Arc::new(RecordingSleeper::default()));
    let pending = tokio::time::timeout(
        Duration::from_millis(200),
        summarizer.summarize(input(SummaryMode::Full)),
    )
    .await;

    assert!(pending.is_err(), "call should still be in flight");
}

#[tokio::test]
async fn configured_timeout_surfaces_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(text_response("late").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let summarizer = GeminiSummarizer::new(GeminiSummarizerOptions {
        base_url: Some(format!("{}/v1beta", server.uri())),
        timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    });

    let error = summarizer
        .summarize(input(SummaryMode::Full))
        .await
        .expect_err("summarize times out");

    match error {
        SummarizeError::Transport(error) => assert!(error.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
}
