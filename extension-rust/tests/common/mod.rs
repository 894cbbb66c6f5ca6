#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::task::JoinHandle;
use video_summarizer::testing::MockSummarizer;
use video_summary_extension::{
    spawn_coordinator, testing::RecordingHost, Coordinator, CoordinatorHandle, CoordinatorParams,
    ExtensionError, ExtensionResult, MemorySettingsStore, Message, MessageSink, Settings,
};

pub struct Harness {
    pub handle: CoordinatorHandle,
    pub task: JoinHandle<()>,
    pub coordinator: Arc<Coordinator>,
    pub summarizer: Arc<MockSummarizer>,
    pub host: Arc<RecordingHost>,
    pub settings: Arc<MemorySettingsStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(MockSummarizer::new(), Some("test-key"))
    }

    pub fn with(summarizer: MockSummarizer, api_key: Option<&str>) -> Self {
        let summarizer = Arc::new(summarizer);
        let host = Arc::new(RecordingHost::new());
        let settings = Arc::new(MemorySettingsStore::new(Settings {
            api_key: api_key.map(str::to_string),
            ..Settings::default()
        }));
        let coordinator = Arc::new(Coordinator::new(CoordinatorParams::new(
            summarizer.clone(),
            settings.clone(),
            host.clone(),
        )));
        let (handle, task) = spawn_coordinator(coordinator.clone());

        Self {
            handle,
            task,
            coordinator,
            summarizer,
            host,
            settings,
        }
    }
}

/// Wait until `condition` holds, yielding to other tasks in between.
pub async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition never became true");
}

/// A sink that records what it is given, optionally failing every send.
#[derive(Clone, Default)]
pub struct RecordingSink {
    messages: Arc<Mutex<Vec<Message>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn video_ids(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                Message::VideoDetected { video_id, .. } => Some(video_id),
                _ => None,
            })
            .collect()
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, message: Message) -> ExtensionResult<()> {
        self.messages.lock().unwrap().push(message);
        if self.fail {
            Err(ExtensionError::CoordinatorUnavailable)
        } else {
            Ok(())
        }
    }
}
