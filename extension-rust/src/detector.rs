use crate::{runtime::MessageSink, video_url::watch_page_video_id, Message, VideoDetected};
use std::time::Duration;
use tokio::{
    sync::watch,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// What the detector can see of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub href: String,
    pub title: String,
}

impl PageSnapshot {
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: title.into(),
        }
    }
}

/// Remembers the last reported video so each one is reported once.
#[derive(Debug, Default)]
pub struct VideoDetector {
    current_video_id: Option<String>,
}

impl VideoDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_video_id(&self) -> Option<&str> {
        self.current_video_id.as_deref()
    }

    /// Report the page's video if it is on the watch page and differs from
    /// the last one reported. Calling it repeatedly is harmless.
    pub fn detect(&mut self, page: &PageSnapshot) -> Option<VideoDetected> {
        let video_id = watch_page_video_id(&page.href)?;
        if self.current_video_id.as_deref() == Some(video_id.as_str()) {
            return None;
        }

        self.current_video_id = Some(video_id.clone());
        Some(VideoDetected {
            video_id,
            url: page.href.clone(),
            title: page.title.clone(),
        })
    }
}

/// # Default Values
/// - `debounce`: 100 ms after a URL change
/// - `poll_interval`: 3 seconds
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            poll_interval: Duration::from_secs(3),
        }
    }
}

fn detect_and_notify<S: MessageSink>(
    detector: &mut VideoDetector,
    page: &watch::Receiver<PageSnapshot>,
    sink: &S,
) {
    let snapshot = page.borrow().clone();
    let Some(detected) = detector.detect(&snapshot) else {
        return;
    };

    info!(video_id = %detected.video_id, url = %detected.url, "new video detected");
    if let Err(error) = sink.send(Message::from(detected)) {
        warn!(%error, "failed to deliver video detection");
    }
}

/// Watch one page for video changes until the page goes away (the sender
/// side of `page` is dropped).
///
/// Detection runs once at start, 100 ms after every URL change signalled
/// through `page`, and on a fixed poll in case a change signal was missed.
pub async fn run_detector<S: MessageSink>(
    mut page: watch::Receiver<PageSnapshot>,
    sink: S,
    config: DetectorConfig,
) {
    let mut detector = VideoDetector::new();
    let mut last_href = page.borrow_and_update().href.clone();
    detect_and_notify(&mut detector, &page, &sink);

    let mut poll = time::interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let debounce = time::sleep(config.debounce);
    tokio::pin!(debounce);
    let mut debounce_armed = false;

    loop {
        tokio::select! {
            changed = page.changed() => {
                if changed.is_err() {
                    break;
                }
                let href = page.borrow_and_update().href.clone();
                if href != last_href {
                    debug!(%href, "page url changed");
                    last_href = href;
                    debounce.as_mut().reset(Instant::now() + config.debounce);
                    debounce_armed = true;
                }
            }
            () = &mut debounce, if debounce_armed => {
                debounce_armed = false;
                detect_and_notify(&mut detector, &page, &sink);
            }
            _ = poll.tick() => {
                detect_and_notify(&mut detector, &page, &sink);
            }
        }
    }

    debug!("page closed, detector stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch_page(id: &str) -> PageSnapshot {
        PageSnapshot::new(
            format!("https://www.youtube.com/watch?v={id}"),
            format!("{id} - YouTube"),
        )
    }

    #[test]
    fn detects_each_video_once() {
        let mut detector = VideoDetector::new();

        let first = detector.detect(&watch_page("abc")).unwrap();
        assert_eq!(first.video_id, "abc");
        assert_eq!(first.title, "abc - YouTube");
        assert_eq!(detector.detect(&watch_page("abc")), None);

        assert_eq!(detector.detect(&watch_page("def")).unwrap().video_id, "def");
        assert_eq!(detector.current_video_id(), Some("def"));
    }

    #[test]
    fn ignores_pages_off_the_watch_path() {
        let mut detector = VideoDetector::new();
        assert_eq!(
            detector.detect(&PageSnapshot::new("https://www.youtube.com/", "YouTube")),
            None
        );
        assert_eq!(
            detector.detect(&PageSnapshot::new(
                "https://www.youtube.com/results?search_query=rust&v=abc",
                "rust - YouTube"
            )),
            None
        );
        assert_eq!(detector.current_video_id(), None);
    }

    #[test]
    fn returning_to_a_previous_video_reports_it_again() {
        let mut detector = VideoDetector::new();
        detector.detect(&watch_page("abc"));
        detector.detect(&PageSnapshot::new("https://www.youtube.com/", "YouTube"));
        // Leaving the watch page does not reset the tracked id.
        assert_eq!(detector.detect(&watch_page("abc")), None);
        detector.detect(&watch_page("def"));
        assert!(detector.detect(&watch_page("abc")).is_some());
    }
}
