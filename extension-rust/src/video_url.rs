//! Recognition of video URLs: link shapes accepted from the context menu,
//! watch pages seen by the detector, and the menu's target patterns.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Tried in order; the first match wins.
const VIDEO_ID_PATTERNS: [&str; 2] = [
    r"(?:youtube\.com/watch\?v=|youtu\.be/)([^&\n?#]+)",
    r"youtube\.com/embed/([^&\n?#]+)",
];

pub const WATCH_PATH: &str = "/watch";

fn video_id_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        VIDEO_ID_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("video id pattern is valid"))
            .collect()
    })
}

/// Video id from a link: `.../watch?v=ID`, `youtu.be/ID` or `.../embed/ID`.
#[must_use]
pub fn extract_video_id(link: &str) -> Option<String> {
    video_id_patterns()
        .iter()
        .find_map(|pattern| pattern.captures(link))
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

/// The raw, undecoded `v` query parameter of a page URL, but only on the
/// watch page itself.
#[must_use]
pub fn watch_page_video_id(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    if url.path() != WATCH_PATH {
        return None;
    }
    url.query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("v=").filter(|id| !id.is_empty()))
        .map(str::to_string)
}

/// Whether the URL looks like a watch URL carrying a video id.
#[must_use]
pub fn is_watch_url(url: &str) -> bool {
    url.contains("youtube.com/watch?v=")
}

/// Registration data for the "summarize" context-menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextMenuSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub contexts: &'static [&'static str],
    pub target_url_patterns: &'static [&'static str],
}

pub const CONTEXT_MENU: ContextMenuSpec = ContextMenuSpec {
    id: "summarizeYouTubeVideo",
    title: "Summarize YouTube Video",
    contexts: &["link", "page"],
    target_url_patterns: &[
        "*://www.youtube.com/watch*",
        "*://youtube.com/watch*",
        "*://youtu.be/*",
        "*://www.youtu.be/*",
        "*://m.youtube.com/watch*",
    ],
};

impl ContextMenuSpec {
    /// Whether the host would offer this menu entry for `target`.
    #[must_use]
    pub fn matches(&self, target: &str) -> bool {
        self.target_url_patterns
            .iter()
            .any(|pattern| match_pattern(pattern, target))
    }
}

/// Match a `scheme://host/path` pattern where `*` as the scheme means http
/// or https and `*` in the path matches anything, query included.
fn match_pattern(pattern: &str, target: &str) -> bool {
    let Some((scheme, rest)) = pattern.split_once("://") else {
        return false;
    };
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let path = format!("/{}", path.trim_start_matches('/'));

    let Ok(url) = Url::parse(target) else {
        return false;
    };

    let scheme_ok = match scheme {
        "*" => matches!(url.scheme(), "http" | "https"),
        other => url.scheme() == other,
    };
    if !scheme_ok || url.host_str() != Some(host) {
        return false;
    }

    let mut target_path = url.path().to_string();
    if let Some(query) = url.query() {
        target_path.push('?');
        target_path.push_str(query);
    }

    let glob = path
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{glob}$")).is_ok_and(|regex| regex.is_match(&target_path))
}
