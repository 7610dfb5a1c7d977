//! Link extraction: scan free text for cross-platform references.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::identifier::{ArtifactId, Platform};

const HUGGINGFACE_LINK: &str = r"https?://huggingface\.co/[\w\-]+/[\w\-.]+";
const GITHUB_LINK: &str = r"https://github\.com/[A-Za-z0-9_.\-]+/[A-Za-z0-9_.\-]+";
const ARXIV_LINK: &str = r"https?://arxiv\.org/(?:abs|pdf)/[0-9]+\.[0-9]+";

/// A link found in a document, with the text surrounding the match.
///
/// The extractor leaves `identifier` and `score` unset; the scoring stage
/// fills them in. Candidates live only for the duration of one resolver
/// call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateLink {
    /// The matched URL, verbatim.
    pub raw_url: String,

    /// Fixed-size character span around the match.
    pub context: String,

    /// Normalized identifier, set by the scoring stage.
    pub identifier: Option<ArtifactId>,

    /// Heuristic confidence, set by the scoring stage.
    pub score: i32,
}

/// Scans documents for links onto one target platform.
///
/// Stateless per call: `scan` returns a lazy, finite iterator and may be
/// called any number of times over any number of documents.
pub struct LinkExtractor {
    pattern: Regex,
    window: usize,
}

impl LinkExtractor {
    /// Extractor for the given platform's URL shape, or `None` for
    /// platforms without one.
    pub fn for_platform(platform: Platform, window: usize) -> Option<Self> {
        let pattern = match platform {
            Platform::HuggingFace => HUGGINGFACE_LINK,
            Platform::GitHub => GITHUB_LINK,
            Platform::Arxiv => ARXIV_LINK,
            Platform::Unknown => return None,
        };
        Some(Self {
            pattern: Regex::new(pattern).expect("builtin link pattern compiles"),
            window,
        })
    }

    /// Lazily yield every link in `text` with its context window. Zero
    /// matches yield an empty iterator.
    pub fn scan<'a>(&'a self, text: &'a str) -> impl Iterator<Item = CandidateLink> + 'a {
        self.pattern.find_iter(text).map(move |m| {
            let start = floor_char_boundary(text, m.start().saturating_sub(self.window));
            let end = ceil_char_boundary(text, (m.end() + self.window).min(text.len()));
            CandidateLink {
                raw_url: m.as_str().to_string(),
                context: text[start..end].to_string(),
                identifier: None,
                score: 0,
            }
        })
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Clip `text` to at most `limit` bytes on a char boundary.
pub(crate) fn clip(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    &text[..floor_char_boundary(text, limit)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_code_host_links() {
        let extractor = LinkExtractor::for_platform(Platform::GitHub, 20).expect("extractor");
        let text = "weights on the hub, code at https://github.com/AcmeLabs/foo-core for training";
        let links: Vec<CandidateLink> = extractor.scan(text).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw_url, "https://github.com/AcmeLabs/foo-core");
        assert!(links[0].context.contains("code at"));
        assert!(links[0].context.contains("for training"));
        assert!(links[0].identifier.is_none());
        assert_eq!(links[0].score, 0);
    }

    #[test]
    fn test_scan_zero_matches_is_empty() {
        let extractor = LinkExtractor::for_platform(Platform::GitHub, 20).expect("extractor");
        assert_eq!(extractor.scan("no links in here").count(), 0);
        assert_eq!(extractor.scan("").count(), 0);
    }

    #[test]
    fn test_scan_is_restartable() {
        let extractor = LinkExtractor::for_platform(Platform::HuggingFace, 10).expect("extractor");
        let text = "see https://huggingface.co/acme/foo-7b and https://huggingface.co/acme/bar";
        let first: Vec<String> = extractor.scan(text).map(|l| l.raw_url).collect();
        let second: Vec<String> = extractor.scan(text).map(|l| l.raw_url).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_scan_window_clamps_at_document_edges() {
        let extractor = LinkExtractor::for_platform(Platform::GitHub, 500).expect("extractor");
        let text = "https://github.com/a/b";
        let links: Vec<CandidateLink> = extractor.scan(text).collect();
        assert_eq!(links[0].context, text);
    }

    #[test]
    fn test_scan_handles_multibyte_context() {
        let extractor = LinkExtractor::for_platform(Platform::GitHub, 3).expect("extractor");
        let text = "모델 코드 https://github.com/acme/foo 저장소 참고";
        let links: Vec<CandidateLink> = extractor.scan(text).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw_url, "https://github.com/acme/foo");
    }

    #[test]
    fn test_no_extractor_for_unknown_platform() {
        assert!(LinkExtractor::for_platform(Platform::Unknown, 80).is_none());
    }

    #[test]
    fn test_paper_links() {
        let extractor = LinkExtractor::for_platform(Platform::Arxiv, 0).expect("extractor");
        let text = "paper: https://arxiv.org/abs/2104.08691 (preprint)";
        let links: Vec<CandidateLink> = extractor.scan(text).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw_url, "https://arxiv.org/abs/2104.08691");
    }

    #[test]
    fn test_clip_respects_char_boundaries() {
        let text = "한국어 텍스트";
        let clipped = clip(text, 5);
        assert!(clipped.len() <= 5);
        assert!(text.starts_with(clipped));
        assert_eq!(clip("short", 100), "short");
    }
}
