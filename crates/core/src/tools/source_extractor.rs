//! # Source Extractor
//!
//! Turns a learner input that points at an external source (a video link, a
//! book reference) into source text plus metadata. Called once per invocation,
//! before the graph starts. Empty text means "no source".

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use crate::state::{SourceKind, SourceMetadata};

/// Text and metadata of an extracted source
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedSource {
    pub text: String,
    pub metadata: SourceMetadata,
}

impl ExtractedSource {
    /// The "no source" result.
    pub fn none() -> Self {
        Self {
            text: String::new(),
            metadata: SourceMetadata {
                kind: SourceKind::Article,
                title: "Untitled".to_string(),
                url: None,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[async_trait]
pub trait SourceExtractor: Send + Sync {
    async fn extract(&self, input: &str) -> anyhow::Result<ExtractedSource>;
}

/// Extractor that never finds a source
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSourceExtractor;

#[async_trait]
impl SourceExtractor for NoSourceExtractor {
    async fn extract(&self, _input: &str) -> anyhow::Result<ExtractedSource> {
        Ok(ExtractedSource::none())
    }
}

fn youtube_pattern() -> Option<&'static Regex> {
    static YOUTUBE: OnceLock<Option<Regex>> = OnceLock::new();
    YOUTUBE
        .get_or_init(|| {
            Regex::new(
                r"(?:https?://)?(?:www\.)?(?:youtube\.com|youtu\.be)/(?:watch\?v=)?([a-zA-Z0-9_-]{11})",
            )
            .ok()
        })
        .as_ref()
}

fn book_prefix() -> Option<&'static Regex> {
    static BOOK: OnceLock<Option<Regex>> = OnceLock::new();
    BOOK.get_or_init(|| Regex::new(r"(?i)book:|read:").ok())
        .as_ref()
}

/// Recognizes sources from the shape of the input alone.
///
/// - YouTube links (`youtube.com/watch?v=…`, `youtu.be/…`) become a video
///   source keyed by the video id
/// - `book: <title>` / `read: <title>` becomes a book source
///
/// Without a transcript or library provider the text is a reference stub
/// naming the source, which is enough for the agents to anchor on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSourceExtractor;

impl PatternSourceExtractor {
    fn video(input: &str) -> Option<ExtractedSource> {
        let caps = youtube_pattern()?.captures(input)?;
        let video_id = caps.get(1)?.as_str();
        tracing::info!(video_id, "Detected video source");

        Some(ExtractedSource {
            text: format!(
                "[VIDEO {video_id}]\nThe learner shared a video. No transcript provider is \
                 configured; treat the learner's request as the summary of its content."
            ),
            metadata: SourceMetadata {
                kind: SourceKind::Video,
                title: format!("Video {video_id}"),
                url: Some(input.trim().to_string()),
            },
        })
    }

    fn book(input: &str) -> Option<ExtractedSource> {
        let prefix = book_prefix()?;
        if !prefix.is_match(input) {
            return None;
        }
        let title = prefix.replace(input, "").trim().to_string();
        if title.is_empty() {
            return None;
        }
        tracing::info!(title = %title, "Detected book source");

        Some(ExtractedSource {
            text: format!(
                "[BOOK: {title}]\nThe learner is reading \"{title}\". Ground explanations in \
                 the book's themes and vocabulary."
            ),
            metadata: SourceMetadata {
                kind: SourceKind::Book,
                title,
                url: None,
            },
        })
    }
}

#[async_trait]
impl SourceExtractor for PatternSourceExtractor {
    async fn extract(&self, input: &str) -> anyhow::Result<ExtractedSource> {
        Ok(Self::video(input)
            .or_else(|| Self::book(input))
            .unwrap_or_else(ExtractedSource::none))
    }
}
