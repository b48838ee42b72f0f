pub mod cache;
pub mod chat;
pub mod config;
pub mod output;
pub mod resolver;
pub mod youtube;

use serde::{Deserialize, Serialize};

/// A single captioned segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Whether a caption track was authored by a person or machine-generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Manual,
    Auto,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual"),
            TrackKind::Auto => write!(f, "auto"),
        }
    }
}

/// One caption track advertised for a video
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub language_code: String,
    pub kind: TrackKind,
    pub base_url: String,
}

/// Everything a caption source advertises for one video
#[derive(Debug, Clone, Default)]
pub struct TrackListing {
    pub title: String,
    pub tracks: Vec<TrackInfo>,
}

/// Complete transcript for a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub kind: TrackKind,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Join all segment texts with single spaces, no leading/trailing separator
    pub fn flattened_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Known URL shapes, tried in order; the first rule that matches wins.
/// The capture class excludes `&`, `?` and newlines, so trailing query
/// parameters never leak into the ID.
const URL_RULES: &[&str] = &[
    r"youtube\.com/watch\?.*?v=([A-Za-z0-9_-]+)",
    r"youtu\.be/([A-Za-z0-9_-]+)",
    r"youtube\.com/embed/([A-Za-z0-9_-]+)",
    r"youtube\.com/shorts/([A-Za-z0-9_-]+)",
];

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // Bare 11-character video ID
    if regex::Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap().is_match(input) {
        return Some(input.to_string());
    }

    for rule in URL_RULES {
        if let Some(caps) = regex::Regex::new(rule).unwrap().captures(input) {
            return Some(caps[1].to_string());
        }
    }

    None
}
