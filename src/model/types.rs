//! Core type definitions for the application

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Repeat mode for the queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    Single,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::Single,
            RepeatMode::Single => RepeatMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Off",
            RepeatMode::All => "All",
            RepeatMode::Single => "Single",
        }
    }
}

/// Metadata for a resolved song
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SongMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

/// A queue entry: either a raw search/URL string, or an already-resolved
/// metadata record (e.g. from playlist expansion or a saved playlist).
///
/// Serialized untagged so saved playlists are a flat JSON array of strings
/// and objects, loadable back verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SongRef {
    Meta(SongMeta),
    Raw(String),
}

impl SongRef {
    /// Human-readable title for list display.
    pub fn display_title(&self) -> &str {
        match self {
            SongRef::Meta(meta) => {
                if meta.title.is_empty() {
                    meta.url.as_deref().unwrap_or("Unknown")
                } else {
                    &meta.title
                }
            }
            SongRef::Raw(query) => query,
        }
    }

    /// Stable identity used for preload deduplication.
    pub fn identity(&self) -> String {
        match self {
            SongRef::Meta(meta) => meta.url.clone().unwrap_or_else(|| meta.title.clone()),
            SongRef::Raw(query) => query.clone(),
        }
    }

    /// The string handed to the resolver: a URL when we have one,
    /// otherwise a search query.
    pub fn resolve_target(&self) -> String {
        match self {
            SongRef::Meta(meta) => meta.url.clone().unwrap_or_else(|| match &meta.artist {
                Some(artist) => format!("{} {}", meta.title, artist),
                None => meta.title.clone(),
            }),
            SongRef::Raw(query) => query.clone(),
        }
    }
}

/// UI state for the application
#[derive(Clone, Default)]
pub struct UiState {
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
    pub log_lines: Vec<String>,
}

/// Playback info for rendering the progress bar and now-playing panel
#[derive(Clone, Debug, Default)]
pub struct PlaybackView {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_secs: Option<u64>,
    pub elapsed_ms: i64,
    pub paused: bool,
    pub repeat: RepeatMode,
}

/// Everything the view needs for one frame
#[derive(Clone)]
pub struct ViewSnapshot {
    pub playback: PlaybackView,
    pub pending: Vec<String>,
    pub pending_total: usize,
    pub history: Vec<String>,
    pub ui: UiState,
}
