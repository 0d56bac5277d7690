//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the
//! application. It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (song references, repeat mode, UI state)
//! - `queue`: Pending/history song queue
//! - `transport`: Playback state machine and elapsed-time accounting
//! - `cache`: Smart-download cache eviction
//! - `app_model`: Main application model with state management methods

mod types;
mod queue;
mod transport;
pub mod cache;
mod app_model;

// Re-export all public types for convenient access
pub use types::{PlaybackView, RepeatMode, SongMeta, SongRef, UiState, ViewSnapshot};

pub use app_model::AppModel;
