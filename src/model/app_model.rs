//! Main application model with state management
//!
//! All mutable state lives behind per-field locks; the model itself is
//! cheaply cloneable and shared between the UI loop, the scheduler task and
//! download workers. Workers report results through these methods rather
//! than mutating anything the renderer reads directly.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};

use super::queue::Queue;
use super::transport::Transport;
use super::types::{PlaybackView, UiState, ViewSnapshot};

const MAX_LOG_LINES: usize = 200;
const SIDEBAR_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppModel {
    pub queue: Arc<Mutex<Queue>>,
    pub transport: Arc<Mutex<Transport>>,
    ui_state: Arc<Mutex<UiState>>,
    should_quit: Arc<Mutex<bool>>,
    fetch_in_flight: Arc<Mutex<bool>>,
    preload_dispatched: Arc<RwLock<HashSet<String>>>,
}

impl AppModel {
    pub fn new(audio: bool) -> Self {
        Self {
            queue: Arc::new(Mutex::new(Queue::new())),
            transport: Arc::new(Mutex::new(Transport::new(audio))),
            ui_state: Arc::new(Mutex::new(UiState::default())),
            should_quit: Arc::new(Mutex::new(false)),
            fetch_in_flight: Arc::new(Mutex::new(false)),
            preload_dispatched: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    // ========================================================================
    // Quit flag
    // ========================================================================

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self) {
        *self.should_quit.lock().await = true;
    }

    // ========================================================================
    // Fetch-in-flight guard
    // ========================================================================

    /// Claim the single fetch-and-play slot. Returns false if a fetch is
    /// already running, guaranteeing `pop_next` is called at most once until
    /// the previous playback attempt resolves.
    pub async fn try_begin_fetch(&self) -> bool {
        let mut in_flight = self.fetch_in_flight.lock().await;
        if *in_flight {
            false
        } else {
            *in_flight = true;
            true
        }
    }

    pub async fn end_fetch(&self) {
        *self.fetch_in_flight.lock().await = false;
    }

    // ========================================================================
    // Preload-dispatch set
    // ========================================================================

    /// Record a preload dispatch. Returns true only the first time a given
    /// identity is seen in the current playback cycle, so concurrent
    /// triggers collapse into exactly one background fetch.
    pub async fn mark_preload_dispatched(&self, identity: &str) -> bool {
        let mut dispatched = self.preload_dispatched.write().await;
        dispatched.insert(identity.to_string())
    }

    /// Cleared whenever a new song starts playing.
    pub async fn clear_preload_dispatched(&self) {
        let mut dispatched = self.preload_dispatched.write().await;
        if !dispatched.is_empty() {
            tracing::debug!(count = dispatched.len(), "Clearing preload dispatch set");
            dispatched.clear();
        }
    }

    // ========================================================================
    // Status / log surface
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > 5 {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn push_log(&self, line: impl Into<String>) {
        let mut state = self.ui_state.lock().await;
        state.log_lines.push(line.into());
        if state.log_lines.len() > MAX_LOG_LINES {
            let overflow = state.log_lines.len() - MAX_LOG_LINES;
            state.log_lines.drain(..overflow);
        }
    }

    pub async fn toggle_help_popup(&self) {
        let mut state = self.ui_state.lock().await;
        state.show_help_popup = !state.show_help_popup;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    // ========================================================================
    // View snapshot
    // ========================================================================

    pub async fn view_snapshot(&self) -> ViewSnapshot {
        let playback = {
            let transport = self.transport.lock().await;
            let current = transport.current();
            PlaybackView {
                title: current.map(|m| m.title.clone()),
                artist: current.and_then(|m| m.artist.clone()),
                duration_secs: current.and_then(|m| m.duration_secs),
                elapsed_ms: transport.elapsed_ms(),
                paused: transport.is_paused(),
                repeat: transport.repeat,
            }
        };

        let (pending, pending_total, history) = {
            let queue = self.queue.lock().await;
            let pending: Vec<String> = queue
                .pending_iter()
                .take(SIDEBAR_LIMIT)
                .map(|s| s.display_title().to_string())
                .collect();
            let history: Vec<String> = queue
                .history_iter()
                .rev()
                .take(10)
                .map(|s| s.display_title().to_string())
                .collect();
            (pending, queue.pending_len(), history)
        };

        ViewSnapshot {
            playback,
            pending,
            pending_total,
            history,
            ui: self.ui_state.lock().await.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_guard_admits_one_claimant() {
        let model = AppModel::new(false);
        assert!(model.try_begin_fetch().await);
        assert!(!model.try_begin_fetch().await);

        model.end_fetch().await;
        assert!(model.try_begin_fetch().await);
    }

    #[tokio::test]
    async fn preload_dispatch_dedupes_within_cycle() {
        let model = AppModel::new(false);

        // Two triggers for the same song in one cycle: one fetch.
        assert!(model.mark_preload_dispatched("song-x").await);
        assert!(!model.mark_preload_dispatched("song-x").await);
        assert!(model.mark_preload_dispatched("song-y").await);

        // New playback cycle resets the set.
        model.clear_preload_dispatched().await;
        assert!(model.mark_preload_dispatched("song-x").await);
    }

    #[tokio::test]
    async fn log_is_capped() {
        let model = AppModel::new(false);
        for i in 0..(MAX_LOG_LINES + 50) {
            model.push_log(format!("line {}", i)).await;
        }
        let snapshot = model.view_snapshot().await;
        assert_eq!(snapshot.ui.log_lines.len(), MAX_LOG_LINES);
        assert_eq!(snapshot.ui.log_lines.last().unwrap(), &format!("line {}", MAX_LOG_LINES + 49));
    }
}
