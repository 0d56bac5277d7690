//! Transport state machine
//!
//! Owns at most one [`PlaybackHandle`] and the elapsed-time accounting that
//! survives the stop-then-relaunch "pause" mechanism: `accumulated_ms` holds
//! time already played before the current handle started, so elapsed time is
//! `accumulated_ms + (now - started_at)` while running and plain
//! `accumulated_ms` while paused.
//!
//! States: Idle (no handle) -> Playing -> Paused (handle stopped, offset
//! saved) -> Playing (fresh handle at saved offset) -> ... -> Idle.

use std::time::Instant;

use crate::audio::PlaybackHandle;

use super::types::{RepeatMode, SongMeta};

pub struct Transport {
    current: Option<SongMeta>,
    handle: Option<PlaybackHandle>,
    /// Playable path or stream URL, kept for relaunch on resume/seek.
    source: Option<String>,
    started_at: Option<Instant>,
    accumulated_ms: i64,
    paused: bool,
    pub repeat: RepeatMode,
    audio: bool,
}

impl Transport {
    pub fn new(audio: bool) -> Self {
        Self {
            current: None,
            handle: None,
            source: None,
            started_at: None,
            accumulated_ms: 0,
            paused: false,
            repeat: RepeatMode::Off,
            audio,
        }
    }

    /// Start playing a song from the beginning: Idle -> Playing.
    ///
    /// A launch that cannot produce audio still transitions to Playing with
    /// a mock handle (degraded, non-fatal).
    pub async fn begin(&mut self, meta: SongMeta, source: String) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop().await;
        }

        let handle = PlaybackHandle::launch(&source, 0, self.audio);
        tracing::info!(title = %meta.title, "Playback started");

        self.current = Some(meta);
        self.handle = Some(handle);
        self.source = Some(source);
        self.started_at = Some(Instant::now());
        self.accumulated_ms = 0;
        self.paused = false;
    }

    /// Playing -> Paused. Stops the handle and banks the elapsed time.
    /// Returns false (caller shows a notice) if not currently playing.
    pub async fn pause(&mut self) -> bool {
        if self.paused || self.handle.is_none() {
            return false;
        }

        if let Some(started) = self.started_at.take() {
            self.accumulated_ms += started.elapsed().as_millis() as i64;
        }
        if let Some(handle) = self.handle.as_mut() {
            handle.stop().await;
        }
        self.paused = true;
        tracing::debug!(offset_ms = self.accumulated_ms, "Paused");
        true
    }

    /// Paused -> Playing. Launches a fresh handle at the saved offset.
    /// Returns false (caller shows a notice) if not paused.
    pub async fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        let Some(source) = self.source.clone() else {
            return false;
        };

        self.handle = Some(PlaybackHandle::launch(&source, self.accumulated_ms, self.audio));
        self.started_at = Some(Instant::now());
        self.paused = false;
        tracing::debug!(offset_ms = self.accumulated_ms, "Resumed");
        true
    }

    /// Jump by `delta_secs` (negative for backward): pause, adjust the
    /// saved offset, resume. Net effect is one stop and one relaunch.
    ///
    /// The resulting offset is clamped at zero; offsets past the end of the
    /// song make the relaunched player exit immediately and the scheduler
    /// advances, which is the accepted over-seek behavior.
    pub async fn seek(&mut self, delta_secs: i64) {
        if self.handle.is_none() {
            return;
        }
        if !self.paused {
            self.pause().await;
        }
        self.accumulated_ms = (self.accumulated_ms + delta_secs * 1000).max(0);
        self.resume().await;
    }

    /// Stop the active handle for a skip, leaving it in place so the
    /// scheduler's finished-check picks it up and advances the queue.
    ///
    /// Under single-repeat the mode is briefly disabled around the stop so a
    /// scheduler tick landing mid-sequence does not immediately requeue the
    /// same song. A tick can still race the re-enable below; kept with the
    /// original ordering as a known hazard rather than widening the lock
    /// around process teardown.
    pub async fn stop_current(&mut self) {
        if self.repeat == RepeatMode::Single {
            self.repeat = RepeatMode::Off;
            self.stop_handle().await;
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            self.repeat = RepeatMode::Single;
        } else {
            self.stop_handle().await;
        }
    }

    /// Plain stop without the repeat dance (used for "previous").
    pub async fn stop_for_skip(&mut self) {
        self.stop_handle().await;
    }

    async fn stop_handle(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop().await;
        }
        self.paused = false;
    }

    /// Drop the finished handle and current song: back to Idle.
    pub fn clear_finished(&mut self) -> Option<SongMeta> {
        self.handle = None;
        self.source = None;
        self.started_at = None;
        self.accumulated_ms = 0;
        self.paused = false;
        self.current.take()
    }

    /// Stop everything and release resources (quit path).
    pub async fn shutdown(&mut self) {
        self.stop_handle().await;
        self.clear_finished();
    }

    pub fn elapsed_ms(&self) -> i64 {
        match (&self.started_at, self.paused) {
            (Some(started), false) => self.accumulated_ms + started.elapsed().as_millis() as i64,
            _ => self.accumulated_ms,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// A song is considered playing-or-paused iff a handle exists.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle_running(&mut self) -> bool {
        match self.handle.as_mut() {
            Some(handle) => handle.is_running(),
            None => false,
        }
    }

    pub fn current(&self) -> Option<&SongMeta> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn meta(title: &str) -> SongMeta {
        SongMeta {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Transport with audio forced off, so every launch is a mock handle.
    fn transport() -> Transport {
        Transport::new(false)
    }

    #[tokio::test]
    async fn begin_transitions_to_playing() {
        let mut t = transport();
        assert!(!t.is_active());

        t.begin(meta("a"), "a.mp3".into()).await;
        assert!(t.is_active());
        assert!(!t.is_paused());
        assert!(t.handle_running());
        assert_eq!(t.current().map(|m| m.title.as_str()), Some("a"));
    }

    #[tokio::test]
    async fn pause_then_resume_keeps_elapsed_monotonic() {
        let mut t = transport();
        t.begin(meta("a"), "a.mp3".into()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(t.pause().await);
        let at_pause = t.elapsed_ms();
        assert!(at_pause >= 30, "banked elapsed lost: {}", at_pause);

        // Frozen while paused.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(t.elapsed_ms(), at_pause);

        assert!(t.resume().await);
        let after_resume = t.elapsed_ms();
        assert!(after_resume >= at_pause, "elapsed reset on resume");
        assert!(after_resume < at_pause + 100, "resume added phantom time");
    }

    #[tokio::test]
    async fn double_pause_and_stray_resume_are_noops() {
        let mut t = transport();
        t.begin(meta("a"), "a.mp3".into()).await;

        assert!(!t.resume().await, "resume while playing should be refused");
        assert!(t.pause().await);
        assert!(!t.pause().await, "second pause should be refused");
    }

    #[tokio::test]
    async fn seek_round_trip_returns_near_start() {
        let mut t = transport();
        t.begin(meta("a"), "a.mp3".into()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let before = t.elapsed_ms();

        t.seek(10).await;
        t.seek(-10).await;

        let after = t.elapsed_ms();
        assert!(!t.is_paused());
        assert!((after - before).abs() < 500, "drifted {} ms", after - before);
    }

    #[tokio::test]
    async fn seek_clamps_at_zero() {
        let mut t = transport();
        t.begin(meta("a"), "a.mp3".into()).await;
        t.seek(-600).await;
        assert!(t.elapsed_ms() < 1000);
        assert!(t.elapsed_ms() >= 0);
    }

    #[tokio::test]
    async fn stop_current_leaves_handle_for_finished_check() {
        let mut t = transport();
        t.begin(meta("a"), "a.mp3".into()).await;
        t.stop_current().await;

        assert!(t.is_active());
        assert!(!t.handle_running());
        assert!(!t.is_paused());
    }

    #[tokio::test]
    async fn stop_current_restores_single_repeat() {
        let mut t = transport();
        t.repeat = RepeatMode::Single;
        t.begin(meta("a"), "a.mp3".into()).await;
        t.stop_current().await;
        assert_eq!(t.repeat, RepeatMode::Single);
    }

    #[tokio::test]
    async fn clear_finished_returns_to_idle() {
        let mut t = transport();
        t.begin(meta("a"), "a.mp3".into()).await;
        t.stop_for_skip().await;

        let finished = t.clear_finished();
        assert_eq!(finished.map(|m| m.title), Some("a".to_string()));
        assert!(!t.is_active());
        assert_eq!(t.elapsed_ms(), 0);
    }
}
