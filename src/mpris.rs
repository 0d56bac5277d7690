//! OS media-control bridge
//!
//! Publishes now-playing metadata and playback status to the system media
//! controls (MPRIS on Linux) via `souvlaki`, and forwards media-key commands
//! back into the control surface over a channel drained by the UI loop.
//! When no media-control backend is available the bridge degrades to a
//! silent no-op; its absence never reaches the core.

use std::time::Duration;

use souvlaki::{
    MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, MediaPosition, PlatformConfig,
    SeekDirection,
};
use tokio::sync::mpsc;

/// Commands issued by the OS media controls into the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaCommand {
    PlayPause,
    Play,
    Pause,
    Next,
    Previous,
    SeekBy(i64),
}

pub struct MediaBridge {
    controls: Option<MediaControls>,
}

impl MediaBridge {
    /// Attach to the platform media controls. Any failure (no session bus,
    /// unsupported platform) yields a no-op bridge.
    pub fn new(tx: mpsc::UnboundedSender<MediaCommand>) -> Self {
        let config = PlatformConfig {
            dbus_name: "ymp_rs",
            display_name: "ymp-rs",
            hwnd: None,
        };

        let mut controls = match MediaControls::new(config) {
            Ok(controls) => controls,
            Err(e) => {
                tracing::info!(error = ?e, "Media controls unavailable, media keys disabled");
                return Self { controls: None };
            }
        };

        let attach_result = controls.attach(move |event| {
            let command = match event {
                MediaControlEvent::Toggle => MediaCommand::PlayPause,
                MediaControlEvent::Play => MediaCommand::Play,
                MediaControlEvent::Pause => MediaCommand::Pause,
                MediaControlEvent::Next => MediaCommand::Next,
                MediaControlEvent::Previous => MediaCommand::Previous,
                MediaControlEvent::SeekBy(direction, duration) => {
                    let secs = duration.as_secs() as i64;
                    match direction {
                        SeekDirection::Forward => MediaCommand::SeekBy(secs),
                        SeekDirection::Backward => MediaCommand::SeekBy(-secs),
                    }
                }
                _ => return,
            };
            let _ = tx.send(command);
        });

        match attach_result {
            Ok(()) => {
                tracing::info!("Media controls attached");
                Self {
                    controls: Some(controls),
                }
            }
            Err(e) => {
                tracing::info!(error = ?e, "Media controls attach failed, media keys disabled");
                Self { controls: None }
            }
        }
    }

    pub fn update_metadata(&mut self, title: &str, artist: Option<&str>, duration_secs: Option<u64>) {
        let Some(controls) = self.controls.as_mut() else {
            return;
        };
        let metadata = MediaMetadata {
            title: Some(title),
            artist,
            duration: duration_secs.map(Duration::from_secs),
            ..Default::default()
        };
        if let Err(e) = controls.set_metadata(metadata) {
            tracing::debug!(error = ?e, "Media metadata push failed");
        }
    }

    pub fn update_status(&mut self, active: bool, paused: bool, elapsed_ms: i64) {
        let Some(controls) = self.controls.as_mut() else {
            return;
        };
        let progress = Some(MediaPosition(Duration::from_millis(elapsed_ms.max(0) as u64)));
        let playback = if !active {
            MediaPlayback::Stopped
        } else if paused {
            MediaPlayback::Paused { progress }
        } else {
            MediaPlayback::Playing { progress }
        };
        if let Err(e) = controls.set_playback(playback) {
            tracing::debug!(error = ?e, "Media status push failed");
        }
    }
}
