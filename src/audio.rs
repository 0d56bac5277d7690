//! Playback handle over a single audio-playing unit
//!
//! Audio output is delegated to an `ffplay` subprocess; there is no live
//! pause or seek primitive. Pausing stops the process at a saved offset and
//! resuming (or seeking) launches a fresh process with `-ss` at the computed
//! position. For non-seekable live streams `-ss` cannot land on the exact
//! saved position; the stream resumes from wherever it currently is. Known
//! limitation of the stop-then-relaunch mechanism.
//!
//! Environments without an audio device (CI, headless boxes) get a
//! [`MockHandle`] that satisfies the same contract with no audible output.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// True when the current environment can produce audio at all.
pub fn audio_available() -> bool {
    if cfg!(target_os = "linux") {
        Path::new("/dev/snd").exists()
    } else {
        true
    }
}

/// One active audio-playing unit: a real `ffplay` process or a stand-in.
pub enum PlaybackHandle {
    Process(FfplayHandle),
    Mock(MockHandle),
}

impl PlaybackHandle {
    /// Start playback of a local file or stream URL at `offset_ms`.
    ///
    /// Never fails: if audio is unavailable or the spawn fails (ffplay not
    /// installed), a mock handle is substituted and the song is still
    /// considered playing.
    pub fn launch(source: &str, offset_ms: i64, audio: bool) -> Self {
        if !audio {
            tracing::debug!(source, "No audio device, using mock playback");
            return PlaybackHandle::Mock(MockHandle::new());
        }

        match FfplayHandle::spawn(source, offset_ms) {
            Ok(handle) => PlaybackHandle::Process(handle),
            Err(e) => {
                tracing::warn!(error = %e, source, "ffplay launch failed, using mock playback");
                PlaybackHandle::Mock(MockHandle::new())
            }
        }
    }

    /// Whether the underlying unit is still producing (or pretending to
    /// produce) audio.
    pub fn is_running(&mut self) -> bool {
        match self {
            PlaybackHandle::Process(handle) => handle.is_running(),
            PlaybackHandle::Mock(handle) => handle.is_running(),
        }
    }

    /// Stop playback: graceful terminate, bounded wait, then force-kill.
    pub async fn stop(&mut self) {
        match self {
            PlaybackHandle::Process(handle) => handle.stop().await,
            PlaybackHandle::Mock(handle) => handle.stop(),
        }
    }

}

/// Wrapper around an ffplay subprocess.
pub struct FfplayHandle {
    child: Child,
}

impl FfplayHandle {
    fn spawn(source: &str, offset_ms: i64) -> std::io::Result<Self> {
        let args = ffplay_args(source, offset_ms);
        let child = Command::new("ffplay")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::debug!(source, offset_ms, "ffplay started");
        Ok(Self { child })
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        self.terminate();
        match tokio::time::timeout(STOP_TIMEOUT, self.child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!("ffplay did not exit after SIGTERM, killing");
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
            }
        }
    }

    #[cfg(unix)]
    fn terminate(&self) {
        if let Some(pid) = self.child.id() {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&self) {
        // No graceful signal available; stop() falls through to kill.
    }
}

/// Builds the ffplay argv. A nonzero offset becomes `-ss` at launch since
/// there is no way to seek a running ffplay.
fn ffplay_args(source: &str, offset_ms: i64) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-nodisp".into(),
        "-autoexit".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
    ];
    if offset_ms > 0 {
        args.push("-ss".into());
        args.push(format!("{}", offset_ms as f64 / 1000.0));
    }
    args.push(source.to_string());
    args
}

/// Stand-in playback unit for environments with no audio device.
///
/// Reports running until explicitly stopped, mirroring an endless stream.
pub struct MockHandle {
    running: bool,
}

impl MockHandle {
    fn new() -> Self {
        Self { running: true }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_runs_until_stopped() {
        let mut handle = PlaybackHandle::launch("dummy.mp3", 0, false);
        assert!(matches!(handle, PlaybackHandle::Mock(_)));
        assert!(handle.is_running());

        futures::executor::block_on(handle.stop());
        assert!(!handle.is_running());
    }

    #[test]
    fn argv_includes_seek_offset() {
        let args = ffplay_args("song.mp3", 5000);
        let ss = args.iter().position(|a| a == "-ss").expect("-ss missing");
        assert_eq!(args[ss + 1], "5");
        assert_eq!(args.last().map(String::as_str), Some("song.mp3"));
    }

    #[test]
    fn argv_omits_seek_at_zero() {
        let args = ffplay_args("http://example.com/stream", 0);
        assert!(!args.contains(&"-ss".to_string()));
        assert!(args.contains(&"-autoexit".to_string()));
    }
}
