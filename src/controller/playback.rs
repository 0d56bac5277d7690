//! Transport and queue control surface.
//!
//! Every user-facing action funnels through here, whether it arrived from
//! the keyboard, the media keys, or the CLI seeding path.

use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::model::{RepeatMode, SongRef};
use crate::mpris::MediaCommand;
use crate::resolver;

use super::AppController;

impl AppController {
    /// Queue a free-form query or URL typed by the user.
    pub async fn add_song(&self, query: &str) {
        {
            let mut queue = self.model.queue.lock().await;
            queue.enqueue(query);
        }
        self.model.push_log(format!("Queued: {query}")).await;
    }

    /// Queue already-resolved entries, e.g. from a loaded playlist.
    pub async fn load_refs(&self, refs: Vec<SongRef>) {
        let count = refs.len();
        {
            let mut queue = self.model.queue.lock().await;
            queue.extend(refs);
        }
        self.model.push_log(format!("Queued {count} songs")).await;
    }

    pub async fn toggle_pause(&self) {
        let mut transport = self.model.transport.lock().await;
        if !transport.is_active() {
            drop(transport);
            self.model.set_error("Nothing is playing".into()).await;
            return;
        }
        if transport.is_paused() {
            transport.resume().await;
            drop(transport);
            self.model.push_log("Resumed").await;
        } else {
            transport.pause().await;
            drop(transport);
            self.model.push_log("Paused").await;
        }
    }

    pub async fn pause_playback(&self) {
        let paused = self.model.transport.lock().await.pause().await;
        if paused {
            self.model.push_log("Paused").await;
        } else {
            self.model.set_error("Already paused".into()).await;
        }
    }

    pub async fn resume_playback(&self) {
        let resumed = self.model.transport.lock().await.resume().await;
        if resumed {
            self.model.push_log("Resumed").await;
        } else {
            self.model.set_error("Already playing".into()).await;
        }
    }

    /// Relative seek, in whole seconds.
    pub async fn seek_by(&self, delta_secs: i64) {
        {
            let mut transport = self.model.transport.lock().await;
            if !transport.is_active() {
                drop(transport);
                self.model.set_error("Nothing is playing".into()).await;
                return;
            }
            transport.seek(delta_secs).await;
        }
        self.model.push_log(format!("Seek {delta_secs:+}s")).await;
    }

    /// Stop the current song; the scheduler notices the dead handle and
    /// advances the queue on its next tick.
    pub async fn next_song(&self) {
        let active = {
            let mut transport = self.model.transport.lock().await;
            let active = transport.is_active();
            if active {
                transport.stop_current().await;
            }
            active
        };
        if active {
            self.model.push_log("Skipping forward").await;
        } else {
            self.model.set_error("Nothing is playing".into()).await;
        }
    }

    /// Put the previous song (and, if playing, the current one) back at the
    /// head of pending, then let the scheduler restart playback.
    pub async fn previous_song(&self) {
        let include_current = self.model.transport.lock().await.is_active();
        let requeued = {
            let mut queue = self.model.queue.lock().await;
            queue.requeue_previous(include_current)
        };
        if !requeued {
            self.model
                .set_error("Can't go back beyond the start".into())
                .await;
            return;
        }
        self.model.transport.lock().await.stop_for_skip().await;
        self.model.push_log("Skipping back").await;
    }

    pub async fn shuffle_queue(&self) {
        {
            let mut queue = self.model.queue.lock().await;
            queue.shuffle();
        }
        self.model.push_log("Queue shuffled").await;
    }

    pub async fn set_repeat(&self, mode: RepeatMode) {
        self.model.transport.lock().await.repeat = mode;
        self.model.push_log(format!("Repeat: {}", mode.label())).await;
    }

    pub async fn cycle_repeat(&self) {
        let next = self.model.transport.lock().await.repeat.next();
        self.set_repeat(next).await;
    }

    pub async fn remove_last_queued(&self) {
        let removed = {
            let mut queue = self.model.queue.lock().await;
            queue.remove_last()
        };
        if removed {
            self.model.push_log("Removed last queued song").await;
        } else {
            self.model.set_error("Queue is empty".into()).await;
        }
    }

    /// Persist history ++ pending as a named playlist under the configured
    /// playlist directory.
    pub async fn save_playlist(&self, name: &str) {
        let snapshot = self.model.queue.lock().await.snapshot();
        match self.write_playlist(name, &snapshot) {
            Ok(()) => {
                info!("saved playlist {name} ({} songs)", snapshot.len());
                self.model.push_log(format!("Saved playlist: {name}")).await;
            }
            Err(err) => {
                warn!("saving playlist {name} failed: {err:#}");
                self.model
                    .set_error(format!("Couldn't save playlist: {err}"))
                    .await;
            }
        }
    }

    fn write_playlist(&self, name: &str, songs: &[SongRef]) -> Result<()> {
        let dir = self.config.playlist_dir();
        fs::create_dir_all(dir).context("creating playlist directory")?;
        let path = dir.join(format!("{name}.json"));
        let body = serde_json::to_string_pretty(songs)?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Append a previously saved playlist to the queue.
    pub async fn load_playlist(&self, name: &str) {
        let path = self.config.playlist_dir().join(format!("{name}.json"));
        let songs: Result<Vec<SongRef>> = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|body| serde_json::from_str(&body).context("parsing playlist"));
        match songs {
            Ok(songs) => {
                self.model
                    .push_log(format!("Loaded playlist: {name}"))
                    .await;
                self.load_refs(songs).await;
            }
            Err(err) => {
                warn!("loading playlist {name} failed: {err:#}");
                self.model
                    .set_error(format!("Couldn't load playlist: {err}"))
                    .await;
            }
        }
    }

    pub async fn quit(&self) {
        self.model.set_should_quit().await;
    }

    pub async fn handle_media_command(&self, command: MediaCommand) {
        match command {
            MediaCommand::PlayPause => self.toggle_pause().await,
            MediaCommand::Play => self.resume_playback().await,
            MediaCommand::Pause => self.pause_playback().await,
            MediaCommand::Next => self.next_song().await,
            MediaCommand::Previous => self.previous_song().await,
            MediaCommand::SeekBy(delta_secs) => self.seek_by(delta_secs).await,
        }
    }

    /// Expand any playlist URLs seeded at startup into individual tracks,
    /// each in its own background task so fetch latency never blocks the UI.
    pub async fn expand_initial_playlists(&self) {
        let urls: Vec<SongRef> = {
            let queue = self.model.queue.lock().await;
            queue
                .pending_iter()
                .filter(|song| {
                    matches!(song, SongRef::Raw(s) if resolver::is_playlist_url(s))
                })
                .cloned()
                .collect()
        };
        for entry in urls {
            let controller = self.clone();
            tokio::spawn(async move {
                let SongRef::Raw(url) = &entry else { return };
                let tracks = resolver::expand_playlist(url).await;
                if tracks.is_empty() {
                    controller
                        .model
                        .set_error(format!("Playlist came back empty: {url}"))
                        .await;
                    return;
                }
                let count = tracks.len();
                let replaced = {
                    let mut queue = controller.model.queue.lock().await;
                    queue.replace_entry(&entry, tracks)
                };
                if replaced {
                    controller
                        .model
                        .push_log(format!("Expanded playlist into {count} songs"))
                        .await;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::{Config, Settings};
    use crate::model::{AppModel, RepeatMode, SongRef};

    use super::super::AppController;

    fn controller_with(settings: Settings) -> AppController {
        let model = AppModel::new(false);
        AppController::new(model, Arc::new(Config::new(settings)))
    }

    #[tokio::test]
    async fn previous_without_history_surfaces_error() {
        let controller = controller_with(Settings::default());
        controller.previous_song().await;
        assert!(controller.model.has_error().await);
        assert!(controller.model.queue.lock().await.is_empty());
    }

    #[tokio::test]
    async fn cycle_repeat_walks_all_modes() {
        let controller = controller_with(Settings::default());
        controller.cycle_repeat().await;
        assert_eq!(
            controller.model.transport.lock().await.repeat,
            RepeatMode::All
        );
        controller.cycle_repeat().await;
        assert_eq!(
            controller.model.transport.lock().await.repeat,
            RepeatMode::Single
        );
        controller.cycle_repeat().await;
        assert_eq!(
            controller.model.transport.lock().await.repeat,
            RepeatMode::Off
        );
    }

    #[tokio::test]
    async fn playlist_round_trip_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.playlist_dir = dir.path().to_path_buf();
        let controller = controller_with(settings);

        controller.add_song("first song title").await;
        controller.add_song("https://example.com/track").await;
        controller.save_playlist("road-trip").await;

        let reloaded = controller_with({
            let mut s = Settings::default();
            s.general.playlist_dir = dir.path().to_path_buf();
            s
        });
        reloaded.load_playlist("road-trip").await;

        let queue = reloaded.model.queue.lock().await;
        let pending: Vec<SongRef> = queue.pending_iter().cloned().collect();
        assert_eq!(
            pending,
            vec![
                SongRef::Raw("first song title song".into()),
                SongRef::Raw("https://example.com/track".into()),
            ]
        );
    }

    #[tokio::test]
    async fn remove_last_on_empty_queue_sets_error() {
        let controller = controller_with(Settings::default());
        controller.remove_last_queued().await;
        assert!(controller.model.has_error().await);
    }
}
