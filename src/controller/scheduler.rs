//! Background scheduler.
//!
//! A single polling task drives everything that has to happen without user
//! input: noticing a finished song, pulling the next entry off the queue,
//! and preloading the upcoming song into the cache. Each tick takes the
//! transport snapshot once and acts on exactly one of the three concerns.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::model::{RepeatMode, cache};
use crate::resolver;

use super::AppController;

const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Run the scheduler until the quit flag is set.
pub fn spawn_scheduler(controller: AppController) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            if controller.model.should_quit().await {
                break;
            }
            controller.tick().await;
        }
        debug!("scheduler stopped");
    })
}

impl AppController {
    pub(crate) async fn tick(&self) {
        let (active, paused, running, elapsed_ms) = {
            let mut transport = self.model.transport.lock().await;
            (
                transport.is_active(),
                transport.is_paused(),
                transport.handle_running(),
                transport.elapsed_ms(),
            )
        };

        // A live handle that exited while unpaused means the song ended
        // (or was skipped). Paused songs keep their dead handle on purpose
        // and must not be treated as finished.
        if active && !paused && !running {
            self.handle_song_finished().await;
            return;
        }

        if active {
            if !paused {
                self.check_preload(elapsed_ms / 1000).await;
            }
            return;
        }

        let queue_has_next = !self.model.queue.lock().await.is_empty();
        if queue_has_next && self.model.try_begin_fetch().await {
            let controller = self.clone();
            tokio::spawn(async move {
                controller.fetch_and_play().await;
                controller.model.end_fetch().await;
            });
        }
    }

    /// Apply the repeat mode to the queue, then clear the transport so the
    /// next tick starts the fetch path.
    pub(crate) async fn handle_song_finished(&self) {
        let repeat = self.model.transport.lock().await.repeat;
        {
            let mut queue = self.model.queue.lock().await;
            match repeat {
                RepeatMode::Single => {
                    queue.shift_last_played_to_front();
                }
                RepeatMode::All => {
                    if queue.is_empty() {
                        queue.loop_all();
                    }
                }
                RepeatMode::Off => {}
            }
        }
        if let Some(finished) = self.model.transport.lock().await.clear_finished() {
            info!("finished: {}", finished.title);
            self.model
                .push_log(format!("Finished: {}", finished.title))
                .await;
        }
    }

    /// Resolve the next queue entry and start playback. Streaming is tried
    /// first; on failure the song is downloaded and played from disk. If
    /// both fail the song is dropped and the loop moves on.
    async fn fetch_and_play(&self) {
        let Some(song) = self.model.queue.lock().await.pop_next() else {
            return;
        };
        self.model
            .push_log(format!("Fetching: {}", song.display_title()))
            .await;

        match resolver::resolve_stream(&song).await {
            Ok((meta, stream_url)) => {
                self.model
                    .push_log(format!("Streaming: {}", meta.title))
                    .await;
                self.model.transport.lock().await.begin(meta, stream_url).await;
                self.model.clear_preload_dispatched().await;
                if self.config.is_smart_download_enabled() {
                    // Cache a local copy in the background so the song plays
                    // offline next time.
                    let song = song.clone();
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        if let Err(err) = resolver::download(&song, &config).await {
                            debug!("background cache download failed: {err:#}");
                        }
                    });
                }
            }
            Err(err) => {
                debug!("stream resolution failed for {}: {err:#}", song.display_title());
                self.model
                    .push_log("Streaming unavailable, downloading instead")
                    .await;
                match resolver::download(&song, &self.config).await {
                    Ok((meta, path)) => {
                        cache::touch(&path);
                        self.model
                            .push_log(format!("Playing: {}", meta.title))
                            .await;
                        self.model
                            .transport
                            .lock()
                            .await
                            .begin(meta, path.display().to_string())
                            .await;
                        self.model.clear_preload_dispatched().await;
                    }
                    Err(err) => {
                        error!("dropping {}: {err:#}", song.display_title());
                        self.model
                            .set_error(format!("Couldn't play: {}", song.display_title()))
                            .await;
                    }
                }
            }
        }
    }

    /// Once enough of the current song has played, download the next one in
    /// the background. The dispatched set keeps this to one attempt per
    /// song per playback cycle.
    async fn check_preload(&self, elapsed_secs: i64) {
        if !self.config.is_preload_enabled() {
            return;
        }
        if elapsed_secs <= self.config.preload_trigger_secs() as i64 {
            return;
        }
        let Some(next) = self.model.queue.lock().await.peek_next().cloned() else {
            return;
        };
        if !self.model.mark_preload_dispatched(&next.identity()).await {
            return;
        }
        self.model
            .push_log(format!("Preloading: {}", next.display_title()))
            .await;
        let config = self.config.clone();
        tokio::spawn(async move {
            match resolver::download(&next, &config).await {
                Ok((meta, _)) => debug!("preloaded: {}", meta.title),
                Err(err) => debug!("preload failed for {}: {err:#}", next.display_title()),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::{Config, Settings};
    use crate::model::{AppModel, RepeatMode, SongMeta, SongRef};

    use super::super::AppController;

    fn controller() -> AppController {
        AppController::new(AppModel::new(false), Arc::new(Config::new(Settings::default())))
    }

    fn meta(title: &str) -> SongMeta {
        SongMeta {
            url: Some(format!("https://example.com/{title}")),
            title: title.into(),
            artist: Some("tester".into()),
            duration_secs: Some(180),
        }
    }

    async fn play_then_stop(controller: &AppController, title: &str) {
        let mut queue = controller.model.queue.lock().await;
        queue.push(SongRef::Meta(meta(title)));
        let song = queue.pop_next().unwrap();
        drop(queue);
        let mut transport = controller.model.transport.lock().await;
        let SongRef::Meta(m) = song else { unreachable!() };
        let source = m.url.clone().unwrap();
        transport.begin(m, source).await;
        transport.stop_for_skip().await;
    }

    #[tokio::test]
    async fn finished_song_with_repeat_single_returns_to_front() {
        let controller = controller();
        controller.model.transport.lock().await.repeat = RepeatMode::Single;
        play_then_stop(&controller, "again").await;

        controller.handle_song_finished().await;

        let queue = controller.model.queue.lock().await;
        assert_eq!(
            queue.peek_next().unwrap().display_title(),
            "again"
        );
        assert!(!controller.model.transport.lock().await.is_active());
    }

    #[tokio::test]
    async fn repeat_all_recycles_history_once_pending_drains() {
        let controller = controller();
        controller.model.transport.lock().await.repeat = RepeatMode::All;
        play_then_stop(&controller, "only").await;

        controller.handle_song_finished().await;

        let queue = controller.model.queue.lock().await;
        let pending: Vec<&str> = queue.pending_iter().map(|s| s.display_title()).collect();
        assert_eq!(pending, vec!["only"]);
        assert_eq!(queue.history_iter().count(), 0);
    }

    #[tokio::test]
    async fn repeat_all_waits_for_pending_to_drain() {
        let controller = controller();
        controller.model.transport.lock().await.repeat = RepeatMode::All;
        play_then_stop(&controller, "played").await;
        {
            let mut queue = controller.model.queue.lock().await;
            queue.push(SongRef::Meta(meta("waiting")));
        }

        controller.handle_song_finished().await;

        let queue = controller.model.queue.lock().await;
        let pending: Vec<&str> = queue.pending_iter().map(|s| s.display_title()).collect();
        assert_eq!(pending, vec!["waiting"]);
        assert_eq!(queue.history_iter().count(), 1);
    }

    #[tokio::test]
    async fn finished_song_with_repeat_off_leaves_queue_alone() {
        let controller = controller();
        play_then_stop(&controller, "once").await;

        controller.handle_song_finished().await;

        let queue = controller.model.queue.lock().await;
        assert!(queue.is_empty());
        assert_eq!(queue.history_iter().count(), 1);
    }
}
