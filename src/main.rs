mod audio;
mod config;
mod controller;
mod lock;
mod logging;
mod model;
mod mpris;
mod resolver;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use config::{Config, Settings};
use controller::{AppController, spawn_scheduler};
use lock::InstanceLock;
use model::AppModel;
use mpris::{MediaBridge, MediaCommand};
use view::AppView;

/// Terminal music player that streams and caches songs via yt-dlp.
#[derive(Parser, Debug)]
#[command(name = "ymp-rs", version, about)]
struct Cli {
    /// Songs or URLs to queue, in order. A `.pls` file or playlist URL is
    /// expanded into its tracks.
    #[arg(value_name = "SONG")]
    songs: Vec<String>,

    /// Queue every track of a public Spotify playlist.
    #[arg(short = 's', long = "spotify", value_name = "URL")]
    spotify: Option<String>,

    /// Queue a YouTube video or playlist URL.
    #[arg(short = 'y', long = "youtube", value_name = "URL")]
    youtube: Option<String>,

    /// Additional songs or URLs to queue after the positional ones.
    #[arg(short = 'p', long = "play", value_name = "SONG", num_args = 1..)]
    play: Vec<String>,

    /// Load a previously saved playlist by name.
    #[arg(short = 'l', long = "load", value_name = "NAME")]
    playlist: Option<String>,

    /// Keep every cached song for this run; never evict.
    #[arg(long)]
    permanent: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== ymp-rs starting ===");

    let cli = Cli::parse();

    let settings = Settings::load()?;
    let config = Arc::new(Config::new(settings));
    if cli.permanent {
        config.set_runtime_permanent(true);
    }

    // Two players would fight over the cache and the audio device.
    let _lock = match InstanceLock::acquire(config::config_dir().join("ymp-rs.lock")) {
        Ok(lock) => lock,
        Err(err) => {
            eprintln!("Another ymp-rs instance is already running: {err}");
            std::process::exit(1);
        }
    };

    let audio = audio::audio_available();
    if !audio {
        tracing::warn!("no audio device found, running with silent playback");
    }

    let model = AppModel::new(audio);
    let controller = AppController::new(model.clone(), config.clone());

    seed_queue(&controller, &cli).await;

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let media_bridge = MediaBridge::new(media_tx);

    let scheduler = spawn_scheduler(controller.clone());
    controller.expand_initial_playlists().await;

    let res = run_app(&mut terminal, controller.clone(), media_bridge, media_rx).await;

    controller.model.transport.lock().await.shutdown().await;
    scheduler.abort();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("ymp-rs shutting down");
    Ok(())
}

/// Turn the CLI arguments into initial queue entries. Local `.pls` files
/// and remote playlists are resolved before the queue is seeded so playback
/// starts with real songs at the front.
async fn seed_queue(controller: &AppController, cli: &Cli) {
    for entry in cli.songs.iter().chain(cli.play.iter()) {
        if entry.to_lowercase().ends_with(".pls") {
            match resolver::load_pls(entry).await {
                Ok(titles) => {
                    for title in titles {
                        controller.add_song(&title).await;
                    }
                }
                Err(err) => {
                    tracing::warn!("couldn't read playlist file {entry}: {err:#}");
                    controller
                        .model
                        .set_error(format!("Couldn't read playlist: {entry}"))
                        .await;
                }
            }
        } else {
            controller.add_song(entry).await;
        }
    }

    if let Some(url) = &cli.youtube {
        controller.add_song(url).await;
    }

    if let Some(url) = &cli.spotify {
        let tracks = resolver::scrape_spotify_playlist(url).await;
        if tracks.is_empty() {
            controller
                .model
                .set_error("Spotify playlist came back empty".into())
                .await;
        } else {
            controller.load_refs(tracks).await;
        }
    }

    if let Some(name) = &cli.playlist {
        controller.load_playlist(name).await;
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: AppController,
    mut media_bridge: MediaBridge,
    mut media_rx: mpsc::UnboundedReceiver<MediaCommand>,
) -> io::Result<()> {
    // Only push MPRIS updates when something actually changed.
    let mut last_reported_title: Option<String> = None;

    loop {
        controller.model.auto_clear_old_errors().await;

        let snapshot = controller.model.view_snapshot().await;

        terminal.draw(|f| {
            AppView::render(f, &snapshot);
        })?;

        while let Ok(command) = media_rx.try_recv() {
            controller.handle_media_command(command).await;
        }

        if snapshot.playback.title != last_reported_title {
            if let Some(title) = &snapshot.playback.title {
                media_bridge.update_metadata(
                    title,
                    snapshot.playback.artist.as_deref(),
                    snapshot.playback.duration_secs,
                );
            }
            last_reported_title = snapshot.playback.title.clone();
        }
        media_bridge.update_status(
            snapshot.playback.title.is_some(),
            snapshot.playback.paused,
            snapshot.playback.elapsed_ms,
        );

        // Handle input with shorter poll time for smoother UI updates
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                controller.handle_key_event(key).await;
            }
        }

        if controller.model.should_quit().await {
            break;
        }
    }

    Ok(())
}
