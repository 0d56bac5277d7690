//! Configuration surface
//!
//! Settings are read from `~/.config/ymp-rs/config.toml` (written with
//! defaults on first run). The permanent-mode override is explicit state on
//! the [`Config`] object so the cache manager and tests see it as a plain
//! flag instead of ambient global state; it disables eviction for the rest
//! of the process lifetime, or until unset.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: General,
    pub smart_download: SmartDownload,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    pub music_dir: PathBuf,
    pub playlist_dir: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartDownload {
    pub enabled: bool,
    /// Persisted counterpart of the runtime override: never evict.
    pub permanent_mode: bool,
    /// Number of cached songs to keep; 0 = unlimited.
    pub max_songs: u64,
    /// Cache size budget in MB; 0 = unlimited.
    pub max_storage_mb: u64,
    pub preload_enabled: bool,
    /// Start fetching the next song once this many seconds have played.
    pub preload_trigger_seconds: u64,
}

impl Default for General {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            music_dir: dirs::audio_dir()
                .unwrap_or_else(|| home.join("Music"))
                .join("ymp-rs"),
            playlist_dir: config_dir().join("playlists"),
        }
    }
}

impl Default for SmartDownload {
    fn default() -> Self {
        Self {
            enabled: true,
            permanent_mode: false,
            max_songs: 10,
            max_storage_mb: 0,
            preload_enabled: true,
            preload_trigger_seconds: 10,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: General::default(),
            smart_download: SmartDownload::default(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ymp-rs")
}

fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

impl Settings {
    /// Load settings, creating the file with defaults when missing.
    pub fn load() -> Result<Self> {
        let path = config_file();
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let settings = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(settings)
        } else {
            let settings = Settings::default();
            settings.save()?;
            Ok(settings)
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Runtime configuration handed to the scheduler, resolver and cache
/// manager. Read-only from their perspective apart from the permanent-mode
/// override.
pub struct Config {
    settings: Settings,
    runtime_permanent: AtomicBool,
}

impl Config {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            runtime_permanent: AtomicBool::new(false),
        }
    }

    pub fn music_dir(&self) -> &PathBuf {
        &self.settings.general.music_dir
    }

    pub fn playlist_dir(&self) -> &PathBuf {
        &self.settings.general.playlist_dir
    }

    pub fn is_smart_download_enabled(&self) -> bool {
        self.settings.smart_download.enabled
    }

    /// Either source being true disables eviction: the process-lifetime
    /// override, or the persisted flag.
    pub fn is_permanent_mode(&self) -> bool {
        self.runtime_permanent.load(Ordering::Relaxed) || self.settings.smart_download.permanent_mode
    }

    pub fn set_runtime_permanent(&self, enabled: bool) {
        self.runtime_permanent.store(enabled, Ordering::Relaxed);
    }

    pub fn max_songs(&self) -> u64 {
        self.settings.smart_download.max_songs
    }

    pub fn max_storage_mb(&self) -> u64 {
        self.settings.smart_download.max_storage_mb
    }

    pub fn is_preload_enabled(&self) -> bool {
        self.settings.smart_download.preload_enabled
    }

    pub fn preload_trigger_secs(&self) -> u64 {
        self.settings.smart_download.preload_trigger_seconds
    }
}
