//! Smart-download cache eviction
//!
//! The cache directory is treated as an unordered set of audio files with
//! two independent budget dimensions: file count and total size. Eviction is
//! oldest-modification-time first — a proxy for "downloaded longest ago",
//! not LRU by access. Playback touches a cached file's mtime before use so
//! it ranks as freshest.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus", "ogg", "oga", "flac", "wav", "webm"];

struct CacheEntry {
    path: PathBuf,
    mtime: SystemTime,
    size: u64,
}

/// Enforce the cache limits on `dir`.
///
/// No-op when `permanent` is set or when both limits are zero (zero means
/// unlimited for that dimension). Deletion failures are logged and skipped,
/// never fatal, never retried.
pub fn evict(dir: &Path, max_songs: u64, max_storage_mb: u64, permanent: bool) {
    if permanent {
        tracing::debug!("Permanent mode active, skipping cache eviction");
        return;
    }
    if max_songs == 0 && max_storage_mb == 0 {
        return;
    }
    if !dir.exists() {
        return;
    }

    let mut entries = scan(dir);
    entries.sort_by_key(|e| e.mtime);

    // Pass 1: file count.
    if max_songs > 0 {
        while entries.len() > max_songs as usize {
            let oldest = entries.remove(0);
            remove_entry(&oldest.path, "song limit");
        }
    }

    // Pass 2: total size.
    if max_storage_mb > 0 {
        let mut total: u64 = entries.iter().map(|e| e.size).sum();
        let budget = max_storage_mb * 1024 * 1024;
        while total > budget && !entries.is_empty() {
            let oldest = entries.remove(0);
            total = total.saturating_sub(oldest.size);
            remove_entry(&oldest.path, "storage limit");
        }
    }
}

/// Update a cached file's mtime so eviction treats it as freshest.
pub fn touch(path: &Path) {
    let result = fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(SystemTime::now()));
    if let Err(e) = result {
        tracing::debug!(path = %path.display(), error = %e, "Could not touch cache entry");
    }
}

fn scan(dir: &Path) -> Vec<CacheEntry> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(CacheEntry {
                path: entry.into_path(),
                mtime: metadata.modified().ok()?,
                size: metadata.len(),
            })
        })
        .collect()
}

fn remove_entry(path: &Path, reason: &str) {
    match fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), reason, "Evicted cached song"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not evict cached song"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_song(dir: &Path, name: &str, bytes: &[u8], age: Duration) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        let mtime = SystemTime::now() - age;
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        path
    }

    #[test]
    fn count_limit_evicts_exactly_oldest() {
        let dir = TempDir::new().unwrap();
        let oldest = write_song(dir.path(), "a.mp3", b"aaa", Duration::from_secs(300));
        let mid = write_song(dir.path(), "b.mp3", b"bbb", Duration::from_secs(200));
        let newest = write_song(dir.path(), "c.mp3", b"ccc", Duration::from_secs(100));

        evict(dir.path(), 2, 0, false);

        assert!(!oldest.exists());
        assert!(mid.exists());
        assert!(newest.exists());
    }

    #[test]
    fn permanent_mode_disables_eviction() {
        let dir = TempDir::new().unwrap();
        let a = write_song(dir.path(), "a.mp3", b"aaa", Duration::from_secs(300));
        let b = write_song(dir.path(), "b.mp3", b"bbb", Duration::from_secs(200));

        evict(dir.path(), 1, 1, true);

        assert!(a.exists());
        assert!(b.exists());
    }

    #[test]
    fn zero_limits_mean_unlimited() {
        let dir = TempDir::new().unwrap();
        let a = write_song(dir.path(), "a.mp3", b"aaa", Duration::from_secs(300));

        evict(dir.path(), 0, 0, false);
        assert!(a.exists());
    }

    #[test]
    fn non_audio_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let cover = write_song(dir.path(), "cover.jpg", b"img", Duration::from_secs(500));
        let song = write_song(dir.path(), "a.mp3", b"aaa", Duration::from_secs(100));

        evict(dir.path(), 1, 0, false);

        assert!(cover.exists());
        assert!(song.exists());
    }

    #[test]
    fn nested_directories_are_scanned() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("artist");
        fs::create_dir(&sub).unwrap();
        let old = write_song(&sub, "old.mp3", b"aaa", Duration::from_secs(300));
        let new = write_song(dir.path(), "new.mp3", b"bbb", Duration::from_secs(100));

        evict(dir.path(), 1, 0, false);

        assert!(!old.exists());
        assert!(new.exists());
    }

    #[test]
    fn touch_makes_file_freshest() {
        let dir = TempDir::new().unwrap();
        let a = write_song(dir.path(), "a.mp3", b"aaa", Duration::from_secs(300));
        let b = write_song(dir.path(), "b.mp3", b"bbb", Duration::from_secs(100));

        touch(&a);
        evict(dir.path(), 1, 0, false);

        assert!(a.exists());
        assert!(!b.exists());
    }
}
