//! Song resolution and fetching
//!
//! Everything network-bound lives here, behind three operations consumed by
//! the scheduler: fast stream resolution (play immediately, no download),
//! full download (cache fill and fallback path), and playlist expansion.
//! All three shell out to `yt-dlp`; Spotify playlists are scraped from the
//! web page and PLS radio lists are parsed directly.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Result};
use regex_lite::Regex;
use serde_json::Value;
use tokio::process::Command;

use crate::config::Config;
use crate::model::cache;
use crate::model::{SongMeta, SongRef};

/// Fast extraction of a directly playable stream URL, no download.
pub async fn resolve_stream(song: &SongRef) -> Result<(SongMeta, String)> {
    let target = song.resolve_target();
    let output = Command::new("yt-dlp")
        .args([
            "-j",
            "--no-warnings",
            "-f",
            "bestaudio/best",
            "--default-search",
            "ytsearch",
            "--no-playlist",
        ])
        .arg(&target)
        .stdin(Stdio::null())
        .output()
        .await
        .context("spawning yt-dlp")?;

    if !output.status.success() {
        bail!(
            "yt-dlp stream extraction failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let info: Value = serde_json::from_slice(&output.stdout).context("parsing yt-dlp output")?;
    let info = first_entry(info);

    let stream_url = info["url"]
        .as_str()
        .ok_or_else(|| anyhow!("no stream URL in yt-dlp output"))?
        .to_string();

    Ok((meta_from_info(&info), stream_url))
}

/// Full audio download into the cache (or a temp dir when smart download is
/// off). Eviction runs before and after so the cache never overshoots its
/// budget by more than one song.
pub async fn download(song: &SongRef, config: &Config) -> Result<(SongMeta, PathBuf)> {
    let target_dir = if config.is_smart_download_enabled() {
        let dir = config.music_dir().clone();
        std::fs::create_dir_all(&dir)?;
        cache::evict(
            &dir,
            config.max_songs(),
            config.max_storage_mb(),
            config.is_permanent_mode(),
        );
        dir
    } else {
        let dir = std::env::temp_dir().join("ymp-rs");
        std::fs::create_dir_all(&dir)?;
        dir
    };

    let template = target_dir.join("%(artist,uploader)s - %(title)s.%(ext)s");
    let target = song.resolve_target();

    let output = Command::new("yt-dlp")
        .args([
            "-f",
            "bestaudio/best",
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "0",
            "--add-metadata",
            "--no-overwrites",
            "--continue",
            "--default-search",
            "ytsearch",
            "--no-playlist",
            "--no-warnings",
            "--no-simulate",
            "--print",
            "pre_process:%(title)s",
            "--print",
            "pre_process:%(artist,uploader|)s",
            "--print",
            "pre_process:%(duration|0)s",
            "--print",
            "after_move:filepath",
            "-o",
        ])
        .arg(&template)
        .arg(&target)
        .stdin(Stdio::null())
        .output()
        .await
        .context("spawning yt-dlp")?;

    if !output.status.success() {
        bail!(
            "yt-dlp download failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    if lines.len() < 4 {
        bail!("yt-dlp download produced no file path");
    }

    let artist = lines[1].trim();
    let meta = SongMeta {
        url: None,
        title: lines[0].trim().to_string(),
        artist: (!artist.is_empty()).then(|| artist.to_string()),
        duration_secs: lines[2].trim().parse::<f64>().ok().map(|d| d as u64),
    };
    let path = PathBuf::from(lines[3].trim());

    if config.is_smart_download_enabled() {
        cache::evict(
            &target_dir,
            config.max_songs(),
            config.max_storage_mb(),
            config.is_permanent_mode(),
        );
    }

    tracing::info!(title = %meta.title, path = %path.display(), "Download complete");
    Ok((meta, path))
}

/// Expand a playlist URL into individual entries without downloading.
/// Returns an empty list on any failure.
pub async fn expand_playlist(url: &str) -> Vec<SongRef> {
    let output = Command::new("yt-dlp")
        .args(["--flat-playlist", "-J", "--no-warnings"])
        .arg(url)
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            tracing::warn!(
                url,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Playlist expansion failed"
            );
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "Could not run yt-dlp for playlist expansion");
            return Vec::new();
        }
    };

    let Ok(info) = serde_json::from_slice::<Value>(&output.stdout) else {
        return Vec::new();
    };

    info["entries"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|entry| SongRef::Meta(meta_from_info(entry)))
                .collect()
        })
        .unwrap_or_default()
}

/// True for URLs that point at a whole playlist rather than a single video.
pub fn is_playlist_url(s: &str) -> bool {
    s.contains("list=") && (s.starts_with("http://") || s.starts_with("https://"))
}

fn first_entry(info: Value) -> Value {
    match info.get("entries").and_then(|e| e.as_array()) {
        Some(entries) if !entries.is_empty() => entries[0].clone(),
        _ => info,
    }
}

fn meta_from_info(info: &Value) -> SongMeta {
    SongMeta {
        url: info["webpage_url"]
            .as_str()
            .or_else(|| info["url"].as_str())
            .map(String::from),
        title: info["title"].as_str().unwrap_or("Unknown").to_string(),
        artist: info["artist"]
            .as_str()
            .or_else(|| info["uploader"].as_str())
            .map(String::from),
        duration_secs: info["duration"].as_f64().map(|d| d as u64),
    }
}

// ============================================================================
// Spotify playlist scraping
// ============================================================================

/// Scrape a Spotify playlist page into "title artist" search queries.
///
/// Relies on the embedded `Spotify.Entity` JSON blob, which Spotify can
/// change at any time; every failure mode degrades to an empty list.
pub async fn scrape_spotify_playlist(url: &str) -> Vec<SongRef> {
    tracing::info!(url, "Fetching Spotify playlist page");
    let html = match fetch_text(url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(url, error = %e, "Spotify page fetch failed");
            return Vec::new();
        }
    };

    let Some(entity) = extract_spotify_entity(&html) else {
        tracing::warn!(url, "Spotify page structure changed, no entity data found");
        return Vec::new();
    };

    let tracks = tracks_from_entity(&entity);
    tracing::info!(
        playlist = entity["name"].as_str().unwrap_or("?"),
        count = tracks.len(),
        "Spotify playlist parsed"
    );
    tracks
}

fn extract_spotify_entity(html: &str) -> Option<Value> {
    let re = Regex::new(r"Spotify\.Entity = (.*);").ok()?;
    let captures = re.captures(html)?;
    serde_json::from_str(captures.get(1)?.as_str()).ok()
}

fn tracks_from_entity(entity: &Value) -> Vec<SongRef> {
    let Some(items) = entity["tracks"]["items"].as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let track = &item["track"];
            let name = track["name"].as_str()?;
            let mut query = name.to_string();
            if let Some(artists) = track["artists"].as_array() {
                for artist in artists {
                    if let Some(artist_name) = artist["name"].as_str() {
                        query.push(' ');
                        query.push_str(artist_name);
                    }
                }
            }
            Some(SongRef::Raw(query))
        })
        .collect()
}

// ============================================================================
// PLS radio playlists
// ============================================================================

/// Parse PLS content: every `FileN=` line (key matched case-insensitively)
/// yields one URL, in declaration order.
pub fn parse_pls(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if !line.to_lowercase().starts_with("file") {
                return None;
            }
            let (_, value) = line.split_once('=')?;
            Some(value.trim().to_string())
        })
        .collect()
}

/// Load a PLS playlist from a local path or URL.
pub async fn load_pls(source: &str) -> Result<Vec<String>> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_text(source).await?
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {}", source))?
    };

    let urls = parse_pls(&content);
    if urls.is_empty() {
        tracing::warn!(source, "No entries found in PLS file");
    } else {
        tracing::info!(source, count = urls.len(), "PLS entries loaded");
    }
    Ok(urls)
}

async fn fetch_text(url: &str) -> Result<String> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pls_yields_file_entries_in_order() {
        let content = "[playlist]\n\
                       File1=http://example.com/song1.mp3\n\
                       Title1=Song 1\n\
                       File2=http://example.com/song2.mp3\n\
                       Title2=Song 2\n\
                       NumberOfEntries=2\n";
        let urls = parse_pls(content);
        assert_eq!(
            urls,
            vec![
                "http://example.com/song1.mp3".to_string(),
                "http://example.com/song2.mp3".to_string(),
            ]
        );
    }

    #[test]
    fn pls_file_key_is_case_insensitive() {
        let content = "FILE1=http://a.example/one\nfile2 = http://a.example/two\n";
        let urls = parse_pls(content);
        assert_eq!(urls, vec!["http://a.example/one", "http://a.example/two"]);
    }

    #[test]
    fn pls_ignores_unrelated_lines() {
        let content = "[playlist]\nTitle1=radio\nLength1=-1\nVersion=2\n";
        assert!(parse_pls(content).is_empty());
    }

    #[test]
    fn spotify_entity_is_extracted_from_script_tag() {
        let entity_json = r#"{"name":"Mix","tracks":{"items":[{"track":{"name":"Song A","artists":[{"name":"Artist X"}]}},{"track":{"name":"Song B","artists":[{"name":"Y"},{"name":"Z"}]}}]}}"#;
        let html = format!(
            "<html><script>\n  Spotify.Entity = {};\n</script></html>",
            entity_json
        );
        let html = html.as_str();

        let entity = extract_spotify_entity(html).expect("entity not found");
        let tracks = tracks_from_entity(&entity);
        assert_eq!(
            tracks,
            vec![
                SongRef::Raw("Song A Artist X".to_string()),
                SongRef::Raw("Song B Y Z".to_string()),
            ]
        );
    }

    #[test]
    fn missing_entity_returns_none() {
        assert!(extract_spotify_entity("<html><script>var x = 1;</script></html>").is_none());
    }

    #[test]
    fn meta_prefers_artist_over_uploader() {
        let info = json!({
            "title": "Track",
            "artist": "Real Artist",
            "uploader": "SomeChannel",
            "webpage_url": "https://example.com/v",
            "duration": 215.3,
        });
        let meta = meta_from_info(&info);
        assert_eq!(meta.artist.as_deref(), Some("Real Artist"));
        assert_eq!(meta.duration_secs, Some(215));
        assert_eq!(meta.url.as_deref(), Some("https://example.com/v"));
    }

    #[test]
    fn playlist_url_detection() {
        assert!(is_playlist_url("https://youtube.com/watch?v=a&list=PL123"));
        assert!(!is_playlist_url("https://youtube.com/watch?v=a"));
        assert!(!is_playlist_url("queen list=greatest"));
    }
}
