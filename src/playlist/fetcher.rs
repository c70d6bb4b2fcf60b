//! Playlist worker client.
//!
//! The worker answers `GET {worker}/playlist/{id}` with
//! `{success, name, tracks, artists, trackCount, error}`.

use crate::config::PlaylistConfig;
use crate::models::PlaylistData;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by the playlist worker.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Invalid Spotify playlist URL. Paste a link like https://open.spotify.com/playlist/...")]
    InvalidUrl,

    #[error("Could not fetch playlist: {0}")]
    Worker(String),
}

/// Worker response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkerResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tracks: Vec<String>,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    track_count: usize,
    #[serde(default)]
    error: Option<String>,
}

impl WorkerResponse {
    fn into_playlist(self, playlist_id: &str) -> Result<PlaylistData, PlaylistError> {
        if !self.success {
            return Err(PlaylistError::Worker(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(PlaylistData {
            playlist_id: playlist_id.to_string(),
            name: self.name,
            tracks: self.tracks,
            artists: self.artists,
            track_count: self.track_count,
        })
    }
}

fn playlist_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"playlist/([a-zA-Z0-9]+)").expect("playlist id pattern is valid")
    })
}

/// Pull the playlist ID out of a share link.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    playlist_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Describe a playlist for the analysis prompt.
pub fn format_for_prompt(playlist: &PlaylistData, max_artists: usize, max_tracks: usize) -> String {
    let mut formatted = format!("Analyzing Spotify Playlist: \"{}\"\n\n", playlist.name);

    if !playlist.artists.is_empty() {
        let artists: Vec<&str> = playlist
            .artists
            .iter()
            .take(max_artists)
            .map(String::as_str)
            .collect();
        formatted.push_str(&format!("Top Artists: {}\n\n", artists.join(", ")));
    }

    if !playlist.tracks.is_empty() {
        let tracks: Vec<&str> = playlist
            .tracks
            .iter()
            .take(max_tracks)
            .map(String::as_str)
            .collect();
        formatted.push_str(&format!("Sample Tracks: {}\n\n", tracks.join(", ")));
    }

    formatted.push_str(&format!("Total tracks: {}", playlist.track_count));
    formatted
}

/// Client for the playlist scraping worker.
pub struct PlaylistFetcher {
    http_client: reqwest::Client,
    worker_url: String,
    timeout_seconds: u64,
}

impl PlaylistFetcher {
    pub fn new(config: &PlaylistConfig, timeout_seconds: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            worker_url: config.worker_url.trim_end_matches('/').to_string(),
            timeout_seconds,
        })
    }

    fn playlist_url(&self, playlist_id: &str) -> String {
        format!("{}/playlist/{}", self.worker_url, playlist_id)
    }

    /// Resolve a share link to playlist metadata.
    pub async fn fetch_from_url(&self, url: &str) -> Result<PlaylistData> {
        let playlist_id = extract_playlist_id(url).ok_or(PlaylistError::InvalidUrl)?;
        debug!("Extracted playlist ID: {}", playlist_id);
        self.fetch(&playlist_id).await
    }

    /// Fetch playlist metadata by ID.
    pub async fn fetch(&self, playlist_id: &str) -> Result<PlaylistData> {
        let url = self.playlist_url(playlist_id);
        info!("Fetching playlist from worker: {}", url);

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("Playlist request timed out after {}s", self.timeout_seconds)
            } else if e.is_connect() {
                anyhow::anyhow!("Cannot connect to playlist worker at {}", self.worker_url)
            } else {
                anyhow::anyhow!("Failed to send playlist request: {}", e)
            }
        })?;

        let status = response.status();
        debug!("Worker response status: {}", status);

        let body: WorkerResponse = if status.is_success() {
            response
                .json()
                .await
                .context("Failed to parse playlist worker response")?
        } else {
            // Error bodies usually carry {"error": ...}; fall back to the status
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WorkerResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("Failed to fetch playlist ({})", status));
            return Err(PlaylistError::Worker(message).into());
        };

        let playlist = body.into_playlist(playlist_id)?;
        info!(
            "Playlist \"{}\" resolved: {} tracks, {} artists",
            playlist.name,
            playlist.track_count,
            playlist.artists.len()
        );
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_playlist() -> PlaylistData {
        PlaylistData {
            playlist_id: "abc".to_string(),
            name: "Late Night".to_string(),
            tracks: (1..=25).map(|i| format!("Track {}", i)).collect(),
            artists: vec!["Bon Iver".to_string(), "Tycho".to_string()],
            track_count: 25,
        }
    }

    #[test]
    fn test_extract_playlist_id() {
        assert_eq!(
            extract_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DX4sWSpwq3LiO?si=abc")
                .as_deref(),
            Some("37i9dQZF1DX4sWSpwq3LiO")
        );
        assert_eq!(
            extract_playlist_id("spotify.com/playlist/XYZ123").as_deref(),
            Some("XYZ123")
        );
        assert_eq!(extract_playlist_id("https://open.spotify.com/album/123"), None);
        assert_eq!(extract_playlist_id("https://open.spotify.com/playlist/"), None);
    }

    #[test]
    fn test_format_for_prompt() {
        let formatted = format_for_prompt(&sample_playlist(), 15, 20);

        assert!(formatted.starts_with("Analyzing Spotify Playlist: \"Late Night\""));
        assert!(formatted.contains("Top Artists: Bon Iver, Tycho\n"));
        assert!(formatted.contains("Track 20"));
        assert!(!formatted.contains("Track 21"));
        assert!(formatted.ends_with("Total tracks: 25"));
    }

    #[test]
    fn test_format_for_prompt_empty_lists() {
        let playlist = PlaylistData {
            name: "Empty".to_string(),
            ..PlaylistData::default()
        };
        let formatted = format_for_prompt(&playlist, 15, 20);

        assert!(!formatted.contains("Top Artists"));
        assert!(!formatted.contains("Sample Tracks"));
        assert!(formatted.ends_with("Total tracks: 0"));
    }

    #[test]
    fn test_worker_response_success() {
        let body: WorkerResponse = serde_json::from_str(
            r#"{"success":true,"name":"Mix","tracks":["a"],"artists":["b"],"trackCount":1}"#,
        )
        .unwrap();
        let playlist = body.into_playlist("id1").unwrap();

        assert_eq!(playlist.playlist_id, "id1");
        assert_eq!(playlist.name, "Mix");
        assert_eq!(playlist.track_count, 1);
    }

    #[test]
    fn test_worker_response_failure() {
        let body: WorkerResponse =
            serde_json::from_str(r#"{"success":false,"error":"Playlist is private"}"#).unwrap();
        let err = body.into_playlist("id1").unwrap_err();

        assert_eq!(err.to_string(), "Could not fetch playlist: Playlist is private");
    }

    #[test]
    fn test_playlist_url() {
        let config = PlaylistConfig {
            worker_url: "https://worker.example.dev/".to_string(),
            ..PlaylistConfig::default()
        };
        let fetcher = PlaylistFetcher::new(&config, 10).unwrap();

        assert_eq!(
            fetcher.playlist_url("abc"),
            "https://worker.example.dev/playlist/abc"
        );
    }
}
