//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.playpsych.toml` files.

use crate::cli::{Args, Command, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".playpsych.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Text-generation settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Playlist worker settings.
    #[serde(default)]
    pub playlist: PlaylistConfig,

    /// Rating storage settings.
    #[serde(default)]
    pub ratings: RatingsConfig,

    /// Dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Also write reports to this file.
    #[serde(default)]
    pub output: Option<String>,

    /// Report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Gemini model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of the models endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key. Usually supplied through `GEMINI_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Use the built-in keyword analysis instead of the remote model.
    #[serde(default)]
    pub offline: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            endpoint: default_endpoint(),
            api_key: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_seconds: default_timeout(),
            offline: false,
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_timeout() -> u64 {
    60
}

/// Playlist worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    /// Base URL of the playlist scraping worker.
    #[serde(default = "default_worker_url")]
    pub worker_url: String,

    /// Artists included in the prompt.
    #[serde(default = "default_max_artists")]
    pub max_artists: usize,

    /// Sample tracks included in the prompt.
    #[serde(default = "default_max_tracks")]
    pub max_tracks: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            worker_url: default_worker_url(),
            max_artists: default_max_artists(),
            max_tracks: default_max_tracks(),
        }
    }
}

fn default_worker_url() -> String {
    "https://spotify-scraper.i-nidhivaid.workers.dev".to_string()
}

fn default_max_artists() -> usize {
    15
}

fn default_max_tracks() -> usize {
    20
}

/// Which rating store to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Google Sheets values API.
    Sheets,
    /// JSON file on disk.
    #[default]
    Local,
}

/// Rating storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Spreadsheet ID for the sheets backend.
    #[serde(default)]
    pub sheet_id: String,

    /// Sheet (tab) name.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Sheets API key for reading. Usually supplied through `SHEETS_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth access token for appending rows. Usually supplied through
    /// `SHEETS_ACCESS_TOKEN` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Ratings file for the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sheet_id: String::new(),
            sheet_name: default_sheet_name(),
            api_key: None,
            access_token: None,
            local_path: default_local_path(),
        }
    }
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_local_path() -> String {
    "playpsych_ratings.json".to_string()
}

/// Dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows considered for the recent feedback list.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    /// Show the newest ratings first.
    #[serde(default = "default_true")]
    pub newest_first: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            newest_first: true,
        }
    }
}

fn default_recent_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only where they were given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if args.gemini_api_key.is_some() {
            self.model.api_key = args.gemini_api_key.clone();
        }
        if args.sheets_api_key.is_some() {
            self.ratings.api_key = args.sheets_api_key.clone();
        }
        if args.sheets_access_token.is_some() {
            self.ratings.access_token = args.sheets_access_token.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        match &args.command {
            Command::Analyze(analyze) => {
                if let Some(ref model) = analyze.model {
                    self.model.name = model.clone();
                }
                if let Some(temperature) = analyze.temperature {
                    self.model.temperature = temperature;
                }
                if analyze.offline {
                    self.model.offline = true;
                }
                if let Some(ref worker_url) = analyze.worker_url {
                    self.playlist.worker_url = worker_url.clone();
                }
            }
            Command::Dashboard(dashboard) => {
                if let Some(recent) = dashboard.recent {
                    self.dashboard.recent_limit = recent;
                }
                if dashboard.oldest_first {
                    self.dashboard.newest_first = false;
                }
            }
            Command::Rate(_) | Command::InitConfig => {}
        }
    }

    /// Log level after merging, so `verbose = true` in the file counts
    /// like `--verbose`. Quiet mode still wins.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "gemini-2.5-flash");
        assert_eq!(config.playlist.max_artists, 15);
        assert_eq!(config.playlist.max_tracks, 20);
        assert_eq!(config.dashboard.recent_limit, 10);
        assert_eq!(config.ratings.backend, StoreBackend::Local);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
format = "json"
verbose = true

[model]
name = "gemini-2.5-pro"
temperature = 0.2

[ratings]
backend = "sheets"
sheet_id = "1HBA"

[dashboard]
recent_limit = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(config.general.verbose);
        assert_eq!(config.model.name, "gemini-2.5-pro");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.model.timeout_seconds, 60);
        assert_eq!(config.ratings.backend, StoreBackend::Sheets);
        assert_eq!(config.ratings.sheet_id, "1HBA");
        assert_eq!(config.ratings.sheet_name, "Sheet1");
        assert_eq!(config.dashboard.recent_limit, 5);
        assert!(config.dashboard.newest_first);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[playlist]"));
        assert!(toml_str.contains("[ratings]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(!toml_str.contains("api_key"));
        assert!(!toml_str.contains("access_token"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.model.name, "gemini-2.5-flash");
    }

    #[test]
    fn test_merge_with_analyze_args() {
        let args = Args::parse_from([
            "playpsych",
            "--format",
            "json",
            "analyze",
            "--describe",
            "indie folk",
            "--model",
            "gemini-2.5-pro",
            "--offline",
        ]);

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.model.name, "gemini-2.5-pro");
        assert!(config.model.offline);
        assert_eq!(config.dashboard.recent_limit, 10);
    }

    #[test]
    fn test_log_level_from_file_and_flags() {
        let from_file: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(from_file.log_level(false), tracing::Level::DEBUG);
        assert_eq!(from_file.log_level(true), tracing::Level::ERROR);

        let mut config = Config::default();
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        config.merge_with_args(&Args::parse_from(["playpsych", "-v", "dashboard"]));
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
    }

    #[test]
    fn test_merge_keeps_file_values_when_flags_absent() {
        let args = Args::parse_from(["playpsych", "dashboard", "--recent", "3"]);

        let mut config = Config::default();
        config.general.format = OutputFormat::Json;
        config.model.name = "from-file".to_string();
        config.merge_with_args(&args);

        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.model.name, "from-file");
        assert_eq!(config.dashboard.recent_limit, 3);
    }
}
