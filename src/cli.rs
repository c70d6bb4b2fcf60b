//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Dimension;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Playlist Psychologist - what your music says about you
///
/// Describe your listening (or paste a playlist link), get a three-part
/// personality analysis, rate it, and see how others rated theirs.
///
/// Examples:
///   playpsych analyze --playlist https://open.spotify.com/playlist/37i9dQZF1DX
///   playpsych analyze --describe "indie folk, Bon Iver, some Tycho" --offline
///   playpsych rate --mirror 3 --novelty 1 --actionability 2 --feedback "spot on"
///   playpsych dashboard --format json
///   playpsych init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .playpsych.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Also write the report to this file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Request timeout in seconds for all remote services
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Gemini API key
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Google Sheets API key for the ratings store
    #[arg(long, global = true, env = "SHEETS_API_KEY", hide_env_values = true)]
    pub sheets_api_key: Option<String>,

    /// Google OAuth access token for appending ratings to a sheet
    #[arg(long, global = true, env = "SHEETS_ACCESS_TOKEN", hide_env_values = true)]
    pub sheets_access_token: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a playlist or a description of your music taste
    Analyze(AnalyzeArgs),

    /// Submit a rating for an analysis
    Rate(RatingArgs),

    /// Show aggregate ratings and recent feedback
    Dashboard(DashboardArgs),

    /// Generate a default .playpsych.toml configuration file
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
#[command(group = clap::ArgGroup::new("input").required(true).args(["playlist", "describe"]))]
pub struct AnalyzeArgs {
    /// Spotify playlist URL to resolve through the playlist worker
    #[arg(short, long, value_name = "URL")]
    pub playlist: Option<String>,

    /// Free-text description of your music taste
    #[arg(short, long, value_name = "TEXT")]
    pub describe: Option<String>,

    /// Gemini model to use
    #[arg(short, long, env = "PLAYPSYCH_MODEL")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Use the built-in keyword analysis, no remote model call
    #[arg(long)]
    pub offline: bool,

    /// Playlist worker base URL
    #[arg(long, value_name = "URL")]
    pub worker_url: Option<String>,

    /// Rate the analysis right away (all three scores required together)
    #[command(flatten)]
    pub rating: OptionalRatingArgs,
}

/// Scores given alongside `analyze`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OptionalRatingArgs {
    /// How well it mirrored you (0-3)
    #[arg(long, requires_all = ["novelty", "actionability"])]
    pub mirror: Option<u8>,

    /// How novel the insight was (0-2)
    #[arg(long, requires_all = ["mirror", "actionability"])]
    pub novelty: Option<u8>,

    /// How actionable the steps were (0-2)
    #[arg(long, requires_all = ["mirror", "novelty"])]
    pub actionability: Option<u8>,

    /// Optional written feedback
    #[arg(long, value_name = "TEXT", requires = "mirror")]
    pub feedback: Option<String>,
}

impl OptionalRatingArgs {
    pub fn is_present(&self) -> bool {
        self.mirror.is_some() || self.novelty.is_some() || self.actionability.is_some()
    }

    pub fn scores(&self) -> [(Dimension, Option<u8>); 3] {
        [
            (Dimension::Mirror, self.mirror),
            (Dimension::Novelty, self.novelty),
            (Dimension::Actionability, self.actionability),
        ]
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct RatingArgs {
    /// How well it mirrored you (0-3)
    #[arg(long)]
    pub mirror: u8,

    /// How novel the insight was (0-2)
    #[arg(long)]
    pub novelty: u8,

    /// How actionable the steps were (0-2)
    #[arg(long)]
    pub actionability: u8,

    /// Optional written feedback
    #[arg(long, value_name = "TEXT")]
    pub feedback: Option<String>,
}

impl RatingArgs {
    pub fn scores(&self) -> [(Dimension, Option<u8>); 3] {
        [
            (Dimension::Mirror, Some(self.mirror)),
            (Dimension::Novelty, Some(self.novelty)),
            (Dimension::Actionability, Some(self.actionability)),
        ]
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct DashboardArgs {
    /// Rows to consider for the recent feedback list
    #[arg(long, value_name = "COUNT")]
    pub recent: Option<usize>,

    /// List feedback in store order instead of newest first
    #[arg(long)]
    pub oldest_first: bool,
}

/// Output format for reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        match &self.command {
            Command::Analyze(analyze) => {
                if let Some(ref url) = analyze.playlist {
                    if !url.starts_with("https://") && !url.starts_with("http://") {
                        return Err("Playlist URL must start with 'https://'".to_string());
                    }
                }

                if let Some(ref text) = analyze.describe {
                    if text.trim().is_empty() {
                        return Err("Please describe your music taste".to_string());
                    }
                }

                if let Some(ref worker) = analyze.worker_url {
                    if !worker.starts_with("http://") && !worker.starts_with("https://") {
                        return Err("Worker URL must start with 'http://' or 'https://'".to_string());
                    }
                }

                if let Some(temperature) = analyze.temperature {
                    if !(0.0..=2.0).contains(&temperature) {
                        return Err("Temperature must be between 0.0 and 2.0".to_string());
                    }
                }

                validate_scores(&analyze.rating.scores())
            }
            Command::Rate(rate) => validate_scores(&rate.scores()),
            Command::Dashboard(dashboard) => {
                if dashboard.recent == Some(0) {
                    return Err("Recent count must be at least 1".to_string());
                }
                Ok(())
            }
            Command::InitConfig => Ok(()),
        }
    }
}

fn validate_scores(scores: &[(Dimension, Option<u8>)]) -> Result<(), String> {
    for (dimension, score) in scores {
        if let Some(value) = score {
            if *value > dimension.max_score() {
                return Err(format!(
                    "{} must be between 0 and {}",
                    dimension,
                    dimension.max_score()
                ));
            }
        }
    }
    Ok(())
}
