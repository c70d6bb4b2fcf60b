//! Playlist Psychologist - music personality analysis
//!
//! A CLI tool that turns a playlist or a description of someone's music
//! taste into a three-part personality analysis, collects ratings of
//! those analyses, and summarizes them on a dashboard.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, invalid playlist, etc.)

mod analysis;
mod cli;
mod config;
mod llm;
mod models;
mod playlist;
mod ratings;
mod report;
mod state;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{AnalyzeArgs, Args, Command, OutputFormat, RatingArgs};
use config::Config;
use llm::{Analyzer, ClientConfig, GeminiClient};
use models::{AnalysisMetadata, AnalysisReport, Dashboard, Dimension};
use playlist::{format_for_prompt, PlaylistFetcher};
use ratings::RatingStore;
use state::AppState;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // Load configuration before logging so the file can raise verbosity
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("Playlist Psychologist v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if let Some(ref config_path) = args.config {
        info!("Loaded config from: {}", config_path.display());
    }

    match run(&args, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .playpsych.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Set GEMINI_API_KEY in your environment. The sheets backend also reads");
    println!("   SHEETS_API_KEY, and SHEETS_ACCESS_TOKEN (OAuth) for submitting ratings.");
    Ok(())
}

/// Initialize logging at the merged verbosity level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    match &args.command {
        Command::Analyze(analyze) => run_analyze(analyze, args, config).await,
        Command::Rate(rate) => run_rate(rate, config).await,
        Command::Dashboard(_) => run_dashboard(config).await,
        Command::InitConfig => handle_init_config(),
    }
}

/// Resolve the input, run the analysis, print it, and optionally rate it.
async fn run_analyze(analyze: &AnalyzeArgs, args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Work out what to analyze
    let (source, description) = if let Some(ref url) = analyze.playlist {
        status(args, "🎧 Fetching playlist data...");
        let fetcher = PlaylistFetcher::new(&config.playlist, config.model.timeout_seconds)?;
        let playlist = fetcher.fetch_from_url(url).await.context(
            "Make sure it's a public playlist, or describe your taste with --describe",
        )?;

        let formatted = format_for_prompt(
            &playlist,
            config.playlist.max_artists,
            config.playlist.max_tracks,
        );
        debug!("Formatted input for analysis:\n{}", formatted);
        (format!("Spotify playlist \"{}\"", playlist.name), formatted)
    } else {
        let text = analyze.describe.clone().unwrap_or_default();
        ("Manual description".to_string(), text.trim().to_string())
    };

    // Step 2: Pick the analyzer
    let analyzer = build_analyzer(config, !args.quiet)?;
    status(args, "🔬 Analyzing your musical personality...");

    let analysis = analyzer.analyze(&description).await?;
    if analysis.is_blank() {
        warn!("Analysis came back empty");
    }

    let app_state = AppState::default().with_analysis(analysis);

    // Step 3: Render
    let report = AnalysisReport {
        metadata: AnalysisMetadata {
            source,
            analysis_date: Utc::now(),
            model_used: analyzer.model_label(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        analysis: app_state.analysis.clone().unwrap_or_default(),
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json(&report)?,
        OutputFormat::Markdown => report::generate_analysis_markdown(&report),
    };
    emit(&output, config)?;

    // Step 4: Optional rating
    if analyze.rating.is_present() {
        let app_state = apply_rating(
            app_state,
            analyze.rating.scores(),
            analyze.rating.feedback.as_deref(),
        )?;
        submit_rating(&app_state, config).await?;
    } else if !args.quiet {
        eprintln!(
            "\n💬 Rate this analysis: playpsych rate --mirror 0-3 --novelty 0-2 --actionability 0-2"
        );
    }

    Ok(())
}

/// Remote analyzer when an API key is available, offline otherwise.
fn build_analyzer(config: &Config, show_progress: bool) -> Result<Analyzer> {
    if config.model.offline {
        info!("Using offline keyword analysis");
        return Ok(Analyzer::Offline);
    }

    match config.model.api_key.clone().filter(|k| !k.is_empty()) {
        Some(api_key) => {
            let client_config =
                ClientConfig::from_model_config(&config.model, api_key, show_progress);
            Ok(Analyzer::Remote(GeminiClient::new(client_config)?))
        }
        None => {
            warn!("No Gemini API key configured, falling back to offline keyword analysis");
            Ok(Analyzer::Offline)
        }
    }
}

/// Submit a standalone rating.
async fn run_rate(rate: &RatingArgs, config: &Config) -> Result<()> {
    let app_state = apply_rating(AppState::default(), rate.scores(), rate.feedback.as_deref())?;
    submit_rating(&app_state, config).await
}

/// Fold command-line scores and feedback into the session state.
fn apply_rating(
    mut app_state: AppState,
    scores: [(Dimension, Option<u8>); 3],
    feedback: Option<&str>,
) -> Result<AppState> {
    for (dimension, score) in scores {
        if let Some(value) = score {
            app_state = app_state.with_score(dimension, value)?;
        }
    }
    if let Some(feedback) = feedback {
        app_state = app_state.with_feedback(feedback);
    }
    debug!("Rating complete: {}", app_state.selection.is_complete());
    Ok(app_state)
}

async fn submit_rating(app_state: &AppState, config: &Config) -> Result<()> {
    let record = app_state.selection.to_record(Utc::now())?;
    debug!("Submitting rating: {:?}", record);

    let store = RatingStore::from_config(&config.ratings, config.model.timeout_seconds)?;
    store.append(&record).await?;

    eprintln!(
        "\n✅ Rating submitted to {} (average {}%). Thank you for your feedback! 🎉",
        store.describe(),
        record.average
    );
    Ok(())
}

/// Fetch stored ratings and print the aggregate view.
async fn run_dashboard(config: &Config) -> Result<()> {
    let store = RatingStore::from_config(&config.ratings, config.model.timeout_seconds)?;
    info!("Loading ratings from {}", store.describe());

    let mut rows = store.fetch_rows().await?;
    info!("Found {} ratings", rows.len());

    if config.dashboard.newest_first {
        rows.reverse();
    }

    let dashboard = Dashboard {
        generated_at: Utc::now(),
        stats: analysis::aggregate(&rows),
        recent_feedback: analysis::select_recent_feedback(&rows, config.dashboard.recent_limit),
    };

    debug!(
        "Averages: {} {}%, {} {}%, {} {}%",
        Dimension::Mirror,
        dashboard.stats.avg_mirror,
        Dimension::Novelty,
        dashboard.stats.avg_novelty,
        Dimension::Actionability,
        dashboard.stats.avg_actionability
    );

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json(&dashboard)?,
        OutputFormat::Markdown => report::generate_dashboard_markdown(&dashboard),
    };
    emit(&output, config)
}

/// Print a report and write it to the configured output file, if any.
fn emit(output: &str, config: &Config) -> Result<()> {
    println!("{}", output);

    if let Some(ref path) = config.general.output {
        std::fs::write(path, output)
            .with_context(|| format!("Failed to write report to {}", path))?;
        eprintln!("📝 Report saved to: {}", path);
    }

    Ok(())
}

/// Progress line on stderr, suppressed in quiet mode.
fn status(args: &Args, message: &str) {
    if !args.quiet {
        eprintln!("{}", message);
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Ignoring {}: {:#}", config::CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
