//! Data models for the playlist psychologist.
//!
//! This module contains the core data structures shared by the analysis,
//! rating, and reporting layers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three prose sections of a personality analysis.
///
/// Every field is always a string; an unrecoverable section is empty,
/// never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisText {
    /// Self-observation summary.
    pub mirror: String,
    /// The inferred psychological insight.
    pub pattern: String,
    /// Recommendations. Newlines are meaningful line breaks.
    pub actions: String,
}

impl AnalysisText {
    pub fn new(
        mirror: impl Into<String>,
        pattern: impl Into<String>,
        actions: impl Into<String>,
    ) -> Self {
        Self {
            mirror: mirror.into(),
            pattern: pattern.into(),
            actions: actions.into(),
        }
    }

    /// Returns true if no section carries any text.
    pub fn is_blank(&self) -> bool {
        self.mirror.is_empty() && self.pattern.is_empty() && self.actions.is_empty()
    }
}

/// A rated dimension of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// How well the analysis reflected the listener back (0-3).
    Mirror,
    /// How new the insight felt (0-2).
    Novelty,
    /// How usable the suggestions were (0-2).
    Actionability,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [
        Dimension::Mirror,
        Dimension::Novelty,
        Dimension::Actionability,
    ];

    /// Upper bound of the raw scale for this dimension.
    pub fn max_score(&self) -> u8 {
        match self {
            Dimension::Mirror => 3,
            Dimension::Novelty => 2,
            Dimension::Actionability => 2,
        }
    }

    /// Column of this dimension in a stored rating row.
    pub fn column(&self) -> usize {
        match self {
            Dimension::Mirror => 1,
            Dimension::Novelty => 2,
            Dimension::Actionability => 3,
        }
    }

    /// Normalizes a raw score onto 0-100. No bounds checking.
    pub fn percentage(&self, raw: i64) -> f64 {
        raw as f64 / f64::from(self.max_score()) * 100.0
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Dimension::Mirror => "🪞",
            Dimension::Novelty => "💡",
            Dimension::Actionability => "✨",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Mirror => write!(f, "Mirror Accuracy"),
            Dimension::Novelty => write!(f, "Insight Novelty"),
            Dimension::Actionability => write!(f, "Actionability"),
        }
    }
}

/// One persisted rating row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// Creation time, RFC 3339.
    pub timestamp: String,
    pub mirror: u8,
    pub novelty: u8,
    pub actionability: u8,
    /// Mean of the three percentages at submission time.
    pub average: u8,
    #[serde(default)]
    pub feedback: String,
}

impl RatingRecord {
    /// Positional row in store column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.mirror.to_string(),
            self.novelty.to_string(),
            self.actionability.to_string(),
            self.average.to_string(),
            self.feedback.clone(),
        ]
    }
}

/// Formats a submission timestamp the way rows store it.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Summary over a collection of rating rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_ratings: usize,
    pub avg_mirror: i64,
    pub avg_novelty: i64,
    pub avg_actionability: i64,
}

/// A display-ready piece of written feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub display_date: String,
    pub feedback: String,
    /// Raw scores as stored, for display next to the text.
    pub mirror: String,
    pub novelty: String,
    pub actionability: String,
}

/// Playlist metadata resolved by the scraping worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistData {
    pub playlist_id: String,
    pub name: String,
    pub tracks: Vec<String>,
    pub artists: Vec<String>,
    pub track_count: usize,
}

/// Dashboard view: stats plus recent written feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub stats: AggregateStats,
    pub recent_feedback: Vec<FeedbackEntry>,
}

/// Metadata about an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Where the listening description came from.
    pub source: String,
    pub analysis_date: DateTime<Utc>,
    pub model_used: String,
    pub duration_seconds: f64,
}

/// A complete analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: AnalysisMetadata,
    pub analysis: AnalysisText,
}
