//! Markdown and JSON report generation.
//!
//! Renders an analysis (the three sections) and the ratings dashboard
//! (stat cards plus recent feedback).

use crate::models::{AnalysisReport, AnalysisText, Dashboard, Dimension, FeedbackEntry};
use anyhow::Result;
use serde::Serialize;

/// Shown on the dashboard when the store has no ratings.
pub const NO_RATINGS_PLACEHOLDER: &str =
    "No user ratings yet! Be the first to run an analysis and rate it.";

/// Shown when none of the recent ratings carry written feedback.
pub const NO_FEEDBACK_PLACEHOLDER: &str =
    "No written feedback yet. Ratings are being collected!";

/// Generate a Markdown analysis report.
pub fn generate_analysis_markdown(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str("# Your Music Personality\n\n");

    let metadata = &report.metadata;
    output.push_str(&format!("- **Source:** {}\n", metadata.source));
    output.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    output.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    output.push_str(&generate_sections(&report.analysis));

    output
}

/// Render the three analysis sections.
fn generate_sections(analysis: &AnalysisText) -> String {
    let mut section = String::new();

    section.push_str("## 🪞 The Mirror\n\n");
    section.push_str(&analysis.mirror);
    section.push_str("\n\n");

    section.push_str("## 🔍 The Hidden Pattern\n\n");
    section.push_str(&analysis.pattern);
    section.push_str("\n\n");

    section.push_str("## ✨ Actionable Steps\n\n");
    section.push_str(&hard_line_breaks(&analysis.actions));
    section.push_str("\n\n");

    section
}

/// Keep single newlines as line breaks in rendered Markdown.
fn hard_line_breaks(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}  ", line.trim_end())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

/// Generate a Markdown dashboard.
pub fn generate_dashboard_markdown(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str("# User Ratings Dashboard\n\n");
    output.push_str(&format!(
        "*Generated {}*\n\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let stats = &dashboard.stats;
    if stats.total_ratings == 0 {
        output.push_str(&format!("📊 {}\n", NO_RATINGS_PLACEHOLDER));
        return output;
    }

    output.push_str("## Summary\n\n");
    output.push_str(&format!(
        "| Total Ratings | {} Avg {} | {} Avg {} | {} Avg {} |\n",
        Dimension::Mirror.emoji(),
        Dimension::Mirror,
        Dimension::Novelty.emoji(),
        Dimension::Novelty,
        Dimension::Actionability.emoji(),
        Dimension::Actionability,
    ));
    output.push_str("|:---:|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| **{}** | {}% | {}% | {}% |\n\n",
        stats.total_ratings, stats.avg_mirror, stats.avg_novelty, stats.avg_actionability
    ));

    output.push_str(&format!(
        "## Recent Feedback ({} total)\n\n",
        stats.total_ratings
    ));
    output.push_str(&generate_feedback_list(&dashboard.recent_feedback));

    output
}

fn generate_feedback_list(entries: &[FeedbackEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", NO_FEEDBACK_PLACEHOLDER);
    }

    let mut list = String::new();
    for entry in entries {
        list.push_str(&format!(
            "- **{}** ({} {}/{} | {} {}/{} | {} {}/{})\n  > \"{}\"\n",
            entry.display_date,
            Dimension::Mirror.emoji(),
            entry.mirror,
            Dimension::Mirror.max_score(),
            Dimension::Novelty.emoji(),
            entry.novelty,
            Dimension::Novelty.max_score(),
            Dimension::Actionability.emoji(),
            entry.actionability,
            Dimension::Actionability.max_score(),
            entry.feedback,
        ));
    }
    list
}

/// Generate a JSON document for any report.
pub fn generate_json<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateStats, AnalysisMetadata};
    use chrono::Utc;

    fn create_test_report() -> AnalysisReport {
        AnalysisReport {
            metadata: AnalysisMetadata {
                source: "Manual description".to_string(),
                analysis_date: Utc::now(),
                model_used: "test-model".to_string(),
                duration_seconds: 2.5,
            },
            analysis: AnalysisText::new(
                "You like quiet music.",
                "You use music to calm down.",
                "Journal tonight\nTry Nils Frahm",
            ),
        }
    }

    fn create_test_dashboard(stats: AggregateStats, recent: Vec<FeedbackEntry>) -> Dashboard {
        Dashboard {
            generated_at: Utc::now(),
            stats,
            recent_feedback: recent,
        }
    }

    #[test]
    fn test_generate_analysis_markdown() {
        let markdown = generate_analysis_markdown(&create_test_report());

        assert!(markdown.contains("# Your Music Personality"));
        assert!(markdown.contains("`test-model`"));
        assert!(markdown.contains("## 🪞 The Mirror\n\nYou like quiet music."));
        assert!(markdown.contains("You use music to calm down."));
        assert!(markdown.contains("Journal tonight  \nTry Nils Frahm"));
    }

    #[test]
    fn test_hard_line_breaks() {
        assert_eq!(hard_line_breaks("a\n\nb"), "a  \n\nb");
        assert_eq!(hard_line_breaks(""), "");
    }

    #[test]
    fn test_generate_dashboard_markdown() {
        let stats = AggregateStats {
            total_ratings: 4,
            avg_mirror: 75,
            avg_novelty: 50,
            avg_actionability: 63,
        };
        let recent = vec![FeedbackEntry {
            display_date: "Oct 19, 2026".to_string(),
            feedback: "Scarily accurate".to_string(),
            mirror: "3".to_string(),
            novelty: "1".to_string(),
            actionability: "2".to_string(),
        }];

        let markdown = generate_dashboard_markdown(&create_test_dashboard(stats, recent));

        assert!(markdown.contains("| **4** | 75% | 50% | 63% |"));
        assert!(markdown.contains("## Recent Feedback (4 total)"));
        assert!(markdown.contains("**Oct 19, 2026** (🪞 3/3 | 💡 1/2 | ✨ 2/2)"));
        assert!(markdown.contains("\"Scarily accurate\""));
    }

    #[test]
    fn test_dashboard_without_feedback() {
        let stats = AggregateStats {
            total_ratings: 1,
            ..AggregateStats::default()
        };
        let markdown = generate_dashboard_markdown(&create_test_dashboard(stats, vec![]));
        assert!(markdown.contains(NO_FEEDBACK_PLACEHOLDER));
    }

    #[test]
    fn test_dashboard_without_ratings() {
        let markdown =
            generate_dashboard_markdown(&create_test_dashboard(AggregateStats::default(), vec![]));

        assert!(markdown.contains(NO_RATINGS_PLACEHOLDER));
        assert!(!markdown.contains("## Summary"));
    }

    #[test]
    fn test_generate_json() {
        let json = generate_json(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"mirror\""));
        assert!(json.contains("\"actions\""));
    }
}
