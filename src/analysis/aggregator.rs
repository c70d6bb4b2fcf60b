//! Rating aggregation and statistics.
//!
//! Rows arrive positionally, the way the rating store returns them:
//! `[timestamp, mirror, novelty, actionability, average, feedback, ..]`.
//! The stored average column is never read; averages are recomputed from
//! the raw dimension scores.

use crate::models::{AggregateStats, Dimension, FeedbackEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Column holding the submission timestamp.
pub const TIMESTAMP_COLUMN: usize = 0;
/// Column holding the free-text feedback.
pub const FEEDBACK_COLUMN: usize = 5;

/// Label used when a row's timestamp cannot be parsed.
pub const UNKNOWN_DATE_LABEL: &str = "Recent";

/// Parse a raw score, treating anything non-numeric as zero.
///
/// Follows integer-prefix parsing: leading whitespace and an optional sign
/// are accepted, then digits up to the first non-digit (`"2.5"` is 2,
/// `"3 stars"` is 3). Input with no leading digits is 0.
pub fn parse_score_or_zero(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0,
    }
}

/// Round half up, matching how percentages have always been displayed.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn cell<S: AsRef<str>>(row: &[S], column: usize) -> &str {
    row.get(column).map(|value| value.as_ref()).unwrap_or("")
}

/// Normalized percentage of one dimension in a row.
pub fn row_percentage<S: AsRef<str>>(row: &[S], dimension: Dimension) -> f64 {
    dimension.percentage(parse_score_or_zero(cell(row, dimension.column())))
}

/// Mean of the three dimensions' percentages for a single rating,
/// as stored in the average column at submission time.
pub fn submission_average(mirror: u8, novelty: u8, actionability: u8) -> u8 {
    let sum = Dimension::Mirror.percentage(i64::from(mirror))
        + Dimension::Novelty.percentage(i64::from(novelty))
        + Dimension::Actionability.percentage(i64::from(actionability));
    round_half_up(sum / 3.0).clamp(0, 100) as u8
}

/// Reduce rating rows to counts and average percentages.
///
/// Every row counts toward the total, including rows whose scores fail to
/// parse. An empty collection yields all zeros.
pub fn aggregate<S: AsRef<str>>(rows: &[Vec<S>]) -> AggregateStats {
    if rows.is_empty() {
        return AggregateStats::default();
    }

    let count = rows.len() as f64;
    let average = |dimension: Dimension| {
        let sum: f64 = rows.iter().map(|row| row_percentage(row, dimension)).sum();
        round_half_up(sum / count)
    };

    AggregateStats {
        total_ratings: rows.len(),
        avg_mirror: average(Dimension::Mirror),
        avg_novelty: average(Dimension::Novelty),
        avg_actionability: average(Dimension::Actionability),
    }
}

/// Parse a stored timestamp into a display date such as `Oct 19, 2026`.
///
/// Accepts RFC 3339, a bare `YYYY-MM-DD HH:MM:SS`, or a bare date.
pub fn display_date(timestamp: &str) -> Option<String> {
    let timestamp = timestamp.trim();

    let date = if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        dt.with_timezone(&Utc).date_naive()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") {
        dt.date()
    } else {
        NaiveDate::parse_from_str(timestamp, "%Y-%m-%d").ok()?
    };

    Some(date.format("%b %-d, %Y").to_string())
}

/// Written feedback among the first `n` rows, in the order supplied.
///
/// Rows without feedback are dropped. The result is empty, not an error,
/// when nothing qualifies.
pub fn select_recent_feedback<S: AsRef<str>>(rows: &[Vec<S>], n: usize) -> Vec<FeedbackEntry> {
    rows.iter()
        .take(n)
        .filter_map(|row| {
            let feedback = cell(row, FEEDBACK_COLUMN).trim();
            if feedback.is_empty() {
                return None;
            }

            Some(FeedbackEntry {
                display_date: display_date(cell(row, TIMESTAMP_COLUMN))
                    .unwrap_or_else(|| UNKNOWN_DATE_LABEL.to_string()),
                feedback: feedback.to_string(),
                mirror: cell(row, Dimension::Mirror.column()).to_string(),
                novelty: cell(row, Dimension::Novelty.column()).to_string(),
                actionability: cell(row, Dimension::Actionability.column()).to_string(),
            })
        })
        .collect()
}
