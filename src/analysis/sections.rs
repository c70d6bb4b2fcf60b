//! Section extraction from generated analysis text.
//!
//! The generation prompt asks for three sections introduced by the labels
//! `MIRROR`, `HIDDEN PATTERN` and `ACTIONABLE STEPS`. Models do not always
//! comply, so extraction never fails: when the labels are missing the text
//! is split into thirds by line instead.

use crate::models::AnalysisText;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// A labelled region: everything after `label` up to `boundary`
/// (or the end of the text when there is no boundary after the label).
struct SectionRule {
    label: Regex,
    boundary: Option<Regex>,
}

impl SectionRule {
    fn new(label: &str, boundary: Option<&str>) -> Self {
        Self {
            label: Regex::new(label).expect("section label pattern is valid"),
            boundary: boundary.map(|b| Regex::new(b).expect("section boundary pattern is valid")),
        }
    }

    /// Captures the trimmed body after the first label match.
    ///
    /// Returns an empty string when the label is absent.
    fn capture<'a>(&self, text: &'a str) -> &'a str {
        let Some(label) = self.label.find(text) else {
            return "";
        };

        let rest = &text[label.end()..];
        let end = self
            .boundary
            .as_ref()
            .and_then(|b| b.find(rest))
            .map(|m| m.start())
            .unwrap_or(rest.len());

        rest[..end].trim()
    }
}

/// Mirror, pattern and actions rules, in that order.
fn section_rules() -> &'static [SectionRule; 3] {
    static RULES: OnceLock<[SectionRule; 3]> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            SectionRule::new(
                r"(?i)\bMIRROR\b:?\s*",
                Some(r"(?i)\b(?:HIDDEN\s+)?PATTERN\b"),
            ),
            SectionRule::new(
                r"(?i)\b(?:HIDDEN\s+)?PATTERN\b:?\s*",
                Some(r"(?i)\b(?:ACTIONABLE\s+STEPS|ACTIONS)\b"),
            ),
            SectionRule::new(r"(?i)\b(?:ACTIONABLE\s+STEPS|ACTIONS)\b:?\s*", None),
        ]
    })
}

/// Split generated text into mirror, pattern and actions sections.
///
/// Labels are matched case-insensitively as whole words (so "patterns" in
/// prose is not a label) and first-match wins; label order
/// is not validated. If neither the mirror nor the pattern section is
/// found, falls back to [`split_into_thirds`].
pub fn extract_sections(text: &str) -> AnalysisText {
    let [mirror_rule, pattern_rule, actions_rule] = section_rules();

    let labelled = AnalysisText::new(
        mirror_rule.capture(text),
        pattern_rule.capture(text),
        actions_rule.capture(text),
    );

    if labelled.mirror.is_empty() && labelled.pattern.is_empty() {
        debug!("No section labels found, splitting response by line");
        return split_into_thirds(text);
    }

    labelled
}

/// Divide the non-empty lines of `text` into three contiguous groups.
///
/// Group sizes differ by at most one, with earlier groups taking the
/// remainder. Mirror and pattern lines are joined with a space; actions
/// keep their line breaks.
pub fn split_into_thirds(text: &str) -> AnalysisText {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let base = lines.len() / 3;
    let remainder = lines.len() % 3;
    let mirror_len = base + usize::from(remainder > 0);
    let pattern_len = base + usize::from(remainder > 1);

    let (mirror, rest) = lines.split_at(mirror_len);
    let (pattern, actions) = rest.split_at(pattern_len);

    AnalysisText::new(mirror.join(" "), pattern.join(" "), actions.join("\n"))
}
