//! Analysis generation.
//!
//! This module provides the Gemini client and the built-in keyword
//! analysis, behind a single [`Analyzer`].

pub mod client;
pub mod offline;

pub use client::{ClientConfig, GeminiClient};

use crate::analysis::extract_sections;
use crate::models::AnalysisText;
use anyhow::Result;
use tracing::debug;

/// Produces an analysis for a listening description.
pub enum Analyzer {
    /// Generated by the remote model, then split into sections.
    Remote(GeminiClient),
    /// Built-in keyword analysis.
    Offline,
}

impl Analyzer {
    /// Name of the model behind this analyzer, for report metadata.
    pub fn model_label(&self) -> String {
        match self {
            Analyzer::Remote(client) => client.model_name().to_string(),
            Analyzer::Offline => "offline keyword analysis".to_string(),
        }
    }

    pub async fn analyze(&self, description: &str) -> Result<AnalysisText> {
        match self {
            Analyzer::Remote(client) => {
                let text = client.generate(description).await?;
                let analysis = extract_sections(&text);
                debug!(
                    "Extracted sections: mirror {} chars, pattern {} chars, actions {} chars",
                    analysis.mirror.len(),
                    analysis.pattern.len(),
                    analysis.actions.len()
                );
                Ok(analysis)
            }
            Analyzer::Offline => Ok(offline::keyword_analysis(description)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_analyzer() {
        let analyzer = Analyzer::Offline;
        let analysis = tokio_test::block_on(analyzer.analyze("Bon Iver, Bonobo")).unwrap();

        assert!(analysis.pattern.contains("Aesthetic Architect"));
        assert_eq!(analyzer.model_label(), "offline keyword analysis");
    }
}
