//! Session state.
//!
//! The current analysis and the rating being built for it. Each update
//! takes the state by value and returns the next one.

use crate::models::{AnalysisText, Dimension};
use crate::ratings::{RatingError, RatingSelection};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub analysis: Option<AnalysisText>,
    pub selection: RatingSelection,
}

impl AppState {
    /// Show a new analysis. Any rating in progress belonged to the previous
    /// analysis and is discarded.
    pub fn with_analysis(self, analysis: AnalysisText) -> Self {
        Self {
            analysis: Some(analysis),
            selection: RatingSelection::default(),
        }
    }

    /// Record a score for one dimension.
    pub fn with_score(self, dimension: Dimension, value: u8) -> Result<Self, RatingError> {
        Ok(Self {
            selection: self.selection.select(dimension, value)?,
            ..self
        })
    }

    pub fn with_feedback(self, feedback: impl Into<String>) -> Self {
        Self {
            selection: self.selection.with_feedback(feedback),
            ..self
        }
    }
}
