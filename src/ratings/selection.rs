//! Rating selection and validation.
//!
//! A [`RatingSelection`] collects one score per dimension plus optional
//! feedback. Updates return a new selection rather than mutating shared
//! state; a record can only be built once every dimension is chosen.

use crate::analysis::submission_average;
use crate::models::{format_timestamp, Dimension, RatingRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a rating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("Please rate {0} before submitting")]
    Missing(Dimension),

    #[error("{dimension} must be between 0 and {max}, got {value}")]
    OutOfRange {
        dimension: Dimension,
        value: u8,
        max: u8,
    },
}

/// Scores chosen so far for the current analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSelection {
    pub mirror: Option<u8>,
    pub novelty: Option<u8>,
    pub actionability: Option<u8>,
    #[serde(default)]
    pub feedback: String,
}

impl RatingSelection {
    /// Returns the selection with `dimension` set to `value`.
    pub fn select(mut self, dimension: Dimension, value: u8) -> Result<Self, RatingError> {
        let max = dimension.max_score();
        if value > max {
            return Err(RatingError::OutOfRange {
                dimension,
                value,
                max,
            });
        }

        *self.slot(dimension) = Some(value);
        Ok(self)
    }

    /// Returns the selection with the given feedback text.
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = feedback.into();
        self
    }

    pub fn get(&self, dimension: Dimension) -> Option<u8> {
        match dimension {
            Dimension::Mirror => self.mirror,
            Dimension::Novelty => self.novelty,
            Dimension::Actionability => self.actionability,
        }
    }

    /// True once every dimension has a score. Feedback is optional.
    pub fn is_complete(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.get(*d).is_some())
    }

    /// Build the record to persist, stamped with `at`.
    pub fn to_record(&self, at: DateTime<Utc>) -> Result<RatingRecord, RatingError> {
        let score = |dimension| self.get(dimension).ok_or(RatingError::Missing(dimension));

        let mirror = score(Dimension::Mirror)?;
        let novelty = score(Dimension::Novelty)?;
        let actionability = score(Dimension::Actionability)?;

        Ok(RatingRecord {
            timestamp: format_timestamp(at),
            mirror,
            novelty,
            actionability,
            average: submission_average(mirror, novelty, actionability),
            feedback: self.feedback.clone(),
        })
    }

    fn slot(&mut self, dimension: Dimension) -> &mut Option<u8> {
        match dimension {
            Dimension::Mirror => &mut self.mirror,
            Dimension::Novelty => &mut self.novelty,
            Dimension::Actionability => &mut self.actionability,
        }
    }
}
