//! Rating submission and storage.
//!
//! This module provides the rating selection flow and the stores that
//! persist submitted ratings.

pub mod selection;
pub mod store;

pub use selection::{RatingError, RatingSelection};
pub use store::RatingStore;
