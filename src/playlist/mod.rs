//! Playlist resolution.
//!
//! This module turns a playlist link into track and artist lists through
//! the scraping worker, and formats them for the analysis prompt.

pub mod fetcher;

pub use fetcher::{format_for_prompt, PlaylistFetcher};
