//! Analysis modules.
//!
//! Section extraction turns a generated answer into the three report
//! sections; the aggregator summarizes stored ratings.

pub mod aggregator;
pub mod sections;

pub use aggregator::*;
pub use sections::*;
