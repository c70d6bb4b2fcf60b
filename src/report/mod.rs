//! Report generation modules.

pub mod generator;

pub use generator::*;
