//! CLI command implementations

pub mod scores;
pub mod status;
