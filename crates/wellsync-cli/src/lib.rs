//! CLI library components for the wellsync binary.

pub mod logging;
pub mod pipeline;
