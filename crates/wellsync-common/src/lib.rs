//! Shared utilities for the wellsync crates.
//!
//! This crate provides the polars value helpers used across the workspace
//! and the [`FieldValue`] scalar every comparison is expressed in.

pub mod anyvalue;
pub mod frame;
pub mod value;

// Re-export commonly used functions at crate root for convenience
pub use anyvalue::{any_to_string, format_numeric, parse_f64, parse_i64};
pub use frame::{column_values, has_column, series_from_values, series_with_dtype};
pub use value::FieldValue;
