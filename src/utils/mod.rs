//! Utility functions and types

pub mod columns;
pub mod data_loader;

pub use columns::{
    as_f64_series, as_string_series, f64_values, is_missing_marker, number_label, string_values, MISSING_MARKERS,
};
pub use data_loader::{DataLoader, FileFormat, FileInfo};
