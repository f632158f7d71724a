//! Output module for product records and run reports
//!
//! This module handles:
//! - Writing one JSON file per product record
//! - Naming files safely after product ids
//! - Summarizing each harvest run

pub mod summary;
mod writer;

pub use summary::{print_summary, FailedProduct, RunSummary};
pub use writer::JsonWriter;

/// Characters that cannot appear in a file name on common filesystems
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Makes a product id or asset name safe to use as a single path component
///
/// Path separators, reserved and control characters become `_`. Names that
/// would still be empty or refer to the current or parent directory become
/// `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Whether a name is used unchanged as a file name
pub fn is_file_name_safe(name: &str) -> bool {
    sanitize_file_name(name) == name
}
