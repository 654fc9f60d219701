//! CLI output formatting for resize requests.
//!
//! # Request-First Display
//!
//! Every request is shown under the source it named (URL or attachment ID),
//! in the order given on the command line. The outcome follows as indented
//! context lines:
//!
//! ```text
//! 001 https://example.com/uploads/2017/12/wallpaper.jpg
//!     Variant: https://example.com/uploads/2017/12/wallpaper-ct-345x120.jpg (345x120)
//!     Path: /srv/uploads/2017/12/wallpaper-ct-345x120.jpg
//! 002 42
//!     Original: https://example.com/uploads/2017/12/photo.jpg (800x600)
//! 003 https://example.com/uploads/2017/12/gone.jpg
//!     Error: Source image not found: /srv/uploads/2017/12/gone.jpg
//!
//! 3 requests: 1 variant, 1 original, 1 failed
//! ```
//!
//! With `--json` the same records are printed as a JSON array instead.
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>` or `String`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::materialize::DerivedAsset;
use serde::Serialize;

/// Outcome of one request, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// A variant file was written or reused.
    Variant(DerivedAsset),
    /// The original already had the requested size.
    Original(DerivedAsset),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizeRecord {
    /// The source as the user named it.
    pub source: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn asset_line(label: &str, asset: &DerivedAsset) -> String {
    format!(
        "{}{}: {} ({}x{})",
        indent(1),
        label,
        asset.url,
        asset.width,
        asset.height
    )
}

// ============================================================================
// Resize output
// ============================================================================

/// Lines for one request: header plus outcome context.
pub fn format_resize_record(index: usize, record: &ResizeRecord) -> Vec<String> {
    let mut lines = vec![format!("{} {}", format_index(index), record.source)];
    match &record.outcome {
        Outcome::Variant(asset) => {
            lines.push(asset_line("Variant", asset));
            lines.push(format!("{}Path: {}", indent(1), asset.path.display()));
        }
        Outcome::Original(asset) => lines.push(asset_line("Original", asset)),
        Outcome::Failed { error } => lines.push(format!("{}Error: {}", indent(1), error)),
    }
    lines
}

/// One-line tally of a batch.
pub fn format_resize_summary(records: &[ResizeRecord]) -> String {
    let (mut variants, mut originals, mut failed) = (0, 0, 0);
    for record in records {
        match record.outcome {
            Outcome::Variant(_) => variants += 1,
            Outcome::Original(_) => originals += 1,
            Outcome::Failed { .. } => failed += 1,
        }
    }
    let requests = if records.len() == 1 {
        "request"
    } else {
        "requests"
    };
    format!(
        "{} {}: {} variant{}, {} original{}, {} failed",
        records.len(),
        requests,
        variants,
        if variants == 1 { "" } else { "s" },
        originals,
        if originals == 1 { "" } else { "s" },
        failed
    )
}

/// Full text report for a batch.
pub fn format_resize_output(records: &[ResizeRecord]) -> Vec<String> {
    let mut lines: Vec<String> = records
        .iter()
        .enumerate()
        .flat_map(|(i, record)| format_resize_record(i + 1, record))
        .collect();
    lines.push(String::new());
    lines.push(format_resize_summary(records));
    lines
}

pub fn format_resize_json(records: &[ResizeRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

pub fn print_resize_output(records: &[ResizeRecord]) {
    for line in format_resize_output(records) {
        println!("{}", line);
    }
}

pub fn print_resize_json(records: &[ResizeRecord]) -> Result<(), serde_json::Error> {
    println!("{}", format_resize_json(records)?);
    Ok(())
}
