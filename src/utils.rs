//! Shared utility functions used across the library and commands.
//!
//! Text truncation, CLI format mapping, and report path computation.

use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::output::Format;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Cut `text` to at most `max_len` characters, ending in [`ELLIPSIS`].
///
/// Text that already fits is returned unchanged. If `max_len` leaves no
/// room beyond the ellipsis the result is empty.
pub fn truncate_tail(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let marker_len = ELLIPSIS.len();
    if max_len <= marker_len {
        return String::new();
    }
    let mut out: String = text.chars().take(max_len - marker_len).collect();
    out.push_str(ELLIPSIS);
    out
}

/// `"s"` unless `count` is one.
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

// ---------------------------------------------------------------------------
// Format mapping
// ---------------------------------------------------------------------------

/// Map the clap [`OutputFormat`] to the library [`Format`].
pub fn cli_format_to_output_format(fmt: &OutputFormat) -> Format {
    match fmt {
        OutputFormat::Json => Format::Json,
        OutputFormat::Markdown => Format::Markdown,
        OutputFormat::Plain => Format::Plain,
    }
}

// ---------------------------------------------------------------------------
// Report path
// ---------------------------------------------------------------------------

/// Compute the report sibling path for a given output file.
///
/// `packed.json` -> `packed.report.json`
pub fn report_sibling_path(out_path: &Path) -> PathBuf {
    let stem = out_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let parent = out_path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}.report.json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
