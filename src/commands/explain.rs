//! Handler for the `promptpack explain` command.
//!
//! Reads a packing report and prints what happened to each part and why
//! the packed prompt does or does not fit its budget.

use std::path::PathBuf;

use colored::{ColoredString, Colorize};

use crate::error::Result;
use crate::report::{self, Fate, ReportEntry};
use crate::utils;

/// All inputs needed to run the explain command.
#[derive(Debug)]
pub struct ExplainCommandOptions {
    /// Path to a report written by `pack`.
    pub report: PathBuf,
    /// Show per-part character and token counts.
    pub detailed: bool,
}

/// Run the explain command.
pub fn run(options: ExplainCommandOptions) -> Result<()> {
    let pack_report = report::read_report(&options.report)?;

    for entry in &pack_report.entries {
        println!(
            "  {:>4} {:<9} priority {:>7}  {}",
            entry.id.to_string(),
            entry.role.as_str(),
            entry.priority,
            fate_label(entry.fate),
        );
        if options.detailed {
            print_detail(entry);
        }
    }

    println!();
    let summary = &pack_report.summary;
    let status = if summary.fits {
        "fits".green()
    } else {
        "over budget".yellow()
    };
    println!(
        "{} ~{} -> ~{} tokens / {} budget ({}), {} of {} part{} kept",
        "summary:".green().bold(),
        summary.tokens_before,
        summary.tokens_after,
        summary.budget,
        status,
        summary.parts_after,
        summary.parts_before,
        utils::plural(summary.parts_before),
    );
    println!("  ratio: {} chars/token", summary.chars_per_token);

    Ok(())
}

fn print_detail(entry: &ReportEntry) {
    if entry.fate.survives() {
        println!(
            "       chars: {} -> {}, tokens: {} -> {}",
            entry.chars_before, entry.chars_after, entry.tokens_before, entry.tokens_after,
        );
    } else {
        println!(
            "       chars: {}, tokens: {}",
            entry.chars_before, entry.tokens_before
        );
    }
}

fn fate_label(fate: Fate) -> ColoredString {
    match fate {
        Fate::Kept => fate.as_str().green(),
        Fate::Truncated | Fate::Replaced => fate.as_str().yellow(),
        Fate::Removed | Fate::Deduped => fate.as_str().dimmed(),
    }
}
