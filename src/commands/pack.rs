//! Handler for the `promptpack pack` command.
//!
//! Loads a prompt file, reduces it to the token budget, and writes the
//! packed message list. A packing report is written alongside file output
//! (or wherever `--report` points).

use std::path::PathBuf;

use colored::Colorize;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::commands::apply_ratio_override;
use crate::config;
use crate::error::Result;
use crate::output::{self, FormatOptions};
use crate::promptfile;
use crate::report::{self, Fate, PackReport};
use crate::utils;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

/// All inputs needed to run the pack command.
#[derive(Debug)]
pub struct PackCommandOptions {
    /// Prompt file to pack.
    pub input: PathBuf,
    /// Token budget; the configured default when absent.
    pub budget: Option<usize>,
    /// Tokens reserved for the model response.
    pub reserve: Option<usize>,
    /// Characters-per-token override.
    pub chars_per_token: Option<f64>,
    /// Output format.
    pub format: OutputFormat,
    /// Write output to file.
    pub out: Option<PathBuf>,
    /// Write to stdout.
    pub stdout: bool,
    /// Explicit report path.
    pub report: Option<PathBuf>,
    /// Suppress non-essential output.
    pub quiet: bool,
    /// Path to config file.
    pub config_path: Option<PathBuf>,
}

/// Run the pack command end-to-end.
///
/// Packing never fails for being over budget: the best-effort result is
/// written and a warning is reported.
pub fn run(options: PackCommandOptions) -> Result<PackReport> {
    // Step 1: Resolve configuration.
    let mut config = config::load_or_default(options.config_path.as_deref())?;
    apply_ratio_override(&mut config, options.chars_per_token)?;
    let budget = config.effective_budget(options.budget, options.reserve);

    // Step 2: Load the prompt file and build the prompt.
    let file = promptfile::load(&options.input)?;
    if file.is_empty() && !options.quiet {
        eprintln!("{}", "Prompt file has no parts.".dimmed());
    }
    let prompt = file.into_prompt(&config.prompt, &config.history);

    // Step 3: Pack.
    let (messages, pack_report) = prompt.pack_with_report(budget);
    info!(
        input = %options.input.display(),
        budget,
        before = pack_report.summary.tokens_before,
        after = pack_report.summary.tokens_after,
        "packed prompt"
    );
    if !pack_report.summary.fits {
        warn!(
            budget,
            estimate = pack_report.summary.tokens_after,
            "prompt still exceeds budget after maximal reduction"
        );
    }

    // Step 4: Format and write.
    let format = utils::cli_format_to_output_format(&options.format);
    let formatted = output::format_messages(&messages, format)?;
    output::write_output(
        &formatted,
        &FormatOptions {
            format,
            stdout: options.stdout,
            out: options.out.clone(),
        },
    )?;

    // Step 5: Write the report.
    let report_path = options.report.clone().or_else(|| {
        options
            .out
            .as_deref()
            .filter(|_| !options.stdout)
            .map(utils::report_sibling_path)
    });
    if let Some(ref path) = report_path {
        report::write_report(&pack_report, path)?;
        if !options.quiet {
            eprintln!(
                "{} report written to {}",
                "ok:".green().bold(),
                path.display()
            );
        }
    }

    // Step 6: Print summary.
    if !options.quiet {
        print_summary(&pack_report);
    }

    Ok(pack_report)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_summary(pack_report: &PackReport) {
    let summary = &pack_report.summary;
    let mut changes = Vec::new();
    for fate in [Fate::Truncated, Fate::Replaced, Fate::Removed, Fate::Deduped] {
        let count = pack_report.count(fate);
        if count > 0 {
            changes.push(format!("{count} {}", fate.as_str()));
        }
    }
    let changes = if changes.is_empty() {
        String::new()
    } else {
        format!(" ({})", changes.join(", "))
    };

    eprintln!(
        "{} {} of {} part{} packed{}, ~{} tokens (budget: {})",
        "pack:".green().bold(),
        summary.parts_after,
        summary.parts_before,
        utils::plural(summary.parts_before),
        changes,
        summary.tokens_after,
        summary.budget,
    );
    if !summary.fits {
        eprintln!(
            "{} over budget by ~{} tokens; nothing left to reduce",
            "warning:".yellow().bold(),
            summary.tokens_after - summary.budget,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
