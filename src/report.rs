//! Packing reports.
//!
//! A report records every part of the original prompt, its size before and
//! after packing, and what reduction did to it. This enables the `explain`
//! command and budget introspection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PromptPackError, Result};
use crate::message::Role;
use crate::prompt::{PartId, Prompt};
use crate::tokens::{char_len, TokenEstimator};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Complete record of one packing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackReport {
    pub summary: ReportSummary,
    /// One entry per original part, in append order.
    pub entries: Vec<ReportEntry>,
}

/// Aggregate statistics for a packing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub budget: usize,
    pub tokens_before: usize,
    pub tokens_after: usize,
    /// Whether the packed prompt fits the budget.
    pub fits: bool,
    pub parts_before: usize,
    pub parts_after: usize,
    pub chars_per_token: f64,
}

/// What packing did to a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fate {
    Kept,
    Truncated,
    /// Text replaced by the omission message.
    Replaced,
    Removed,
    /// Replaced, then coalesced into an identical neighbour.
    Deduped,
}

impl Fate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kept => "kept",
            Self::Truncated => "truncated",
            Self::Replaced => "replaced",
            Self::Removed => "removed",
            Self::Deduped => "deduped",
        }
    }

    /// True if the part still appears in the packed output.
    pub fn survives(self) -> bool {
        matches!(self, Self::Kept | Self::Truncated | Self::Replaced)
    }
}

/// A single part in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEntry {
    pub id: PartId,
    pub role: Role,
    pub priority: f64,
    pub chars_before: usize,
    /// Zero if the part did not survive.
    pub chars_after: usize,
    pub tokens_before: usize,
    pub tokens_after: usize,
    pub fate: Fate,
}

impl PackReport {
    /// Number of entries with the given fate.
    pub fn count(&self, fate: Fate) -> usize {
        self.entries.iter().filter(|e| e.fate == fate).count()
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Compare a prompt with its packed copy.
///
/// `deduped` lists the parts dropped by the dedupe pass; every other part
/// missing from `packed` was removed outright.
pub fn build_report(original: &Prompt, packed: &Prompt, deduped: &[PartId], budget: usize) -> PackReport {
    let estimator = original.estimator();

    let entries = original
        .parts()
        .map(|before| {
            let chars_before = char_len(&before.text);
            let tokens_before = estimator.estimate(&before.text);
            let (fate, chars_after, tokens_after) = match packed.get(before.id) {
                Some(after) if after.dedupe_eligible => (
                    Fate::Replaced,
                    char_len(&after.text),
                    estimator.estimate(&after.text),
                ),
                Some(after) if after.text != before.text => (
                    Fate::Truncated,
                    char_len(&after.text),
                    estimator.estimate(&after.text),
                ),
                Some(_) => (Fate::Kept, chars_before, tokens_before),
                None if deduped.contains(&before.id) => (Fate::Deduped, 0, 0),
                None => (Fate::Removed, 0, 0),
            };
            ReportEntry {
                id: before.id,
                role: before.role,
                priority: before.priority,
                chars_before,
                chars_after,
                tokens_before,
                tokens_after,
                fate,
            }
        })
        .collect();

    let tokens_after = packed.estimate_tokens();
    PackReport {
        summary: ReportSummary {
            budget,
            tokens_before: original.estimate_tokens(),
            tokens_after,
            fits: tokens_after <= budget,
            parts_before: original.len(),
            parts_after: packed.len(),
            chars_per_token: estimator.chars_per_token(),
        },
        entries,
    }
}

/// Write a report to a JSON file.
pub fn write_report(report: &PackReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| {
        PromptPackError::config_with_source("failed to serialize report as JSON", e)
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PromptPackError::io(format!("creating directory '{}'", parent.display()), e)
        })?;
    }

    std::fs::write(path, json)
        .map_err(|e| PromptPackError::io(format!("writing report to '{}'", path.display()), e))
}

/// Read a report from a JSON file.
pub fn read_report(path: &Path) -> Result<PackReport> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PromptPackError::io(format!("reading report '{}'", path.display()), e))?;

    serde_json::from_str(&content).map_err(|e| {
        PromptPackError::parse_with_source(format!("report '{}'", path.display()), e)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
