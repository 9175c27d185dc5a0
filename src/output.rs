//! Output formatting for packed prompts.
//!
//! Renders a packed message list as JSON (ready for a chat-completion
//! request), Markdown, or a plain transcript, and writes the result to a
//! file or stdout.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PromptPackError, Result};
use crate::message::{self, Message};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Controls where and how output is written.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Desired output format.
    pub format: Format,
    /// If true, write to stdout instead of a file.
    pub stdout: bool,
    /// File path to write to (ignored when `stdout` is true).
    pub out: Option<PathBuf>,
}

/// Supported output formats.
///
/// Mirrors [`crate::cli::OutputFormat`] but decoupled from clap so that
/// library code can use it without pulling in CLI dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Markdown,
    Plain,
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render messages to a string in the given format.
pub fn format_messages(messages: &[Message], format: Format) -> Result<String> {
    match format {
        Format::Json => format_json(messages),
        Format::Markdown => Ok(format_markdown(messages)),
        Format::Plain => Ok(format_plain(messages)),
    }
}

/// JSON: an array of `{ "role", "content" }` objects.
fn format_json(messages: &[Message]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(messages).map_err(|e| {
        PromptPackError::config_with_source("failed to serialize messages as JSON", e)
    })?;
    json.push('\n');
    Ok(json)
}

/// Markdown: one heading per message.
fn format_markdown(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&format!("### {}\n\n", msg.role));
        out.push_str(&msg.content);
        if !msg.content.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

fn format_plain(messages: &[Message]) -> String {
    let mut out = message::to_conversation_string(messages);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Output writing
// ---------------------------------------------------------------------------

/// Write a formatted string to the appropriate destination.
///
/// If `options.stdout` is true, or no file is given, writes to stdout.
/// Otherwise writes to the file at `options.out` (creating parent
/// directories as needed).
pub fn write_output(content: &str, options: &FormatOptions) -> Result<()> {
    match options.out {
        Some(ref path) if !options.stdout => write_to_file(content, path),
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .map_err(|e| PromptPackError::io("writing to stdout", e))
        }
    }
}

/// Write content to a file, creating parent directories if needed.
fn write_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PromptPackError::io(format!("creating directory '{}'", parent.display()), e)
        })?;
    }
    std::fs::write(path, content)
        .map_err(|e| PromptPackError::io(format!("writing output to '{}'", path.display()), e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
