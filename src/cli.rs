use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "promptpack",
    about = "A deterministic, priority-driven prompt packer for LLM token budgets",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file
    #[arg(long, global = true, env = "PROMPTPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default promptpack.toml
    Init {
        /// Where to write the config file
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Pack a prompt file into a token-budgeted message list
    #[command(alias = "p")]
    Pack {
        /// Prompt file (.json, .toml, or a plain transcript)
        input: PathBuf,

        /// Token budget (defaults to the configured budget)
        #[arg(long)]
        budget: Option<usize>,

        /// Reserve tokens for the response
        #[arg(long)]
        reserve: Option<usize>,

        /// Override the characters-per-token ratio
        #[arg(long)]
        chars_per_token: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write output to file
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Write to stdout
        #[arg(long)]
        stdout: bool,

        /// Write the packing report here (defaults to a sibling of --out)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Explain a packing report
    #[command(alias = "e")]
    Explain {
        /// Report file written by `pack`
        report: PathBuf,

        /// Show per-part character and token counts
        #[arg(long)]
        detailed: bool,
    },

    /// Show token estimates for a prompt file without packing it
    Stats {
        /// Prompt file (.json, .toml, or a plain transcript)
        input: PathBuf,

        /// Override the characters-per-token ratio
        #[arg(long)]
        chars_per_token: Option<f64>,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Plain,
}
