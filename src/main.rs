use clap::Parser;
use colored::Colorize;

use promptpack::cli::{Cli, ColorMode, Command};
use promptpack::commands;
use promptpack::commands::explain::ExplainCommandOptions;
use promptpack::commands::init::{InitOptions, InitResult};
use promptpack::commands::pack::PackCommandOptions;
use promptpack::commands::stats::StatsCommandOptions;
use promptpack::error::PromptPackError;

fn main() {
    let cli = Cli::parse();

    // Configure color output
    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    // Init tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{} {err}", "error:".red().bold());
        // 2 for bad input the user can fix, 1 for everything else.
        let code = if err.is_user_error() { 2 } else { 1 };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<(), PromptPackError> {
    match cli.command {
        Command::Init { path, force } => {
            let result = commands::init::run(InitOptions { path, force })?;
            if !cli.quiet {
                print_init_result(&result);
            }
            Ok(())
        }
        Command::Pack {
            input,
            budget,
            reserve,
            chars_per_token,
            format,
            out,
            stdout,
            report,
        } => commands::pack::run(PackCommandOptions {
            input,
            budget,
            reserve,
            chars_per_token,
            format,
            out,
            stdout,
            report,
            quiet: cli.quiet,
            config_path: cli.config,
        })
        .map(|_| ()),
        Command::Explain { report, detailed } => {
            commands::explain::run(ExplainCommandOptions { report, detailed })
        }
        Command::Stats {
            input,
            chars_per_token,
        } => commands::stats::run(StatsCommandOptions {
            input,
            chars_per_token,
            config_path: cli.config,
        }),
    }
}

fn print_init_result(result: &InitResult) {
    let verb = if result.overwritten {
        "Overwrote"
    } else {
        "Created"
    };
    println!(
        "{} {verb} config at {}",
        "ok".green().bold(),
        result.config_path.display()
    );
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit {} to tune the budget and history policy",
        result.config_path.display().to_string().bold()
    );
    println!(
        "  2. Run {} to pack a prompt file",
        "promptpack pack <FILE>".bold()
    );
}
