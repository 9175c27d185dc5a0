//! Handler for the `promptpack stats` command.
//!
//! Shows the token estimate of every part of a prompt file, and how each
//! part may be reduced, without packing anything.

use std::path::PathBuf;

use colored::Colorize;

use crate::commands::apply_ratio_override;
use crate::config;
use crate::error::Result;
use crate::prompt::Part;
use crate::promptfile;
use crate::tokens::{char_len, TokenEstimator};
use crate::utils;

/// All inputs needed to run the stats command.
#[derive(Debug)]
pub struct StatsCommandOptions {
    /// Prompt file to inspect.
    pub input: PathBuf,
    /// Characters-per-token override.
    pub chars_per_token: Option<f64>,
    /// Path to config file.
    pub config_path: Option<PathBuf>,
}

/// Run the stats command.
pub fn run(options: StatsCommandOptions) -> Result<()> {
    let mut config = config::load_or_default(options.config_path.as_deref())?;
    apply_ratio_override(&mut config, options.chars_per_token)?;

    let file = promptfile::load(&options.input)?;
    let prompt = file.into_prompt(&config.prompt, &config.history);
    let estimator: &dyn TokenEstimator = prompt.estimator();

    println!("{}", "Prompt Statistics".bold());
    println!("  parts:           {}", prompt.len());
    println!("  total tokens:    ~{}", prompt.estimate_tokens());
    println!(
        "  default budget:  {} (reserve {})",
        config.default_budget, config.reserve_tokens
    );
    println!("  chars/token:     {}", prompt.estimator().chars_per_token());

    if prompt.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "Parts:".bold());
    for part in prompt.parts() {
        println!(
            "  {:>4} {:<9} {:>6} tokens  {:>7} chars  {}",
            part.id.to_string(),
            part.role.as_str(),
            estimator.estimate(&part.text),
            char_len(&part.text),
            reduction_rules(part).dimmed(),
        );
    }

    let reducible = prompt
        .parts()
        .filter(|p| p.truncate_to.is_some() || p.omittable)
        .count();
    println!();
    println!(
        "  {} reducible part{}",
        reducible,
        utils::plural(reducible)
    );

    Ok(())
}

/// Short description of how a part may shrink.
fn reduction_rules(part: &Part) -> String {
    let mut rules = vec![format!("priority {}", part.priority)];
    if let Some(floor) = part.truncate_to {
        rules.push(format!("truncate to {floor}"));
    }
    match (part.omittable, part.omission_message.as_deref()) {
        (true, Some(message)) => rules.push(format!("omit as {message:?}")),
        (true, None) => rules.push("omit".to_string()),
        (false, _) => {}
    }
    rules.join(", ")
}
