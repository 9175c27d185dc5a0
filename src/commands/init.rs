use std::path::PathBuf;

use crate::config::Config;
use crate::error::{PromptPackError, Result};

/// Options for the `init` command.
pub struct InitOptions {
    /// Config file to write; `./promptpack.toml` when absent.
    pub path: Option<PathBuf>,
    pub force: bool,
}

/// Result of a successful `init` operation.
#[derive(Debug)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub overwritten: bool,
}

/// Run the init command: write a default config file.
pub fn run(options: InitOptions) -> Result<InitResult> {
    let config_path = options
        .path
        .unwrap_or_else(|| PathBuf::from("promptpack.toml"));

    if config_path.is_dir() {
        return Err(PromptPackError::invalid_path(
            config_path.display().to_string(),
            "is a directory",
        ));
    }

    let exists = config_path.exists();
    if exists && !options.force {
        return Err(PromptPackError::config(format!(
            "config already exists at '{}' (use --force to overwrite)",
            config_path.display()
        )));
    }

    Config::default().save(&config_path)?;
    tracing::info!(path = %config_path.display(), "wrote default config");

    Ok(InitResult {
        config_path,
        overwritten: exists,
    })
}
