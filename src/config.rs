use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{PromptPackError, Result};
use crate::history::HistoryPolicy;
use crate::tokens::DEFAULT_CHARS_PER_TOKEN;

/// Top-level configuration for promptpack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub default_budget: usize,
    pub reserve_tokens: usize,
    pub prompt: PromptSettings,
    pub history: HistoryPolicy,
}

/// Per-prompt estimation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptSettings {
    /// Characters per estimated token. Lower is more conservative.
    pub chars_per_token: f64,
    /// Separator counted between consecutive messages.
    pub joiner: String,
    /// Fixed per-message cost of the role tag, in characters.
    pub role_overhead: usize,
}

// --- Defaults ---

impl Default for Config {
    fn default() -> Self {
        Self {
            default_budget: 2400,
            reserve_tokens: 0,
            prompt: PromptSettings::default(),
            history: HistoryPolicy::default(),
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            joiner: "\n".into(),
            role_overhead: 2,
        }
    }
}

// --- Config methods ---

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PromptPackError::io(format!("reading config from '{}'", path.display()), e)
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PromptPackError::config_with_source("failed to parse config", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| PromptPackError::config_with_source("failed to serialize config", e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PromptPackError::io(
                    format!("creating config directory '{}'", parent.display()),
                    e,
                )
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            PromptPackError::io(format!("writing config to '{}'", path.display()), e)
        })
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if self.default_budget == 0 {
            return Err(PromptPackError::validation(
                "default_budget",
                "must be greater than 0",
            ));
        }
        if self.reserve_tokens >= self.default_budget {
            return Err(PromptPackError::validation(
                "reserve_tokens",
                "must be less than default_budget",
            ));
        }
        let ratio = self.prompt.chars_per_token;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PromptPackError::validation(
                "prompt.chars_per_token",
                "must be a positive number",
            ));
        }
        if !self.history.recent_priority.is_finite() || !self.history.older_priority.is_finite() {
            return Err(PromptPackError::validation(
                "history",
                "priorities must be finite",
            ));
        }
        Ok(())
    }

    /// Merge overrides on top of this config (non-default fields win).
    pub fn merge(&mut self, overrides: Config) {
        let defaults = Config::default();
        if overrides.default_budget != defaults.default_budget {
            self.default_budget = overrides.default_budget;
        }
        if overrides.reserve_tokens != defaults.reserve_tokens {
            self.reserve_tokens = overrides.reserve_tokens;
        }
        if overrides.prompt != defaults.prompt {
            self.prompt = overrides.prompt;
        }
        if overrides.history != defaults.history {
            self.history = overrides.history;
        }
    }

    /// Token budget left for the prompt once the response reserve is taken out.
    pub fn effective_budget(&self, budget: Option<usize>, reserve: Option<usize>) -> usize {
        let budget = budget.unwrap_or(self.default_budget);
        let reserve = reserve.unwrap_or(self.reserve_tokens);
        budget.saturating_sub(reserve)
    }
}

/// Builder for constructing Config with selective overrides.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.config.default_budget = budget;
        self
    }

    pub fn with_reserve(mut self, reserve: usize) -> Self {
        self.config.reserve_tokens = reserve;
        self
    }

    pub fn with_chars_per_token(mut self, chars_per_token: f64) -> Self {
        self.config.prompt.chars_per_token = chars_per_token;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Discover the config file using standard search order:
/// 1. Explicit path (if provided)
/// 2. ./promptpack.toml
/// 3. ~/.promptpack.toml
/// 4. XDG config dir
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        return None;
    }

    let local = PathBuf::from("promptpack.toml");
    if local.exists() {
        return Some(local);
    }

    if let Some(home) = dirs_home() {
        let home_config = home.join(".promptpack.toml");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "promptpack") {
        let xdg = proj_dirs.config_dir().join("promptpack.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }

    None
}

/// Load the discovered config, or defaults when none exists.
///
/// An explicit path that does not exist is an error rather than a silent
/// fallback.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    match find_config_file(explicit) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load(&path)
        }
        None => match explicit {
            Some(p) => Err(PromptPackError::invalid_path(
                p.display().to_string(),
                "config file does not exist",
            )),
            None => Ok(Config::default()),
        },
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
