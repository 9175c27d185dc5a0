pub mod explain;
pub mod init;
pub mod pack;
pub mod stats;

use crate::config::Config;
use crate::error::{PromptPackError, Result};

/// Apply a `--chars-per-token` override on top of the loaded config.
pub(crate) fn apply_ratio_override(config: &mut Config, chars_per_token: Option<f64>) -> Result<()> {
    if let Some(ratio) = chars_per_token {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PromptPackError::validation(
                "chars-per-token",
                "must be a positive number",
            ));
        }
        config.prompt.chars_per_token = ratio;
    }
    Ok(())
}
