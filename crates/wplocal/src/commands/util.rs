//! Shared helpers for command handlers.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use crate::error::CliError;

/// Simple yes/no gate for destructive commands without a stored
/// preference. `--yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e.to_string())))
}
