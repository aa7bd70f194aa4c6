//! Interactive prompts over dialoguer.

use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

use wplocal_core::confirm::{ConfirmRequest, ConfirmResponse, UserInteraction};
use wplocal_core::CoreError;

/// Terminal confirmation dialogs. `--yes` turns every prompt into an
/// immediate confirmation without touching stored preferences.
pub struct TerminalPrompts {
    assume_yes: bool,
}

impl TerminalPrompts {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl UserInteraction for TerminalPrompts {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse, CoreError> {
        if self.assume_yes {
            return Ok(ConfirmResponse {
                confirmed: true,
                remember: false,
            });
        }

        let request = request.clone();
        // dialoguer blocks on the tty.
        tokio::task::spawn_blocking(move || {
            let theme = ColorfulTheme::default();
            eprintln!("{}", request.title);
            eprintln!("{}", request.message);
            let confirmed = Confirm::with_theme(&theme)
                .with_prompt(request.confirm_label)
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            let remember = if confirmed && request.offer_remember {
                Confirm::with_theme(&theme)
                    .with_prompt("Don't ask me again")
                    .default(false)
                    .interact()
                    .map_err(prompt_err)?
            } else {
                false
            };
            Ok(ConfirmResponse { confirmed, remember })
        })
        .await
        .map_err(|e| CoreError::Storage {
            message: format!("prompt task panicked: {e}"),
        })?
    }
}

fn prompt_err(e: dialoguer::Error) -> CoreError {
    CoreError::Storage {
        message: format!("prompt failed: {e}"),
    }
}
