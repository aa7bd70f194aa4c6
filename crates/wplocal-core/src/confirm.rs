// ── Destructive-action confirmation ──
//
// Push, pull, and disconnect all overwrite something. Each carries a
// preference key; once the user confirms with "don't ask again", the
// prompt is skipped for good.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;

pub const DONT_SHOW_PUSH_CONFIRMATION: &str = "dont_show_push_confirmation";
pub const DONT_SHOW_PULL_CONFIRMATION: &str = "dont_show_pull_confirmation";
pub const DONT_SHOW_DISCONNECT_WARNING: &str = "dont_show_disconnect_warning";

/// Persistent per-user flags. Implemented by the user-data store.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_bool(&self, key: &str) -> Result<bool, CoreError>;
    async fn set_bool(&self, key: &str, value: bool) -> Result<(), CoreError>;
}

/// One confirmation prompt.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    /// Whether to offer the "don't ask again" option.
    pub offer_remember: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfirmResponse {
    pub confirmed: bool,
    pub remember: bool,
}

/// How prompts reach the user. The CLI implements this over dialoguer.
#[async_trait]
pub trait UserInteraction: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse, CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Cancelled,
}

pub struct ConfirmationPolicy {
    prefs: Arc<dyn PreferenceStore>,
    ui: Arc<dyn UserInteraction>,
}

impl ConfirmationPolicy {
    pub fn new(prefs: Arc<dyn PreferenceStore>, ui: Arc<dyn UserInteraction>) -> Self {
        Self { prefs, ui }
    }

    /// Run the confirmation flow for the action guarded by
    /// `preference_key`. A previously remembered confirmation bypasses
    /// the prompt entirely; "remember" is only persisted when the user
    /// actually confirms.
    pub async fn confirm(
        &self,
        preference_key: &str,
        request: ConfirmRequest,
    ) -> Result<Outcome, CoreError> {
        if self.prefs.get_bool(preference_key).await? {
            return Ok(Outcome::Confirmed);
        }
        let response = self.ui.confirm(&request).await?;
        if !response.confirmed {
            return Ok(Outcome::Cancelled);
        }
        if request.offer_remember && response.remember {
            self.prefs.set_bool(preference_key, true).await?;
        }
        Ok(Outcome::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryPrefs {
        flags: Mutex<HashMap<String, bool>>,
    }

    #[async_trait]
    impl PreferenceStore for MemoryPrefs {
        async fn get_bool(&self, key: &str) -> Result<bool, CoreError> {
            Ok(*self.flags.lock().unwrap().get(key).unwrap_or(&false))
        }
        async fn set_bool(&self, key: &str, value: bool) -> Result<(), CoreError> {
            self.flags.lock().unwrap().insert(key.into(), value);
            Ok(())
        }
    }

    struct ScriptedUi {
        response: ConfirmResponse,
        prompts: AtomicUsize,
    }

    impl ScriptedUi {
        fn answering(confirmed: bool, remember: bool) -> Self {
            Self {
                response: ConfirmResponse { confirmed, remember },
                prompts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UserInteraction for ScriptedUi {
        async fn confirm(&self, _request: &ConfirmRequest) -> Result<ConfirmResponse, CoreError> {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            Ok(self.response)
        }
    }

    fn request() -> ConfirmRequest {
        ConfirmRequest {
            title: "Overwrite Production site".into(),
            message: "This will replace the remote content.".into(),
            confirm_label: "Push".into(),
            offer_remember: true,
        }
    }

    #[tokio::test]
    async fn remembered_preference_skips_the_prompt() {
        let prefs = Arc::new(MemoryPrefs::default());
        prefs
            .set_bool(DONT_SHOW_PUSH_CONFIRMATION, true)
            .await
            .unwrap();
        let ui = Arc::new(ScriptedUi::answering(false, false));
        let policy = ConfirmationPolicy::new(prefs, ui.clone());

        let outcome = policy
            .confirm(DONT_SHOW_PUSH_CONFIRMATION, request())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Confirmed);
        assert_eq!(ui.prompts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn confirm_with_remember_persists_the_flag() {
        let prefs = Arc::new(MemoryPrefs::default());
        let ui = Arc::new(ScriptedUi::answering(true, true));
        let policy = ConfirmationPolicy::new(prefs.clone(), ui);

        let outcome = policy
            .confirm(DONT_SHOW_PULL_CONFIRMATION, request())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Confirmed);
        assert!(prefs.get_bool(DONT_SHOW_PULL_CONFIRMATION).await.unwrap());
    }

    #[tokio::test]
    async fn cancel_never_persists_remember() {
        let prefs = Arc::new(MemoryPrefs::default());
        let ui = Arc::new(ScriptedUi::answering(false, true));
        let policy = ConfirmationPolicy::new(prefs.clone(), ui);

        let outcome = policy
            .confirm(DONT_SHOW_DISCONNECT_WARNING, request())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert!(!prefs.get_bool(DONT_SHOW_DISCONNECT_WARNING).await.unwrap());
    }
}
