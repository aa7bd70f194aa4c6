use std::path::PathBuf;

use thiserror::Error;

use crate::model::SiteId;

/// Top-level error type for the `wplocal-core` crate.
///
/// Failures internal to a single phase of an in-flight sync are not
/// propagated as errors at all — they end up as the tracked state's `Failed`
/// status, because the submitter observes sync by polling, not through the
/// call that started it. Everything else surfaces through these variants.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Site lifecycle ──────────────────────────────────────────────
    /// Port allocation or runtime startup failure. The site remains
    /// stopped; no partial running state is ever observable.
    #[error("Site failed to start: {reason}")]
    Startup { reason: String },

    /// Working-directory provisioning failure before any site record
    /// exists, so there is nothing to roll back.
    #[error("Could not provision site directory {path}: {reason}")]
    Provisioning { path: PathBuf, reason: String },

    /// An operation addressed an id the registry does not know.
    #[error("Unknown site: {id}")]
    NotFound { id: SiteId },

    /// `SiteRegistry::create` was called for an id that already has a
    /// live server.
    #[error("Site already registered: {id}")]
    AlreadyRegistered { id: SiteId },

    // ── Sync ────────────────────────────────────────────────────────
    /// A step of a pull/push transfer failed. Only ever observed as the
    /// message of a `Failed` tracked state.
    #[error("Transfer failed: {message}")]
    Transfer { message: String },

    // ── Collaborators ───────────────────────────────────────────────
    /// Persistence layer failure (user-data document, preferences).
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// WordPress.com API failure.
    #[error(transparent)]
    Api(#[from] wplocal_api::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn startup(reason: impl Into<String>) -> Self {
        Self::Startup {
            reason: reason.into(),
        }
    }

    pub(crate) fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }
}
