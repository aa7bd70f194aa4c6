// ── Sync state vocabulary ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::{RemoteSiteId, SiteId};

/// Direction of a sync run, from the local site's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Remote content overwrites the local site.
    Pull,
    /// Local content overwrites the remote site.
    Push,
}

/// Key identifying one sync run's state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncKey {
    pub local: SiteId,
    pub remote: RemoteSiteId,
    pub direction: SyncDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatusKey {
    /// Accepted, waiting for the worker to pick it up.
    Queued,
    /// Transfer phases are running.
    InProgress,
    /// Completed successfully. Terminal.
    Finished,
    /// Aborted with an error. Terminal.
    Failed,
}

/// Coarse grouping the engine uses for busy checks and clear rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    InFlight,
    Finished,
    Failed,
}

impl SyncStatusKey {
    pub fn category(self) -> StatusCategory {
        match self {
            SyncStatusKey::Queued | SyncStatusKey::InProgress => StatusCategory::InFlight,
            SyncStatusKey::Finished => StatusCategory::Finished,
            SyncStatusKey::Failed => StatusCategory::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.category() != StatusCategory::InFlight
    }
}

/// Observable progress of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub status: SyncStatusKey,
    /// Human-readable phase description, or the failure reason.
    pub message: String,
    /// Percent complete, 0..=100.
    pub progress: u8,
}

impl SyncState {
    pub fn queued() -> Self {
        Self {
            status: SyncStatusKey::Queued,
            message: "queued".into(),
            progress: 0,
        }
    }

    pub fn in_progress(message: impl Into<String>, progress: u8) -> Self {
        Self {
            status: SyncStatusKey::InProgress,
            message: message.into(),
            progress: progress.min(100),
        }
    }

    pub fn finished() -> Self {
        Self {
            status: SyncStatusKey::Finished,
            message: "finished".into(),
            progress: 100,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatusKey::Failed,
            message: message.into(),
            progress: 0,
        }
    }
}
