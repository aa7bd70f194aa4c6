// ── User data document ──
//
// One JSON file holds everything that outlives a process: registered
// sites, local↔remote connections, pull snapshots, and preferences.
// Writes replace the whole document via a temp file + rename so a crash
// never leaves it half-written.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConfigError;
use wplocal_core::confirm::PreferenceStore;
use wplocal_core::error::CoreError;
use wplocal_core::model::{RemoteSiteId, Site, SiteId, Snapshot};
use wplocal_core::sync::{SyncDirection, SyncState};

/// A sync run that ended in failure and has not been acknowledged yet.
/// Blocks reruns of its pair until cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSyncRun {
    pub local: SiteId,
    pub remote: RemoteSiteId,
    pub direction: SyncDirection,
    pub state: SyncState,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserData {
    #[serde(default)]
    sites: Vec<Site>,

    /// Remote site ids each local site is connected to.
    #[serde(default)]
    connections: HashMap<SiteId, Vec<RemoteSiteId>>,

    #[serde(default)]
    snapshots: Vec<Snapshot>,

    #[serde(default)]
    preferences: HashMap<String, bool>,

    #[serde(default)]
    failed_syncs: Vec<FailedSyncRun>,
}

pub struct UserDataStore {
    path: PathBuf,
    data: Mutex<UserData>,
}

impl UserDataStore {
    /// Open the store at `path`. A missing file yields an empty document.
    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let data = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UserData::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn sites(&self) -> Vec<Site> {
        self.lock().sites.clone()
    }

    /// Replace the persisted site list with the registry's current view.
    pub fn set_sites(&self, sites: Vec<Site>) -> Result<(), ConfigError> {
        self.mutate(|data| data.sites = sites)
    }

    pub fn connections(&self, local: SiteId) -> Vec<RemoteSiteId> {
        self.lock()
            .connections
            .get(&local)
            .cloned()
            .unwrap_or_default()
    }

    /// All remote sites connected to any local site.
    pub fn connected_remotes(&self) -> Vec<RemoteSiteId> {
        let mut ids: Vec<_> = self
            .lock()
            .connections
            .values()
            .flatten()
            .copied()
            .collect();
        ids.sort_by_key(|id| id.0);
        ids.dedup();
        ids
    }

    /// Connect a local site to a remote. Idempotent.
    pub fn connect(&self, local: SiteId, remote: RemoteSiteId) -> Result<(), ConfigError> {
        self.mutate(|data| {
            let remotes = data.connections.entry(local).or_default();
            if !remotes.contains(&remote) {
                remotes.push(remote);
            }
        })
    }

    /// Remove a connection, along with any unacknowledged pull failure
    /// for the pair. Returns `false` if the connection did not exist.
    pub fn disconnect(&self, local: SiteId, remote: RemoteSiteId) -> Result<bool, ConfigError> {
        let mut removed = false;
        self.mutate(|data| {
            if let Some(remotes) = data.connections.get_mut(&local) {
                let before = remotes.len();
                remotes.retain(|id| *id != remote);
                removed = remotes.len() != before;
                if remotes.is_empty() {
                    data.connections.remove(&local);
                }
            }
            data.failed_syncs.retain(|run| {
                !(run.local == local
                    && run.remote == remote
                    && run.direction == SyncDirection::Pull)
            });
        })?;
        Ok(removed)
    }

    /// Drop everything recorded for a local site when it is deleted.
    pub fn forget_site(&self, local: SiteId) -> Result<(), ConfigError> {
        self.mutate(|data| {
            data.sites.retain(|site| site.id != local);
            data.connections.remove(&local);
            data.snapshots.retain(|snap| snap.local_site_id != local);
            data.failed_syncs.retain(|run| run.local != local);
        })
    }

    pub fn failed_syncs(&self) -> Vec<FailedSyncRun> {
        self.lock().failed_syncs.clone()
    }

    pub fn failed_sync(
        &self,
        local: SiteId,
        remote: RemoteSiteId,
        direction: SyncDirection,
    ) -> Option<FailedSyncRun> {
        self.lock()
            .failed_syncs
            .iter()
            .find(|run| run.local == local && run.remote == remote && run.direction == direction)
            .cloned()
    }

    /// Record a failed run, replacing any earlier one for the same pair
    /// and direction.
    pub fn record_failed_sync(&self, run: FailedSyncRun) -> Result<(), ConfigError> {
        self.mutate(|data| {
            data.failed_syncs.retain(|r| {
                !(r.local == run.local && r.remote == run.remote && r.direction == run.direction)
            });
            data.failed_syncs.push(run);
        })
    }

    /// Acknowledge a failed run. Returns `false` if none was recorded.
    pub fn clear_failed_sync(
        &self,
        local: SiteId,
        remote: RemoteSiteId,
        direction: SyncDirection,
    ) -> Result<bool, ConfigError> {
        let mut cleared = false;
        self.mutate(|data| {
            let before = data.failed_syncs.len();
            data.failed_syncs.retain(|run| {
                !(run.local == local && run.remote == remote && run.direction == direction)
            });
            cleared = data.failed_syncs.len() != before;
        })?;
        Ok(cleared)
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.lock().snapshots.clone()
    }

    pub fn add_snapshot(&self, snapshot: Snapshot) -> Result<(), ConfigError> {
        self.mutate(|data| data.snapshots.push(snapshot))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, UserData> {
        self.data.lock().expect("user data lock poisoned")
    }

    fn mutate(&self, apply: impl FnOnce(&mut UserData)) -> Result<(), ConfigError> {
        let mut data = self.lock();
        apply(&mut data);
        save_document(&self.path, &data)?;
        debug!(path = %self.path.display(), "user data saved");
        Ok(())
    }
}

fn save_document(path: &Path, data: &UserData) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl PreferenceStore for UserDataStore {
    async fn get_bool(&self, key: &str) -> Result<bool, CoreError> {
        Ok(*self.lock().preferences.get(key).unwrap_or(&false))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), CoreError> {
        self.mutate(|data| {
            data.preferences.insert(key.into(), value);
        })
        .map_err(|e| CoreError::Storage {
            message: e.to_string(),
        })
    }
}
