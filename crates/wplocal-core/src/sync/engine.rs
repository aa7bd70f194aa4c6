// ── Sync engine ──
//
// Orchestrates pull and push runs as spawned tasks and tracks their
// observable state. State lives under one std mutex keyed by
// (local, remote, direction); a watch counter ticks on every change so
// frontends know when to re-read.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{error, info};

use crate::error::CoreError;
use crate::model::{RemoteSiteId, SiteId};
use crate::sync::content::SiteContent;
use crate::sync::status::{StatusCategory, SyncDirection, SyncKey, SyncState};
use crate::sync::transport::{staging_paths, SyncTransport};

#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn SyncTransport>,
    content: Arc<dyn SiteContent>,
    states: Mutex<HashMap<SyncKey, SyncState>>,
    // Bumped on every state change; receivers re-read the state map.
    version: watch::Sender<u64>,
    staging_root: PathBuf,
}

impl SyncEngine {
    pub fn new(
        transport: Arc<dyn SyncTransport>,
        content: Arc<dyn SiteContent>,
        staging_root: PathBuf,
    ) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                transport,
                content,
                states: Mutex::new(HashMap::new()),
                version,
                staging_root,
            }),
        }
    }

    /// Notified whenever any sync state changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }

    /// Begin pulling `remote` into the local site. Returns `false`
    /// without starting anything if the site already has a run in flight
    /// in either direction, or if this pair's last result has not been
    /// cleared yet.
    pub fn pull_site(&self, local: SiteId, site_path: PathBuf, remote: RemoteSiteId) -> bool {
        let key = SyncKey {
            local,
            remote,
            direction: SyncDirection::Pull,
        };
        if !self.inner.try_admit(key) {
            return false;
        }
        info!(site = %local, remote = remote.0, "pull started");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = run_pull(&inner, key, site_path).await {
                error!(site = %key.local, remote = key.remote.0, error = %e, "pull failed");
                inner.set_state(key, SyncState::failed(e.to_string()));
            }
        });
        true
    }

    /// Begin pushing the local site onto `remote`. Same admission rule as
    /// [`pull_site`](Self::pull_site).
    pub fn push_site(&self, local: SiteId, site_path: PathBuf, remote: RemoteSiteId) -> bool {
        let key = SyncKey {
            local,
            remote,
            direction: SyncDirection::Push,
        };
        if !self.inner.try_admit(key) {
            return false;
        }
        info!(site = %local, remote = remote.0, "push started");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = run_push(&inner, key, site_path).await {
                error!(site = %key.local, remote = key.remote.0, error = %e, "push failed");
                inner.set_state(key, SyncState::failed(e.to_string()));
            }
        });
        true
    }

    pub fn get_pull_state(&self, local: SiteId, remote: RemoteSiteId) -> Option<SyncState> {
        self.get_state(local, remote, SyncDirection::Pull)
    }

    pub fn get_push_state(&self, local: SiteId, remote: RemoteSiteId) -> Option<SyncState> {
        self.get_state(local, remote, SyncDirection::Push)
    }

    /// Drop a finished or failed pull state. Returns `false` while the
    /// run is still in flight.
    pub fn clear_pull_state(&self, local: SiteId, remote: RemoteSiteId) -> bool {
        self.clear_state(local, remote, SyncDirection::Pull)
    }

    pub fn clear_push_state(&self, local: SiteId, remote: RemoteSiteId) -> bool {
        self.clear_state(local, remote, SyncDirection::Push)
    }

    pub fn is_any_site_pulling(&self) -> bool {
        self.any_in_flight(SyncDirection::Pull)
    }

    pub fn is_any_site_pushing(&self) -> bool {
        self.any_in_flight(SyncDirection::Push)
    }

    fn get_state(
        &self,
        local: SiteId,
        remote: RemoteSiteId,
        direction: SyncDirection,
    ) -> Option<SyncState> {
        self.inner
            .lock_states()
            .get(&SyncKey {
                local,
                remote,
                direction,
            })
            .cloned()
    }

    fn clear_state(&self, local: SiteId, remote: RemoteSiteId, direction: SyncDirection) -> bool {
        let key = SyncKey {
            local,
            remote,
            direction,
        };
        let mut states = self.inner.lock_states();
        match states.get(&key) {
            Some(state) if state.status.is_terminal() => {
                states.remove(&key);
                drop(states);
                self.inner.version.send_modify(|v| *v += 1);
                true
            }
            _ => false,
        }
    }

    fn any_in_flight(&self, direction: SyncDirection) -> bool {
        self.inner.lock_states().iter().any(|(key, state)| {
            key.direction == direction && state.status.category() == StatusCategory::InFlight
        })
    }
}

impl Inner {
    fn lock_states(&self) -> std::sync::MutexGuard<'_, HashMap<SyncKey, SyncState>> {
        self.states.lock().expect("sync state lock poisoned")
    }

    /// Admit a new run unless the local site already has one in flight in
    /// either direction, or this exact pair still holds an uncleared
    /// terminal state. Check and insert happen under one lock so two
    /// concurrent requests cannot both win.
    fn try_admit(&self, key: SyncKey) -> bool {
        let mut states = self.lock_states();
        let busy = states.iter().any(|(k, state)| {
            k.local == key.local && state.status.category() == StatusCategory::InFlight
        });
        if busy || states.contains_key(&key) {
            return false;
        }
        states.insert(key, SyncState::queued());
        drop(states);
        self.version.send_modify(|v| *v += 1);
        true
    }

    fn set_state(&self, key: SyncKey, state: SyncState) {
        self.lock_states().insert(key, state);
        self.version.send_modify(|v| *v += 1);
    }
}

async fn run_pull(inner: &Inner, key: SyncKey, site_path: PathBuf) -> Result<(), CoreError> {
    let staging = staging_paths(&inner.staging_root, key.local, key.remote);
    tokio::fs::create_dir_all(&staging.dir).await?;

    inner.set_state(key, SyncState::in_progress("backing up local site", 10));
    inner
        .content
        .backup_local(&site_path, &staging.dir.join("local-backup"))
        .await?;

    // The remote serves downloads from a backup archive, so it has to
    // generate one before the file and database fetches below.
    inner.set_state(key, SyncState::in_progress("preparing remote backup", 25));
    inner.transport.backup_remote(key.remote).await?;

    inner.set_state(key, SyncState::in_progress("downloading files", 45));
    inner
        .transport
        .download_files(key.remote, &staging.files_archive)
        .await?;

    inner.set_state(key, SyncState::in_progress("downloading database", 65));
    inner
        .transport
        .download_database(key.remote, &staging.database_export)
        .await?;

    inner.set_state(key, SyncState::in_progress("replacing site content", 85));
    inner
        .content
        .replace_content(&site_path, &staging.files_archive, &staging.database_export)
        .await?;

    info!(site = %key.local, remote = key.remote.0, "pull finished");
    inner.set_state(key, SyncState::finished());
    Ok(())
}

async fn run_push(inner: &Inner, key: SyncKey, site_path: PathBuf) -> Result<(), CoreError> {
    let staging = staging_paths(&inner.staging_root, key.local, key.remote);
    tokio::fs::create_dir_all(&staging.dir).await?;

    // The remote snapshots itself first so a bad upload stays
    // recoverable on that side.
    inner.set_state(key, SyncState::in_progress("preparing remote backup", 15));
    inner.transport.backup_remote(key.remote).await?;

    inner.set_state(key, SyncState::in_progress("packaging site", 40));
    inner
        .content
        .package(&site_path, &staging.upload_archive)
        .await?;

    inner.set_state(key, SyncState::in_progress("uploading site", 70));
    inner
        .transport
        .upload_site(key.remote, &staging.upload_archive)
        .await?;

    info!(site = %key.local, remote = key.remote.0, "push finished");
    inner.set_state(key, SyncState::finished());
    Ok(())
}
