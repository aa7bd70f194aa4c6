// ── Sync transport seam ──
//
// Everything that crosses the network during a sync goes through this
// trait. The production implementation delegates to the WordPress.com
// client; tests script it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{RemoteSiteId, SiteId};
use wplocal_api::WpcomClient;

/// Remote operations a sync run needs, at artifact granularity.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Ask the remote to snapshot itself before we overwrite it.
    async fn backup_remote(&self, remote: RemoteSiteId) -> Result<(), CoreError>;

    /// Download the remote's files archive to `dest`.
    async fn download_files(&self, remote: RemoteSiteId, dest: &Path) -> Result<(), CoreError>;

    /// Download the remote's database export to `dest`.
    async fn download_database(&self, remote: RemoteSiteId, dest: &Path) -> Result<(), CoreError>;

    /// Upload a packaged local site archive to the remote.
    async fn upload_site(&self, remote: RemoteSiteId, archive: &Path) -> Result<(), CoreError>;
}

/// Production transport over the WordPress.com REST API.
pub struct WpcomTransport {
    client: Arc<WpcomClient>,
}

impl WpcomTransport {
    pub fn new(client: Arc<WpcomClient>) -> Self {
        Self { client }
    }
}

fn transfer_err(op: &str, e: wplocal_api::Error) -> CoreError {
    CoreError::transfer(format!("{op}: {e}"))
}

#[async_trait]
impl SyncTransport for WpcomTransport {
    async fn backup_remote(&self, remote: RemoteSiteId) -> Result<(), CoreError> {
        self.client
            .create_backup(remote.0)
            .await
            .map_err(|e| transfer_err("remote backup", e))
    }

    async fn download_files(&self, remote: RemoteSiteId, dest: &Path) -> Result<(), CoreError> {
        self.client
            .download_files_archive(remote.0, dest)
            .await
            .map_err(|e| transfer_err("files download", e))
    }

    async fn download_database(&self, remote: RemoteSiteId, dest: &Path) -> Result<(), CoreError> {
        self.client
            .download_database_export(remote.0, dest)
            .await
            .map_err(|e| transfer_err("database download", e))
    }

    async fn upload_site(&self, remote: RemoteSiteId, archive: &Path) -> Result<(), CoreError> {
        self.client
            .upload_site_archive(remote.0, archive)
            .await
            .map_err(|e| transfer_err("site upload", e))
    }
}

/// Where a sync run stages its intermediate artifacts on disk. Keyed by
/// both ends of the pair: two local sites may sync against the same
/// remote concurrently, and their artifacts must not collide.
pub fn staging_paths(root: &Path, local: SiteId, remote: RemoteSiteId) -> StagingPaths {
    let dir = root.join(format!("sync-{}-{}", local, remote.0));
    StagingPaths {
        files_archive: dir.join("files.zip"),
        database_export: dir.join("database.sqlite"),
        upload_archive: dir.join("site.zip"),
        dir,
    }
}

pub struct StagingPaths {
    pub dir: PathBuf,
    pub files_archive: PathBuf,
    pub database_export: PathBuf,
    pub upload_archive: PathBuf,
}
