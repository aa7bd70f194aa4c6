// Transfer endpoints
//
// Opaque archive operations backing pull and push. The payload is a zip of
// the remote site's files and database, but its internal layout is owned by
// the remote side — this module only moves bytes between the API and the
// local filesystem.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::WpcomClient;
use crate::error::Error;

impl WpcomClient {
    /// Request a server-side backup of the remote site.
    ///
    /// Push requires this as a precondition before any destructive upload;
    /// the call returns once the backup has been accepted, not when it
    /// completes server-side.
    pub async fn create_backup(&self, site_id: u64) -> Result<(), Error> {
        let url = self.api_url(&format!("wpcom/v2/sites/{site_id}/studio-sync/backup"))?;
        self.post_empty(url).await
    }

    /// Download the remote site's files archive to `dest`.
    pub async fn download_files_archive(&self, site_id: u64, dest: &Path) -> Result<(), Error> {
        let url = self.api_url(&format!("wpcom/v2/sites/{site_id}/studio-sync/files"))?;
        self.download_to(url, dest).await
    }

    /// Download the remote site's database export to `dest`.
    pub async fn download_database_export(&self, site_id: u64, dest: &Path) -> Result<(), Error> {
        let url = self.api_url(&format!("wpcom/v2/sites/{site_id}/studio-sync/database"))?;
        self.download_to(url, dest).await
    }

    /// Upload a local site archive, restoring it over the remote site.
    pub async fn upload_site_archive(&self, site_id: u64, archive: &Path) -> Result<(), Error> {
        let url = self.api_url(&format!("wpcom/v2/sites/{site_id}/studio-sync/restore"))?;
        let body = tokio::fs::read(archive).await?;
        self.post_bytes(url, body).await
    }

    async fn download_to(&self, url: url::Url, dest: &Path) -> Result<(), Error> {
        let mut resp = self.get_raw(url).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!(path = %dest.display(), bytes = written, "download complete");
        Ok(())
    }
}
