// ── Site registry ──

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::error::CoreError;
use crate::launcher::{RuntimeLauncher, ServerFilesProvider};
use crate::model::{Site, SiteDetails, SiteId};
use crate::ports::PortLeases;
use crate::provision::{self, Prepared};
use crate::server::SiteServer;

/// Authoritative collection of registered sites and their servers.
///
/// Lookups and inserts go through a concurrent map; per-site lifecycle
/// lives in the individual [`SiteServer`]s, so operations on different
/// sites never contend.
pub struct SiteRegistry {
    servers: DashMap<SiteId, Arc<SiteServer>>,
    ports: PortLeases,
    launcher: Arc<dyn RuntimeLauncher>,
    files: Arc<dyn ServerFilesProvider>,
}

impl SiteRegistry {
    pub fn new(launcher: Arc<dyn RuntimeLauncher>, files: Arc<dyn ServerFilesProvider>) -> Self {
        Self::with_ports(launcher, files, PortLeases::new())
    }

    pub fn with_ports(
        launcher: Arc<dyn RuntimeLauncher>,
        files: Arc<dyn ServerFilesProvider>,
        ports: PortLeases,
    ) -> Self {
        Self {
            servers: DashMap::new(),
            ports,
            launcher,
            files,
        }
    }

    /// Load previously persisted sites at startup. All come up stopped.
    pub fn populate(&self, sites: Vec<Site>) -> Result<(), CoreError> {
        for site in sites {
            self.insert(site)?;
        }
        Ok(())
    }

    /// Register a site. Fails if the id is already taken; the check and
    /// insert are a single atomic entry operation.
    pub fn insert(&self, site: Site) -> Result<Arc<SiteServer>, CoreError> {
        match self.servers.entry(site.id) {
            Entry::Occupied(_) => Err(CoreError::AlreadyRegistered { id: site.id }),
            Entry::Vacant(slot) => {
                let server =
                    SiteServer::new(site, Arc::clone(&self.launcher), self.ports.clone());
                slot.insert(Arc::clone(&server));
                Ok(server)
            }
        }
    }

    /// Create a site: provision the working directory and register it in
    /// the stopped state. Returns the server plus whether a fresh
    /// WordPress tree was written, so the caller's first `start` knows to
    /// run first-run provisioning.
    pub async fn create(
        &self,
        path: PathBuf,
        name: Option<String>,
    ) -> Result<(Arc<SiteServer>, Prepared), CoreError> {
        let prepared =
            provision::prepare_site_directory(Arc::clone(&self.files), path.clone()).await?;
        let site = Site::at_path(path, name);
        info!(site = %site.id, name = %site.name, "site created");
        let server = self.insert(site)?;
        Ok((server, prepared))
    }

    pub fn get(&self, id: SiteId) -> Result<Arc<SiteServer>, CoreError> {
        self.servers
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(CoreError::NotFound { id })
    }

    pub fn details(&self, id: SiteId) -> Result<SiteDetails, CoreError> {
        Ok(self.get(id)?.details())
    }

    /// Details for every registered site, sorted by name.
    pub fn list(&self) -> Vec<SiteDetails> {
        let mut all: Vec<_> = self
            .servers
            .iter()
            .map(|entry| entry.value().details())
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Stop the site if running, retire its server, drop it from the
    /// registry, and optionally remove its files from disk.
    pub async fn delete(&self, id: SiteId, delete_files: bool) -> Result<(), CoreError> {
        let server = self.get(id)?;
        server.delete().await?;
        self.servers.remove(&id);
        if delete_files {
            provision::delete_site_files(server.site().path.clone()).await;
        }
        info!(site = %id, delete_files, "site deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use async_trait::async_trait;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::launcher::RuntimeHandle;

    struct NullLauncher;

    #[async_trait]
    impl RuntimeLauncher for NullLauncher {
        async fn spawn(&self, _site: &Site, _port: u16) -> Result<RuntimeHandle, CoreError> {
            Ok(RuntimeHandle::detached())
        }
        async fn terminate(&self, _handle: RuntimeHandle) -> Result<(), CoreError> {
            Ok(())
        }
        async fn wait_ready(&self, _port: u16, _timeout: Duration) -> Result<(), CoreError> {
            Ok(())
        }
        async fn provision_new_site(&self, _site: &Site, _port: u16) -> Result<(), CoreError> {
            Ok(())
        }
    }

    struct AssetFiles {
        root: PathBuf,
    }

    impl ServerFilesProvider for AssetFiles {
        fn php_binary(&self) -> PathBuf {
            self.root.join("php")
        }
        fn wordpress_dir(&self) -> PathBuf {
            self.root.join("wordpress")
        }
        fn sqlite_plugin_dir(&self) -> PathBuf {
            self.root.join("sqlite-plugin")
        }
        fn wp_cli_phar(&self) -> PathBuf {
            self.root.join("wp-cli.phar")
        }
    }

    fn registry(assets: &TempDir) -> SiteRegistry {
        let root = assets.path().to_path_buf();
        fs::create_dir_all(root.join("wordpress")).unwrap();
        fs::write(root.join("wordpress/index.php"), "<?php\n").unwrap();
        fs::create_dir_all(root.join("sqlite-plugin")).unwrap();
        fs::write(root.join("sqlite-plugin/load.php"), "<?php\n").unwrap();
        SiteRegistry::new(Arc::new(NullLauncher), Arc::new(AssetFiles { root }))
    }

    #[tokio::test]
    async fn create_registers_stopped_with_default_name() {
        let assets = TempDir::new().unwrap();
        let sites = TempDir::new().unwrap();
        let registry = registry(&assets);

        let (server, prepared) = registry
            .create(sites.path().join("alpha"), None)
            .await
            .unwrap();

        let details = server.details();
        assert_eq!(prepared, Prepared::Fresh);
        assert_eq!(details.name, "alpha");
        assert!(!details.run.is_running());
        assert_eq!(registry.list().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let assets = TempDir::new().unwrap();
        let registry = registry(&assets);
        let site = Site::at_path(PathBuf::from("/tmp/a"), None);
        let twin = site.clone();

        registry.insert(site).unwrap();
        let err = registry.insert(twin).unwrap_err();

        assert!(matches!(err, CoreError::AlreadyRegistered { .. }));
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let assets = TempDir::new().unwrap();
        let registry = registry(&assets);
        registry
            .insert(Site::at_path(PathBuf::from("/tmp/zeta"), None))
            .unwrap();
        registry
            .insert(Site::at_path(PathBuf::from("/tmp/alpha"), None))
            .unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|d| d.name).collect();

        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn delete_removes_entry_and_files() {
        let assets = TempDir::new().unwrap();
        let sites = TempDir::new().unwrap();
        let registry = registry(&assets);
        let (server, _) = registry
            .create(sites.path().join("doomed"), None)
            .await
            .unwrap();
        let id = server.site().id;

        registry.delete(id, true).await.unwrap();

        assert!(matches!(
            registry.details(id),
            Err(CoreError::NotFound { .. })
        ));
        assert!(!sites.path().join("doomed").exists());
    }

    #[tokio::test]
    async fn unknown_site_is_not_found() {
        let assets = TempDir::new().unwrap();
        let registry = registry(&assets);

        let err = registry.details(SiteId::new()).unwrap_err();

        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
