//! Shared application context assembled at startup.

use std::str::FromStr;
use std::sync::Arc;

use url::Url;

use wplocal_api::{SiteFilter, WpcomClient};
use wplocal_config::{AppConfig, AppServerFiles, UserDataStore};
use wplocal_core::confirm::{ConfirmationPolicy, PreferenceStore, UserInteraction};
use wplocal_core::launcher::ServerFilesProvider;
use wplocal_core::sync::{SyncEngine, WpSiteContent, WpcomTransport};
use wplocal_core::{PhpRuntime, Site, SiteId, SiteRegistry, SiteServer, SyncSite};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::prompt::TerminalPrompts;

pub struct App {
    pub config: AppConfig,
    pub store: Arc<UserDataStore>,
    pub registry: SiteRegistry,
    prompts: Arc<TerminalPrompts>,
}

impl App {
    /// Load config and user data, then bring the registry up with every
    /// persisted site in the stopped state.
    pub fn bootstrap(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = wplocal_config::load_config_or_default();
        let store = Arc::new(UserDataStore::open(wplocal_config::user_data_path())?);

        let files: Arc<dyn ServerFilesProvider> = Arc::new(AppServerFiles::new());
        let launcher = Arc::new(PhpRuntime::new(Arc::clone(&files)));
        let registry = SiteRegistry::new(launcher, files);
        registry.populate(store.sites())?;

        Ok(Self {
            config,
            store,
            registry,
            prompts: Arc::new(TerminalPrompts::new(global.yes)),
        })
    }

    pub fn api_client(&self) -> Result<Arc<WpcomClient>, CliError> {
        let token = wplocal_config::resolve_token(&self.config).map_err(|_| CliError::NoToken)?;
        let base = Url::parse(&self.config.api_base).map_err(wplocal_api::Error::from)?;
        Ok(Arc::new(WpcomClient::new(base, &token)?))
    }

    /// Engine for the single run this invocation drives. In-flight
    /// state lives here; failures that outlive the process are recorded
    /// in the user-data store by the sync command.
    pub fn sync_engine(&self, client: Arc<WpcomClient>) -> SyncEngine {
        SyncEngine::new(
            Arc::new(WpcomTransport::new(client)),
            Arc::new(WpSiteContent),
            wplocal_config::staging_dir(),
        )
    }

    pub fn confirmation(&self) -> ConfirmationPolicy {
        ConfirmationPolicy::new(
            Arc::clone(&self.store) as Arc<dyn PreferenceStore>,
            Arc::clone(&self.prompts) as Arc<dyn UserInteraction>,
        )
    }

    /// Find a site by exact id or (case-insensitive) name.
    pub fn resolve_site(&self, needle: &str) -> Result<Arc<SiteServer>, CliError> {
        if let Ok(id) = SiteId::from_str(needle) {
            if let Ok(server) = self.registry.get(id) {
                return Ok(server);
            }
        }
        let lowered = needle.to_lowercase();
        self.registry
            .list()
            .iter()
            .find(|details| details.name.to_lowercase() == lowered)
            .and_then(|details| self.registry.get(details.id).ok())
            .ok_or_else(|| CliError::SiteNotFound {
                needle: needle.into(),
            })
    }

    /// Write the registry's current site list back to the user data file.
    pub fn persist_sites(&self) -> Result<(), CliError> {
        let sites: Vec<Site> = self
            .registry
            .list()
            .into_iter()
            .map(|details| Site {
                id: details.id,
                name: details.name,
                path: details.path,
            })
            .collect();
        self.store.set_sites(sites)?;
        Ok(())
    }

    /// Fetch the account's sites and classify each against the stored
    /// connections.
    pub async fn fetch_remotes(
        &self,
        client: &WpcomClient,
        filter: SiteFilter,
    ) -> Result<Vec<SyncSite>, CliError> {
        let connected = self.store.connected_remotes();
        let sites = client.list_sites(filter).await?;
        Ok(sites
            .iter()
            .map(|site| SyncSite::from_endpoint(site, &connected))
            .collect())
    }
}
