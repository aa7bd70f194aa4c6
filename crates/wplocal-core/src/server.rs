// ── Per-site lifecycle ──
//
// One `SiteServer` per registered site owns its run state. Transitions are
// serialized by an async mutex; reads go through a watch channel so
// `details()` never blocks behind a slow start.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use url::Url;

use crate::error::CoreError;
use crate::launcher::{RuntimeHandle, RuntimeLauncher};
use crate::model::{RunState, Site, SiteDetails};
use crate::ports::{PortLease, PortLeases};

const START_TIMEOUT: Duration = Duration::from_secs(30);

enum ServerState {
    Stopped,
    Running {
        lease: PortLease,
        handle: RuntimeHandle,
    },
    Deleted,
}

pub struct SiteServer {
    site: Site,
    state: Mutex<ServerState>,
    // Last committed run state. Intermediate starting/stopping phases are
    // held under the mutex and never published here.
    run: watch::Sender<RunState>,
    launcher: Arc<dyn RuntimeLauncher>,
    ports: PortLeases,
}

impl std::fmt::Debug for SiteServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteServer")
            .field("site", &self.site.id)
            .field("run", &*self.run.borrow())
            .finish()
    }
}

impl SiteServer {
    pub fn new(site: Site, launcher: Arc<dyn RuntimeLauncher>, ports: PortLeases) -> Arc<Self> {
        let (run, _) = watch::channel(RunState::Stopped);
        Arc::new(Self {
            site,
            state: Mutex::new(ServerState::Stopped),
            run,
            launcher,
            ports,
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Current details without waiting on any in-flight transition.
    pub fn details(&self) -> SiteDetails {
        SiteDetails {
            id: self.site.id,
            name: self.site.name.clone(),
            path: self.site.path.clone(),
            run: self.run.borrow().clone(),
        }
    }

    /// Start the site's runtime. A second start while already running is a
    /// no-op that returns the current details.
    pub async fn start(&self, first_run: bool) -> Result<SiteDetails, CoreError> {
        let mut state = self.state.lock().await;
        match &*state {
            ServerState::Running { .. } => return Ok(self.details()),
            ServerState::Deleted => return Err(CoreError::NotFound { id: self.site.id }),
            ServerState::Stopped => {}
        }

        let lease = self.ports.acquire()?;
        let port = lease.port();
        let handle = self.launcher.spawn(&self.site, port).await?;

        if let Err(e) = self.launcher.wait_ready(port, START_TIMEOUT).await {
            self.abort_start(handle).await;
            return Err(e);
        }
        if first_run {
            if let Err(e) = self.launcher.provision_new_site(&self.site, port).await {
                self.abort_start(handle).await;
                return Err(e);
            }
        }

        let url = local_url(port)?;
        info!(site = %self.site.id, port, %url, "site started");
        self.run.send_replace(RunState::Running {
            port,
            url: url.clone(),
        });
        *state = ServerState::Running { lease, handle };
        Ok(self.details())
    }

    /// Stop the site's runtime. Stopping an already-stopped site is a
    /// no-op.
    pub async fn stop(&self) -> Result<SiteDetails, CoreError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ServerState::Stopped) {
            ServerState::Stopped => {}
            ServerState::Deleted => {
                *state = ServerState::Deleted;
                return Err(CoreError::NotFound { id: self.site.id });
            }
            ServerState::Running { lease, handle } => {
                // Termination failures leave nothing actionable for the
                // caller; log and carry on, the lease is released either
                // way.
                if let Err(e) = self.launcher.terminate(handle).await {
                    warn!(site = %self.site.id, error = %e, "runtime termination failed");
                }
                drop(lease);
                self.run.send_replace(RunState::Stopped);
                info!(site = %self.site.id, "site stopped");
            }
        }
        Ok(self.details())
    }

    /// Stop the runtime if needed and retire this server. Every later
    /// operation reports the site as unknown.
    pub async fn delete(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if let ServerState::Running { lease, handle } =
            std::mem::replace(&mut *state, ServerState::Deleted)
        {
            if let Err(e) = self.launcher.terminate(handle).await {
                warn!(site = %self.site.id, error = %e, "runtime termination failed");
            }
            drop(lease);
        }
        self.run.send_replace(RunState::Stopped);
        Ok(())
    }

    async fn abort_start(&self, handle: RuntimeHandle) {
        if let Err(e) = self.launcher.terminate(handle).await {
            warn!(site = %self.site.id, error = %e, "cleanup after failed start failed");
        }
    }
}

fn local_url(port: u16) -> Result<Url, CoreError> {
    Url::parse(&format!("http://localhost:{port}"))
        .map_err(|e| CoreError::startup(format!("invalid site url: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedLauncher {
        fail_ready: AtomicBool,
        spawns: AtomicUsize,
        terminations: AtomicUsize,
        provisions: AtomicUsize,
    }

    #[async_trait]
    impl RuntimeLauncher for ScriptedLauncher {
        async fn spawn(&self, _site: &Site, _port: u16) -> Result<RuntimeHandle, CoreError> {
            self.spawns.fetch_add(1, Ordering::SeqCst);
            Ok(RuntimeHandle::detached())
        }

        async fn terminate(&self, _handle: RuntimeHandle) -> Result<(), CoreError> {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn wait_ready(&self, port: u16, _timeout: Duration) -> Result<(), CoreError> {
            if self.fail_ready.load(Ordering::SeqCst) {
                Err(CoreError::startup(format!("port {port} never came up")))
            } else {
                Ok(())
            }
        }

        async fn provision_new_site(&self, _site: &Site, _port: u16) -> Result<(), CoreError> {
            self.provisions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_server(launcher: Arc<ScriptedLauncher>) -> Arc<SiteServer> {
        let site = Site::at_path(PathBuf::from("/tmp/wplocal-test"), Some("Test".into()));
        SiteServer::new(site, launcher, PortLeases::new())
    }

    #[tokio::test]
    async fn start_publishes_port_and_url() {
        let launcher = Arc::new(ScriptedLauncher::default());
        let server = test_server(launcher);

        let details = server.start(false).await.unwrap();

        let port = details.run.port().unwrap();
        let url = details.run.url().unwrap();
        assert_eq!(url.as_str(), format!("http://localhost:{port}/"));
    }

    #[tokio::test]
    async fn second_start_is_a_no_op() {
        let launcher = Arc::new(ScriptedLauncher::default());
        let server = test_server(launcher.clone());

        let first = server.start(false).await.unwrap();
        let second = server.start(false).await.unwrap();

        assert_eq!(first.run.port(), second.run.port());
        assert_eq!(launcher.spawns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_run_provisions_before_reporting_running() {
        let launcher = Arc::new(ScriptedLauncher::default());
        let server = test_server(launcher.clone());

        server.start(true).await.unwrap();

        assert_eq!(launcher.provisions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_start_releases_the_port() {
        let launcher = Arc::new(ScriptedLauncher::default());
        launcher.fail_ready.store(true, Ordering::SeqCst);
        let ports = PortLeases::new();
        let site = Site::at_path(PathBuf::from("/tmp/wplocal-test"), None);
        let server = SiteServer::new(site, launcher.clone(), ports.clone());

        let err = server.start(false).await.unwrap_err();

        assert!(matches!(err, CoreError::Startup { .. }));
        assert!(ports.leased().is_empty());
        assert!(!server.details().run.is_running());
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_when_stopped_is_a_no_op() {
        let launcher = Arc::new(ScriptedLauncher::default());
        let server = test_server(launcher.clone());

        let details = server.stop().await.unwrap();

        assert!(!details.run.is_running());
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stop_terminates_and_clears_state() {
        let launcher = Arc::new(ScriptedLauncher::default());
        let server = test_server(launcher.clone());

        server.start(false).await.unwrap();
        let details = server.stop().await.unwrap();

        assert!(!details.run.is_running());
        assert_eq!(launcher.terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deleted_server_rejects_start() {
        let launcher = Arc::new(ScriptedLauncher::default());
        let server = test_server(launcher);

        server.delete().await.unwrap();
        let err = server.start(false).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
