// ── Runtime launcher seam ──
//
// The PHP/WordPress runtime is an external process collaborator. The engine
// only needs a start/stop/readiness-probe contract, expressed here as a
// trait so tests can substitute a scripted runtime.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::Site;

/// Resolves filesystem paths to the downloaded server assets (PHP binary,
/// WordPress tree, SQLite integration plugin, WP-CLI). Implemented by the
/// config crate over the platform data directory.
pub trait ServerFilesProvider: Send + Sync {
    fn php_binary(&self) -> PathBuf;
    fn wordpress_dir(&self) -> PathBuf;
    fn sqlite_plugin_dir(&self) -> PathBuf;
    fn wp_cli_phar(&self) -> PathBuf;
}

/// Handle to a spawned runtime process.
///
/// Opaque to callers; only the launcher that produced it knows how to
/// terminate it. Test launchers construct detached handles with no child.
pub struct RuntimeHandle {
    child: Option<Child>,
}

impl RuntimeHandle {
    pub fn from_child(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// A handle with no underlying process, for launchers that fake the
    /// runtime.
    pub fn detached() -> Self {
        Self { child: None }
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("pid", &self.child.as_ref().and_then(Child::id))
            .finish()
    }
}

/// Contract between a `SiteServer` and the process that actually serves
/// WordPress.
#[async_trait]
pub trait RuntimeLauncher: Send + Sync {
    /// Launch the runtime for `site` bound to `port`.
    async fn spawn(&self, site: &Site, port: u16) -> Result<RuntimeHandle, CoreError>;

    /// Signal the runtime to terminate and wait for it to exit.
    async fn terminate(&self, handle: RuntimeHandle) -> Result<(), CoreError>;

    /// Wait until the runtime accepts connections on `port`, bounded by
    /// `timeout`.
    async fn wait_ready(&self, port: u16, timeout: Duration) -> Result<(), CoreError>;

    /// First-run provisioning for a just-created site (default content,
    /// admin user). Runs after readiness, before the site is marked
    /// running.
    async fn provision_new_site(&self, site: &Site, port: u16) -> Result<(), CoreError>;
}

/// Production launcher: the bundled PHP binary serving the site directory,
/// with the SQLite integration plugin providing the database layer.
pub struct PhpRuntime {
    files: Arc<dyn ServerFilesProvider>,
}

impl PhpRuntime {
    pub fn new(files: Arc<dyn ServerFilesProvider>) -> Self {
        Self { files }
    }
}

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[async_trait]
impl RuntimeLauncher for PhpRuntime {
    async fn spawn(&self, site: &Site, port: u16) -> Result<RuntimeHandle, CoreError> {
        let php = self.files.php_binary();
        let database = site.path.join("wp-content/database/.ht.sqlite");

        let mut cmd = Command::new(&php);
        cmd.arg("-S")
            .arg(format!("127.0.0.1:{port}"))
            .arg("-t")
            .arg(&site.path)
            .current_dir(&site.path)
            .env("WP_SQLITE_DATABASE", &database)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            CoreError::startup(format!("failed to spawn {}: {e}", php.display()))
        })?;
        debug!(site = %site.id, port, pid = child.id(), "runtime spawned");
        Ok(RuntimeHandle::from_child(child))
    }

    async fn terminate(&self, mut handle: RuntimeHandle) -> Result<(), CoreError> {
        let Some(mut child) = handle.child.take() else {
            return Ok(());
        };
        // PHP's built-in server has no state to flush; a kill is as
        // graceful as it gets.
        if let Err(e) = child.start_kill() {
            warn!(error = %e, "runtime kill signal failed (already gone?)");
        }
        match child.wait().await {
            Ok(status) => debug!(%status, "runtime exited"),
            Err(e) => warn!(error = %e, "waiting for runtime exit failed"),
        }
        Ok(())
    }

    async fn wait_ready(&self, port: u16, timeout: Duration) -> Result<(), CoreError> {
        let probe = async {
            loop {
                if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
                    return;
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, probe).await.map_err(|_| {
            CoreError::startup(format!(
                "runtime did not become ready on port {port} within {}s",
                timeout.as_secs()
            ))
        })
    }

    async fn provision_new_site(&self, site: &Site, port: u16) -> Result<(), CoreError> {
        let status = Command::new(self.files.php_binary())
            .arg(self.files.wp_cli_phar())
            .args(["core", "install"])
            .arg(format!("--url=http://localhost:{port}"))
            .arg(format!("--title={}", site.name))
            .args([
                "--admin_user=admin",
                "--admin_password=password",
                "--admin_email=admin@localhost.localdomain",
                "--skip-email",
            ])
            .arg("--path")
            .arg(&site.path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| CoreError::startup(format!("wp-cli install failed to run: {e}")))?;

        if !status.success() {
            return Err(CoreError::startup(format!(
                "wp-cli install exited with {status}"
            )));
        }
        debug!(site = %site.id, "first-run provisioning complete");
        Ok(())
    }
}
