// ── Working-directory provisioning ──
//
// Lays down the WordPress tree and the SQLite integration plugin when a
// site is created, and tears the directory down on delete. All the heavy
// copying runs on the blocking pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::launcher::ServerFilesProvider;

const SQLITE_PLUGIN_SLUG: &str = "sqlite-database-integration";

/// Whether `path` already holds a WordPress site we can adopt.
pub fn looks_like_site(path: &Path) -> bool {
    path.join("wp-config.php").is_file() || path.join("wp-content").is_dir()
}

/// Outcome of [`prepare_site_directory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prepared {
    /// Fresh WordPress tree was written; first-run install is needed.
    Fresh,
    /// The directory already contained a site and was adopted as-is.
    Existing,
}

/// Ensure `path` is a usable site working directory.
///
/// Empty or missing directories get a fresh WordPress tree copied from the
/// server assets. A directory that already looks like a site is adopted
/// untouched. Anything else is refused.
pub async fn prepare_site_directory(
    files: Arc<dyn ServerFilesProvider>,
    path: PathBuf,
) -> Result<Prepared, CoreError> {
    tokio::task::spawn_blocking(move || prepare_blocking(files.as_ref(), &path))
        .await
        .map_err(|e| CoreError::Storage {
            message: format!("provisioning task panicked: {e}"),
        })?
}

fn prepare_blocking(
    files: &dyn ServerFilesProvider,
    path: &Path,
) -> Result<Prepared, CoreError> {
    if path.exists() {
        let mut entries = fs::read_dir(path).map_err(|e| provisioning(path, e))?;
        if entries.next().is_some() {
            if looks_like_site(path) {
                debug!(path = %path.display(), "adopting existing site directory");
                return Ok(Prepared::Existing);
            }
            return Err(CoreError::Provisioning {
                path: path.to_path_buf(),
                reason: "directory is not empty and does not contain a WordPress site".into(),
            });
        }
    } else {
        fs::create_dir_all(path).map_err(|e| provisioning(path, e))?;
    }

    copy_tree(&files.wordpress_dir(), path).map_err(|e| provisioning(path, e))?;
    copy_tree(
        &files.sqlite_plugin_dir(),
        &path.join("wp-content/plugins").join(SQLITE_PLUGIN_SLUG),
    )
    .map_err(|e| provisioning(path, e))?;

    // The plugin ships the db.php drop-in that routes WordPress onto
    // SQLite; it must live directly under wp-content to load.
    let drop_in = path
        .join("wp-content/plugins")
        .join(SQLITE_PLUGIN_SLUG)
        .join("db.copy");
    if drop_in.is_file() {
        fs::copy(&drop_in, path.join("wp-content/db.php")).map_err(|e| provisioning(path, e))?;
    }

    fs::create_dir_all(path.join("wp-content/database")).map_err(|e| provisioning(path, e))?;
    write_wp_config(path).map_err(|e| provisioning(path, e))?;

    debug!(path = %path.display(), "fresh site directory provisioned");
    Ok(Prepared::Fresh)
}

fn write_wp_config(path: &Path) -> std::io::Result<()> {
    let config = path.join("wp-config.php");
    if config.exists() {
        return Ok(());
    }
    fs::write(
        config,
        concat!(
            "<?php\n",
            "define( 'DB_NAME', 'wordpress' );\n",
            "define( 'DB_USER', 'admin' );\n",
            "define( 'DB_PASSWORD', 'password' );\n",
            "define( 'DB_HOST', 'localhost' );\n",
            "define( 'WP_DEBUG', false );\n",
            "$table_prefix = 'wp_';\n",
            "if ( ! defined( 'ABSPATH' ) ) {\n",
            "\tdefine( 'ABSPATH', __DIR__ . '/' );\n",
            "}\n",
            "require_once ABSPATH . 'wp-settings.php';\n",
        ),
    )
}

/// Remove a site's working directory. Best effort: a failure is logged and
/// swallowed so the registry entry still goes away.
pub async fn delete_site_files(path: PathBuf) {
    let result = tokio::task::spawn_blocking(move || {
        if let Err(e) = fs::remove_dir_all(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove site directory");
            }
        }
    })
    .await;
    if let Err(e) = result {
        warn!(error = %e, "site directory removal task panicked");
    }
}

pub(crate) fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn provisioning(path: &Path, e: std::io::Error) -> CoreError {
    CoreError::Provisioning {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;

    struct FakeFiles {
        root: PathBuf,
    }

    impl ServerFilesProvider for FakeFiles {
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

    fn fake_files(assets: &TempDir) -> Arc<dyn ServerFilesProvider> {
        let root = assets.path().to_path_buf();
        fs::create_dir_all(root.join("wordpress/wp-includes")).unwrap();
        fs::write(root.join("wordpress/index.php"), "<?php\n").unwrap();
        fs::write(root.join("wordpress/wp-includes/version.php"), "<?php\n").unwrap();
        fs::create_dir_all(root.join("sqlite-plugin")).unwrap();
        fs::write(root.join("sqlite-plugin/load.php"), "<?php\n").unwrap();
        fs::write(root.join("sqlite-plugin/db.copy"), "<?php // drop-in\n").unwrap();
        Arc::new(FakeFiles { root })
    }

    #[tokio::test]
    async fn provisions_fresh_directory() {
        let assets = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        let dest = site.path().join("my-site");

        let prepared = prepare_site_directory(fake_files(&assets), dest.clone())
            .await
            .unwrap();

        assert_eq!(prepared, Prepared::Fresh);
        assert!(dest.join("index.php").is_file());
        assert!(dest.join("wp-config.php").is_file());
        assert!(dest.join("wp-content/db.php").is_file());
        assert!(dest
            .join("wp-content/plugins/sqlite-database-integration/load.php")
            .is_file());
        assert!(dest.join("wp-content/database").is_dir());
    }

    #[tokio::test]
    async fn adopts_existing_site_untouched() {
        let assets = TempDir::new().unwrap();
        let site = TempDir::new().unwrap();
        fs::create_dir_all(site.path().join("wp-content")).unwrap();
        fs::write(site.path().join("wp-config.php"), "<?php // mine\n").unwrap();

        let prepared =
            prepare_site_directory(fake_files(&assets), site.path().to_path_buf())
                .await
                .unwrap();

        assert_eq!(prepared, Prepared::Existing);
        let config = fs::read_to_string(site.path().join("wp-config.php")).unwrap();
        assert!(config.contains("mine"));
    }

    #[tokio::test]
    async fn refuses_non_empty_non_site_directory() {
        let assets = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();

        let err = prepare_site_directory(fake_files(&assets), dir.path().to_path_buf())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Provisioning { .. }));
    }

    #[tokio::test]
    async fn delete_is_silent_when_directory_is_gone() {
        delete_site_files(PathBuf::from("/nonexistent/wplocal-test-site")).await;
    }
}
