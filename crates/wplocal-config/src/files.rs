// ── Server asset paths ──

use std::path::PathBuf;

use wplocal_core::launcher::ServerFilesProvider;

const SQLITE_PLUGIN_SLUG: &str = "sqlite-database-integration";

/// Resolves the bundled server assets under the application data
/// directory (`server-files/`): the PHP binary, a pristine WordPress
/// tree, the SQLite integration plugin, and WP-CLI.
pub struct AppServerFiles {
    root: PathBuf,
}

impl AppServerFiles {
    pub fn new() -> Self {
        Self {
            root: crate::server_files_dir(),
        }
    }

    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Default for AppServerFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerFilesProvider for AppServerFiles {
    fn php_binary(&self) -> PathBuf {
        self.root.join("php/bin/php")
    }

    fn wordpress_dir(&self) -> PathBuf {
        self.root.join("wordpress")
    }

    fn sqlite_plugin_dir(&self) -> PathBuf {
        self.root.join(SQLITE_PLUGIN_SLUG)
    }

    fn wp_cli_phar(&self) -> PathBuf {
        self.root.join("wp-cli.phar")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_root() {
        let files = AppServerFiles::at(PathBuf::from("/data/server-files"));
        assert_eq!(
            files.sqlite_plugin_dir(),
            PathBuf::from("/data/server-files/sqlite-database-integration")
        );
        assert_eq!(
            files.wp_cli_phar(),
            PathBuf::from("/data/server-files/wp-cli.phar")
        );
    }
}
