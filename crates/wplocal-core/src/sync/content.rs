// ── Local site content handling ──
//
// The transfer endpoints speak in archives; this module is the only place
// that knows how a WordPress working directory maps onto them. Archive and
// copy work runs on the blocking pool.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::CoreError;
use crate::provision::copy_tree;

const DATABASE_FILE: &str = "wp-content/database/.ht.sqlite";

/// Local-disk half of a sync run.
#[async_trait]
pub trait SiteContent: Send + Sync {
    /// Snapshot the site's content into `dest` before a pull overwrites
    /// it.
    async fn backup_local(&self, site: &Path, dest: &Path) -> Result<(), CoreError>;

    /// Overwrite the site's content with a downloaded files archive and
    /// database export.
    async fn replace_content(
        &self,
        site: &Path,
        files_archive: &Path,
        database_export: &Path,
    ) -> Result<(), CoreError>;

    /// Package the site's content into an archive suitable for upload.
    async fn package(&self, site: &Path, dest: &Path) -> Result<(), CoreError>;
}

/// Production implementation over the real working directory layout:
/// `wp-content/` (with the SQLite database under `wp-content/database/`)
/// plus `wp-config.php`.
pub struct WpSiteContent;

#[async_trait]
impl SiteContent for WpSiteContent {
    async fn backup_local(&self, site: &Path, dest: &Path) -> Result<(), CoreError> {
        let site = site.to_path_buf();
        let dest = dest.to_path_buf();
        run_blocking(move || {
            fs::create_dir_all(&dest)?;
            copy_tree(&site.join("wp-content"), &dest.join("wp-content"))?;
            let config = site.join("wp-config.php");
            if config.is_file() {
                fs::copy(&config, dest.join("wp-config.php"))?;
            }
            debug!(dest = %dest.display(), "local content backed up");
            Ok(())
        })
        .await
    }

    async fn replace_content(
        &self,
        site: &Path,
        files_archive: &Path,
        database_export: &Path,
    ) -> Result<(), CoreError> {
        let site = site.to_path_buf();
        let files_archive = files_archive.to_path_buf();
        let database_export = database_export.to_path_buf();
        run_blocking(move || {
            extract_archive(&files_archive, &site)?;
            let db = site.join(DATABASE_FILE);
            if let Some(parent) = db.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&database_export, &db)?;
            debug!(site = %site.display(), "site content replaced");
            Ok(())
        })
        .await
    }

    async fn package(&self, site: &Path, dest: &Path) -> Result<(), CoreError> {
        let site = site.to_path_buf();
        let dest = dest.to_path_buf();
        run_blocking(move || {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut writer = ZipWriter::new(File::create(&dest)?);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

            let config = site.join("wp-config.php");
            if config.is_file() {
                writer.start_file("wp-config.php", options)?;
                io::copy(&mut File::open(&config)?, &mut writer)?;
            }
            add_dir(&mut writer, &site.join("wp-content"), Path::new("wp-content"), options)?;

            writer.finish()?;
            debug!(dest = %dest.display(), "site packaged for upload");
            Ok(())
        })
        .await
    }
}

async fn run_blocking<F>(work: F) -> Result<(), CoreError>
where
    F: FnOnce() -> Result<(), ContentError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CoreError::Storage {
            message: format!("content task panicked: {e}"),
        })?
        .map_err(|e| CoreError::Storage {
            message: e.to_string(),
        })
}

#[derive(Debug, thiserror::Error)]
enum ContentError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn extract_archive(archive: &Path, dest: &Path) -> Result<(), ContentError> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        // enclosed_name() rejects entries that would escape dest.
        let Some(rel) = entry.enclosed_name() else {
            continue;
        };
        let target: PathBuf = dest.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            io::copy(&mut entry, &mut File::create(&target)?)?;
        }
    }
    Ok(())
}

fn add_dir(
    writer: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &Path,
    options: SimpleFileOptions,
) -> Result<(), ContentError> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let rel = prefix.join(entry.file_name());
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type()?.is_dir() {
            writer.add_directory(name, options)?;
            add_dir(writer, &entry.path(), &rel, options)?;
        } else {
            writer.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::TempDir;

    fn scaffold_site(dir: &TempDir) -> PathBuf {
        let site = dir.path().join("site");
        fs::create_dir_all(site.join("wp-content/database")).unwrap();
        fs::create_dir_all(site.join("wp-content/uploads")).unwrap();
        fs::write(site.join("wp-config.php"), "<?php // config\n").unwrap();
        fs::write(site.join("wp-content/uploads/a.txt"), "upload").unwrap();
        fs::write(site.join("wp-content/database/.ht.sqlite"), "old-db").unwrap();
        site
    }

    #[tokio::test]
    async fn package_contains_config_and_content() {
        let dir = TempDir::new().unwrap();
        let site = scaffold_site(&dir);
        let dest = dir.path().join("out/site.zip");

        WpSiteContent.package(&site, &dest).await.unwrap();

        let mut zip = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<_> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"wp-config.php".to_string()));
        assert!(names.contains(&"wp-content/uploads/a.txt".to_string()));
        assert!(names.contains(&"wp-content/database/.ht.sqlite".to_string()));
    }

    #[tokio::test]
    async fn replace_overwrites_files_and_database() {
        let dir = TempDir::new().unwrap();
        let site = scaffold_site(&dir);

        let files_archive = dir.path().join("files.zip");
        let mut writer = ZipWriter::new(File::create(&files_archive).unwrap());
        writer
            .start_file("wp-content/uploads/remote.txt", SimpleFileOptions::default())
            .unwrap();
        io::Write::write_all(&mut writer, b"from remote").unwrap();
        writer.finish().unwrap();

        let db_export = dir.path().join("database.sqlite");
        fs::write(&db_export, "new-db").unwrap();

        WpSiteContent
            .replace_content(&site, &files_archive, &db_export)
            .await
            .unwrap();

        assert_eq!(
            fs::read_to_string(site.join("wp-content/uploads/remote.txt")).unwrap(),
            "from remote"
        );
        assert_eq!(
            fs::read_to_string(site.join("wp-content/database/.ht.sqlite")).unwrap(),
            "new-db"
        );
    }

    #[tokio::test]
    async fn backup_copies_content_and_config() {
        let dir = TempDir::new().unwrap();
        let site = scaffold_site(&dir);
        let backup = dir.path().join("backup");

        WpSiteContent.backup_local(&site, &backup).await.unwrap();

        assert!(backup.join("wp-config.php").is_file());
        assert_eq!(
            fs::read_to_string(backup.join("wp-content/uploads/a.txt")).unwrap(),
            "upload"
        );
    }
}
