// ── Local site domain types ──

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Opaque unique identifier of a local site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(Uuid);

impl SiteId {
    /// Generate a fresh id for a newly created site.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for SiteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The persisted site record.
///
/// This is what the user-data document stores. Everything runtime-derived
/// (running, port, url) is deliberately absent — see [`SiteDetails`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub path: PathBuf,
}

impl Site {
    /// Create a record for a site rooted at `path`.
    ///
    /// When `name` is not supplied it defaults to the last path segment,
    /// falling back to the whole path for roots like `/`.
    pub fn at_path(path: PathBuf, name: Option<String>) -> Self {
        let name = name.unwrap_or_else(|| default_site_name(&path));
        Self {
            id: SiteId::new(),
            name,
            path,
        }
    }
}

fn default_site_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runtime run state of a site.
///
/// A closed union instead of `running: bool` plus optional port/url: the
/// invariant "running implies port and url are both set" holds by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RunState {
    Stopped,
    Running { port: u16, url: Url },
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Running { port, .. } => Some(*port),
            Self::Stopped => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Running { url, .. } => Some(url),
            Self::Stopped => None,
        }
    }
}

/// Immutable snapshot of a site as consumers see it: the persisted record
/// joined with the live run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDetails {
    pub id: SiteId,
    pub name: String,
    pub path: PathBuf,
    pub run: RunState,
}

impl SiteDetails {
    /// Details for a site that is not running (also the shape used for
    /// persisted records without a live server).
    pub fn stopped(record: &Site) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            path: record.path.clone(),
            run: RunState::Stopped,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn site_name_defaults_to_last_path_segment() {
        let site = Site::at_path(PathBuf::from("/home/dev/sites/my-blog"), None);
        assert_eq!(site.name, "my-blog");
    }

    #[test]
    fn explicit_name_wins_over_path_segment() {
        let site = Site::at_path(PathBuf::from("/tmp/dir"), Some("Client Site".into()));
        assert_eq!(site.name, "Client Site");
    }

    #[test]
    fn run_state_exposes_port_and_url_only_when_running() {
        let stopped = RunState::Stopped;
        assert!(!stopped.is_running());
        assert_eq!(stopped.port(), None);
        assert!(stopped.url().is_none());

        let url = Url::parse("http://localhost:8881").unwrap();
        let running = RunState::Running {
            port: 8881,
            url: url.clone(),
        };
        assert!(running.is_running());
        assert_eq!(running.port(), Some(8881));
        assert_eq!(running.url(), Some(&url));
    }

    #[test]
    fn site_record_round_trips_through_json() {
        let site = Site::at_path(PathBuf::from("/srv/site"), None);
        let json = serde_json::to_string(&site).unwrap();
        let back: Site = serde_json::from_str(&json).unwrap();
        assert_eq!(site, back);
    }
}
