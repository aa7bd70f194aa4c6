// ── Remote (WordPress.com) site descriptor ──
//
// Converts the raw sites-endpoint payload into the canonical `SyncSite`
// with its derived sync-support classification. Classification is computed
// at conversion time and never stored remotely.

use std::fmt;

use serde::{Deserialize, Serialize};
use wplocal_api::SitesEndpointSite;

/// Numeric identifier of a WordPress.com site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteSiteId(pub u64);

impl fmt::Display for RemoteSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plan feature slug gating sync eligibility.
pub const SYNC_FEATURE: &str = "studio-sync";

/// Whether (and how) a remote site can participate in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SyncSupport {
    /// The plan lacks the sync entitlement.
    Unsupported,
    /// Eligible and ready to connect.
    Syncable,
    /// Entitled but not on Atomic hosting yet; a transfer is required first.
    NeedsTransfer,
    /// Already connected to one of this user's local sites.
    AlreadyConnected,
}

/// A remote site eligible (or not) for syncing against a local site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSite {
    pub id: RemoteSiteId,
    pub name: String,
    pub url: String,
    pub is_staging: bool,
    pub staging_site_ids: Vec<RemoteSiteId>,
    pub sync_support: SyncSupport,
}

impl SyncSite {
    /// Build a `SyncSite` from the raw endpoint payload, classifying it
    /// against the caller's set of already-connected remote ids.
    pub fn from_endpoint(site: &SitesEndpointSite, connected: &[RemoteSiteId]) -> Self {
        Self {
            id: RemoteSiteId(site.id),
            name: site.name.clone(),
            url: site.url.clone(),
            is_staging: site.is_wpcom_staging_site,
            staging_site_ids: site
                .options
                .as_ref()
                .map(|o| o.wpcom_staging_blog_ids.iter().map(|&id| RemoteSiteId(id)).collect())
                .unwrap_or_default(),
            sync_support: classify(site, connected),
        }
    }
}

/// Derive the sync-support classification.
///
/// Precedence is fixed: connected status beats everything, then plan
/// entitlement, then hosting tier.
fn classify(site: &SitesEndpointSite, connected: &[RemoteSiteId]) -> SyncSupport {
    if connected.iter().any(|c| c.0 == site.id) {
        return SyncSupport::AlreadyConnected;
    }
    let entitled = site
        .plan
        .as_ref()
        .is_some_and(|plan| plan.features.active.iter().any(|f| f == SYNC_FEATURE));
    if !entitled {
        return SyncSupport::Unsupported;
    }
    if !site.is_wpcom_atomic {
        return SyncSupport::NeedsTransfer;
    }
    SyncSupport::Syncable
}
