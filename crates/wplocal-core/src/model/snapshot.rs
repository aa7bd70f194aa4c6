// ── Published snapshot record ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::remote::RemoteSiteId;
use super::site::SiteId;

/// A published point-in-time copy of a local site.
///
/// Created by the publish action (an external collaborator) and persisted in
/// the user-data document alongside sites. The core only lists and saves
/// these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Public URL of the published copy.
    pub url: String,
    pub remote_site_id: RemoteSiteId,
    pub local_site_id: SiteId,
    pub created_at: DateTime<Utc>,
}
