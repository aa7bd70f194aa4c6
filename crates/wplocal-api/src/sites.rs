// Sites endpoint
//
// `/rest/v1.2/me/sites` — the authenticated user's hosted sites, narrowed
// to the fields sync classification needs. The response shape (capitalized
// `ID`/`URL`, nested `plan.features.active`) is the endpoint's, not ours;
// wplocal-core converts these into its own domain types.

use serde::Deserialize;

use crate::client::WpcomClient;
use crate::error::Error;

/// Visibility/hosting filter for [`WpcomClient::list_sites`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SiteFilter {
    /// Atomic and WordPress.com simple sites, visible only. This is the
    /// filter the sync feature uses.
    #[default]
    SyncCandidates,
    /// No server-side filter.
    All,
}

/// One site as returned by the sites endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SitesEndpointSite {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(default)]
    pub is_wpcom_atomic: bool,
    #[serde(default)]
    pub is_wpcom_staging_site: bool,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(default)]
    pub options: Option<SiteOptions>,
    /// Absent for sites the user cannot see plan data for.
    #[serde(default)]
    pub plan: Option<SitePlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteOptions {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub wpcom_staging_blog_ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitePlan {
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub product_slug: String,
    #[serde(default)]
    pub features: PlanFeatures,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanFeatures {
    /// Feature slugs active on the plan. Sync eligibility checks for the
    /// sync entitlement slug here.
    #[serde(default)]
    pub active: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SitesEndpointResponse {
    sites: Vec<SitesEndpointSite>,
}

/// Fields requested from the endpoint — everything classification needs and
/// nothing more.
const SITE_FIELDS: &str = "name,ID,URL,plan,is_wpcom_staging_site,is_wpcom_atomic,options";
const SITE_OPTIONS: &str = "created_at,wpcom_staging_blog_ids";

impl WpcomClient {
    /// List the authenticated user's sites.
    pub async fn list_sites(&self, filter: SiteFilter) -> Result<Vec<SitesEndpointSite>, Error> {
        let url = self.api_url("rest/v1.2/me/sites")?;

        let mut query: Vec<(&str, &str)> = vec![
            ("fields", SITE_FIELDS),
            ("options", SITE_OPTIONS),
            ("site_visibility", "visible"),
        ];
        if filter == SiteFilter::SyncCandidates {
            query.push(("filter", "atomic,wpcom"));
        }

        let resp: SitesEndpointResponse = self.get_json(url, &query).await?;
        Ok(resp.sites)
    }
}
