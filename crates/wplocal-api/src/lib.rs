//! Async client for the WordPress.com REST API surfaces wplocal depends on.
//!
//! Two surfaces are covered:
//!
//! - **Sites endpoint** (`/rest/v1.2/me/sites`) — the authenticated user's
//!   hosted sites with the plan/hosting fields needed to classify sync
//!   eligibility. See [`SitesEndpointSite`].
//! - **Transfer endpoints** — opaque archive backup/download/upload
//!   operations consumed by the sync engine. The archive byte format is
//!   owned by the remote side; this crate only moves it.
//!
//! Authentication is a bearer token supplied by the caller. How that token
//! is obtained and stored is out of scope here.

pub mod client;
pub mod error;
pub mod sites;
pub mod transfer;

pub use client::WpcomClient;
pub use error::Error;
pub use sites::{SiteFilter, SitesEndpointSite, SitePlan, SiteOptions};
