//! Canonical domain types.
//!
//! The persisted [`Site`] record is the durable source of truth for
//! identity, path, and name. Runtime facts (running, port, url) live only in
//! the [`RunState`] projection a [`crate::server::SiteServer`] maintains.

pub mod remote;
pub mod site;
pub mod snapshot;

pub use remote::{RemoteSiteId, SyncSite, SyncSupport, SYNC_FEATURE};
pub use site::{RunState, Site, SiteDetails, SiteId};
pub use snapshot::Snapshot;
