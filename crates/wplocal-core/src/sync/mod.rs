//! Pull/push synchronization between local sites and WordPress.com.

pub mod content;
pub mod engine;
pub mod status;
pub mod transport;

pub use content::{SiteContent, WpSiteContent};
pub use engine::SyncEngine;
pub use status::{StatusCategory, SyncDirection, SyncKey, SyncState, SyncStatusKey};
pub use transport::{SyncTransport, WpcomTransport};
