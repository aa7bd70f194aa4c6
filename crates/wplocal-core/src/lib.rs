//! Engine layer between `wplocal-api` and frontend consumers.
//!
//! This crate owns the business logic and domain model for the wplocal
//! workspace:
//!
//! - **[`SiteRegistry`]** — Authoritative collection of registered local
//!   sites. Creates (provision + register + start), looks up, lists, and
//!   deletes sites; per-site concurrency lives in the servers it vends.
//!
//! - **[`SiteServer`]** — One per site, owning its run state. Transitions
//!   are serialized by an async mutex while
//!   [`details()`](SiteServer::details) reads a `tokio::sync::watch`
//!   channel, so status queries never block behind a slow start.
//!
//! - **[`RuntimeLauncher`]** — Seam to the external PHP/WordPress process.
//!   [`PhpRuntime`](launcher::PhpRuntime) spawns the bundled PHP server;
//!   tests substitute scripted launchers.
//!
//! - **[`SyncEngine`]** — Pull/push runs against WordPress.com as spawned
//!   tasks, with per-site admission control and observable
//!   [`SyncState`](sync::SyncState)s keyed by (local, remote, direction).
//!
//! - **[`ConfirmationPolicy`]** — "Don't ask again" gating for the
//!   destructive operations (push, pull, disconnect).
//!
//! - **Domain model** ([`model`]) — [`Site`], [`SiteDetails`] with its
//!   closed [`RunState`], remote [`SyncSite`] classification, and
//!   [`Snapshot`] records.

pub mod confirm;
pub mod error;
pub mod launcher;
pub mod model;
pub mod ports;
pub mod provision;
pub mod registry;
pub mod server;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use confirm::{ConfirmRequest, ConfirmResponse, ConfirmationPolicy, Outcome, PreferenceStore, UserInteraction};
pub use error::CoreError;
pub use launcher::{PhpRuntime, RuntimeLauncher, ServerFilesProvider};
pub use model::{RemoteSiteId, RunState, Site, SiteDetails, SiteId, Snapshot, SyncSite, SyncSupport};
pub use ports::PortLeases;
pub use registry::SiteRegistry;
pub use server::SiteServer;
pub use sync::{SyncDirection, SyncEngine, SyncState, SyncStatusKey, WpcomTransport, WpSiteContent};
