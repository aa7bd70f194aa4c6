//! CLI error types with miette diagnostics.
//!
//! Maps engine and config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use wplocal_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const CANCELLED: i32 = 10;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("No site matches '{needle}'")]
    #[diagnostic(
        code(wplocal::site_not_found),
        help("Run: wplocal site list to see registered sites")
    )]
    SiteNotFound { needle: String },

    #[error("No WordPress.com site with id {id}")]
    #[diagnostic(
        code(wplocal::remote_not_found),
        help("Run: wplocal remote list to see sites on your account")
    )]
    RemoteNotFound { id: u64 },

    #[error("Site '{name}' cannot sync: {reason}")]
    #[diagnostic(code(wplocal::sync_unsupported))]
    SyncUnsupported { name: String, reason: String },

    #[error("Site is busy with another sync")]
    #[diagnostic(
        code(wplocal::sync_busy),
        help("Wait for the current pull or push to finish, then retry.\nRun: wplocal sync status")
    )]
    SyncBusy,

    #[error("The last {direction} for this pair failed and has not been acknowledged")]
    #[diagnostic(
        code(wplocal::sync_state_held),
        help("Run: wplocal sync clear <site> <remote> --direction {direction}")
    )]
    SyncStateHeld {
        direction: wplocal_core::SyncDirection,
    },

    #[error("No WordPress.com token configured")]
    #[diagnostic(
        code(wplocal::no_token),
        help(
            "Set WPLOCAL_OAUTH_TOKEN, or add oauth_token to your config file.\n\
             Config path: run `wplocal --help` for details."
        )
    )]
    NoToken,

    #[error("Cancelled")]
    #[diagnostic(code(wplocal::cancelled))]
    Cancelled,

    #[error(transparent)]
    #[diagnostic(code(wplocal::engine))]
    Core(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(code(wplocal::api))]
    Api(#[from] wplocal_api::Error),

    #[error(transparent)]
    #[diagnostic(code(wplocal::config))]
    Config(#[from] wplocal_config::ConfigError),

    #[error("{0}")]
    #[diagnostic(code(wplocal::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SiteNotFound { .. } | Self::RemoteNotFound { .. } => exit_code::NOT_FOUND,
            Self::SyncBusy | Self::SyncStateHeld { .. } | Self::SyncUnsupported { .. } => {
                exit_code::CONFLICT
            }
            Self::NoToken => exit_code::AUTH,
            Self::Cancelled => exit_code::CANCELLED,
            Self::Api(e) if matches!(e, wplocal_api::Error::Authentication { .. }) => {
                exit_code::AUTH
            }
            Self::Api(e) if e.is_transient() => exit_code::CONNECTION,
            Self::Core(CoreError::NotFound { .. }) => exit_code::NOT_FOUND,
            Self::Core(CoreError::AlreadyRegistered { .. }) => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }
}
