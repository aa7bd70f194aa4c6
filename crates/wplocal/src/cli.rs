//! Clap derive structures for the `wplocal` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// wplocal -- run local WordPress sites and sync them with WordPress.com
#[derive(Debug, Parser)]
#[command(
    name = "wplocal",
    version,
    about = "Local WordPress sites with two-way WordPress.com sync",
    long_about = "Create and run local WordPress sites on the bundled PHP server,\n\
        and pull/push their content to connected WordPress.com sites.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', env = "WPLOCAL_OUTPUT", default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage local sites
    #[command(alias = "s")]
    Site(SiteArgs),

    /// Inspect WordPress.com sites on your account
    #[command(alias = "r")]
    Remote(RemoteArgs),

    /// Pull and push content between local and WordPress.com sites
    Sync(SyncArgs),

    /// List backups recorded before pulls overwrote local content
    Snapshot(SnapshotArgs),
}

// ── Site ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SiteArgs {
    #[command(subcommand)]
    pub command: SiteCommand,
}

#[derive(Debug, Subcommand)]
pub enum SiteCommand {
    /// List registered sites
    #[command(alias = "ls")]
    List,

    /// Create a site, start it, and serve until Ctrl-C
    Create {
        /// Working directory for the site (created if missing)
        path: PathBuf,

        /// Display name (defaults to the directory name)
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Start a site and serve until Ctrl-C
    Start {
        /// Site name or id
        site: String,
    },

    /// Stop a running site
    Stop {
        /// Site name or id
        site: String,
    },

    /// Delete a site
    #[command(alias = "rm")]
    Delete {
        /// Site name or id
        site: String,

        /// Also remove the working directory from disk
        #[arg(long)]
        delete_files: bool,
    },
}

// ── Remote ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Debug, Subcommand)]
pub enum RemoteCommand {
    /// List WordPress.com sites and whether they can sync
    #[command(alias = "ls")]
    List {
        /// Include sites that cannot be sync candidates
        #[arg(long)]
        all: bool,
    },
}

// ── Sync ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommand,
}

#[derive(Debug, Subcommand)]
pub enum SyncCommand {
    /// Connect a local site to a WordPress.com site
    Connect {
        /// Local site name or id
        site: String,

        /// WordPress.com site id
        remote: u64,
    },

    /// Disconnect a local site from a WordPress.com site
    Disconnect {
        /// Local site name or id
        site: String,

        /// WordPress.com site id
        remote: u64,
    },

    /// Overwrite the local site with the remote's content
    Pull {
        /// Local site name or id
        site: String,

        /// WordPress.com site id (optional when exactly one is connected)
        remote: Option<u64>,
    },

    /// Overwrite the remote site with the local site's content
    Push {
        /// Local site name or id
        site: String,

        /// WordPress.com site id (optional when exactly one is connected)
        remote: Option<u64>,
    },

    /// Show each site's connections and unacknowledged failures
    Status,

    /// Acknowledge a failed pull or push so the pair can sync again
    Clear {
        /// Local site name or id
        site: String,

        /// WordPress.com site id
        remote: u64,

        /// Which direction's state to clear
        #[arg(long, value_enum, default_value = "pull")]
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Direction {
    Pull,
    Push,
}

impl From<Direction> for wplocal_core::SyncDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Pull => Self::Pull,
            Direction::Push => Self::Push,
        }
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// List recorded snapshots
    #[command(alias = "ls")]
    List,
}
