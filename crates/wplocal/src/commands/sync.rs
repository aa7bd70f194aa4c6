//! Pull/push command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use wplocal_api::SiteFilter;
use wplocal_core::confirm::{
    ConfirmRequest, DONT_SHOW_DISCONNECT_WARNING, DONT_SHOW_PULL_CONFIRMATION,
    DONT_SHOW_PUSH_CONFIRMATION,
};
use wplocal_core::sync::{SyncDirection, SyncEngine, SyncStatusKey};
use wplocal_config::FailedSyncRun;
use wplocal_core::{
    CoreError, Outcome, RemoteSiteId, SiteDetails, Snapshot, SyncSite, SyncSupport,
};

use crate::cli::{GlobalOpts, SyncArgs, SyncCommand};
use crate::context::App;
use crate::error::CliError;
use crate::output;

pub async fn handle(app: &App, args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SyncCommand::Connect { site, remote } => connect(app, &site, remote, global).await,
        SyncCommand::Disconnect { site, remote } => disconnect(app, &site, remote, global).await,
        SyncCommand::Pull { site, remote } => {
            run(app, &site, remote, SyncDirection::Pull, global).await
        }
        SyncCommand::Push { site, remote } => {
            run(app, &site, remote, SyncDirection::Push, global).await
        }
        SyncCommand::Status => status(app, global),
        SyncCommand::Clear {
            site,
            remote,
            direction,
        } => clear(app, &site, remote, direction, global),
    }
}

/// Acknowledge a recorded failure so the pair can sync again. Works
/// entirely against local state; no token needed.
fn clear(
    app: &App,
    site: &str,
    remote: u64,
    direction: crate::cli::Direction,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let server = app.resolve_site(site)?;
    let cleared = app.store.clear_failed_sync(
        server.site().id,
        RemoteSiteId(remote),
        direction.into(),
    )?;
    if !global.quiet {
        if cleared {
            eprintln!("Sync state cleared");
        } else {
            eprintln!("Nothing to clear");
        }
    }
    Ok(())
}

async fn connect(app: &App, site: &str, remote: u64, global: &GlobalOpts) -> Result<(), CliError> {
    let server = app.resolve_site(site)?;
    let client = app.api_client()?;
    let remote_site = find_remote(app, &client, remote).await?;

    match remote_site.sync_support {
        SyncSupport::Syncable => {}
        SyncSupport::AlreadyConnected => {
            // Connecting the same pair twice is fine; a remote claimed by
            // a different local site is not.
            let already_here = app
                .store
                .connections(server.site().id)
                .contains(&remote_site.id);
            if !already_here {
                return Err(CliError::SyncUnsupported {
                    name: remote_site.name,
                    reason: "already connected to another local site".into(),
                });
            }
        }
        SyncSupport::NeedsTransfer => {
            return Err(CliError::SyncUnsupported {
                name: remote_site.name,
                reason: "the site must be transferred to Atomic hosting first".into(),
            });
        }
        SyncSupport::Unsupported => {
            return Err(CliError::SyncUnsupported {
                name: remote_site.name,
                reason: "its plan does not include sync".into(),
            });
        }
    }

    app.store.connect(server.site().id, remote_site.id)?;
    if !global.quiet {
        eprintln!(
            "'{}' connected to {} ({})",
            server.site().name,
            remote_site.name,
            remote_site.url
        );
    }
    Ok(())
}

async fn disconnect(
    app: &App,
    site: &str,
    remote: u64,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let server = app.resolve_site(site)?;
    let remote_id = RemoteSiteId(remote);

    let outcome = app
        .confirmation()
        .confirm(
            DONT_SHOW_DISCONNECT_WARNING,
            ConfirmRequest {
                title: "Disconnect site".into(),
                message: "Your WordPress.com site will stay as it is, but you won't be able \
                          to pull or push changes between it and this local site anymore."
                    .into(),
                confirm_label: "Disconnect".into(),
                offer_remember: true,
            },
        )
        .await?;
    if outcome == Outcome::Cancelled {
        return Err(CliError::Cancelled);
    }

    if !app.store.disconnect(server.site().id, remote_id)? {
        return Err(CliError::RemoteNotFound { id: remote });
    }
    if !global.quiet {
        eprintln!("'{}' disconnected from {remote}", server.site().name);
    }
    Ok(())
}

async fn run(
    app: &App,
    site: &str,
    remote: Option<u64>,
    direction: SyncDirection,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let server = app.resolve_site(site)?;
    let details = server.details();
    let remote_id = pick_remote(app, &details, remote)?;

    // An unacknowledged failure holds the pair until `sync clear`.
    if app
        .store
        .failed_sync(details.id, remote_id, direction)
        .is_some()
    {
        return Err(CliError::SyncStateHeld { direction });
    }

    let client = app.api_client()?;
    let remote_site = find_remote(app, &client, remote_id.0).await?;

    confirm_overwrite(app, &details, &remote_site, direction).await?;

    let engine = app.sync_engine(client);
    let admitted = match direction {
        SyncDirection::Pull => engine.pull_site(details.id, details.path.clone(), remote_id),
        SyncDirection::Push => engine.push_site(details.id, details.path.clone(), remote_id),
    };
    if !admitted {
        return Err(CliError::SyncBusy);
    }

    let state = watch_until_terminal(&engine, &details, remote_id, direction, global).await;
    match state.status {
        SyncStatusKey::Finished => {
            if direction == SyncDirection::Pull {
                app.store.add_snapshot(Snapshot {
                    url: remote_site.url.clone(),
                    remote_site_id: remote_id,
                    local_site_id: details.id,
                    created_at: chrono::Utc::now(),
                })?;
            }
            if !global.quiet {
                eprintln!("{direction} finished");
            }
            Ok(())
        }
        _ => {
            // Keep the failure on record so the next attempt is blocked
            // until the user acknowledges it.
            app.store.record_failed_sync(FailedSyncRun {
                local: details.id,
                remote: remote_id,
                direction,
                state: state.clone(),
            })?;
            Err(CliError::Core(CoreError::Transfer {
                message: state.message,
            }))
        }
    }
}

/// Use the explicit remote id, or the site's sole connection.
fn pick_remote(
    app: &App,
    details: &SiteDetails,
    remote: Option<u64>,
) -> Result<RemoteSiteId, CliError> {
    if let Some(id) = remote {
        return Ok(RemoteSiteId(id));
    }
    let connections = app.store.connections(details.id);
    match connections.as_slice() {
        [sole] => Ok(*sole),
        [] => Err(CliError::SyncUnsupported {
            name: details.name.clone(),
            reason: "not connected to any WordPress.com site; run `wplocal sync connect`".into(),
        }),
        _ => Err(CliError::SyncUnsupported {
            name: details.name.clone(),
            reason: "connected to multiple WordPress.com sites; pass the remote id".into(),
        }),
    }
}

async fn find_remote(
    app: &App,
    client: &wplocal_api::WpcomClient,
    id: u64,
) -> Result<SyncSite, CliError> {
    app.fetch_remotes(client, SiteFilter::SyncCandidates)
        .await?
        .into_iter()
        .find(|site| site.id.0 == id)
        .ok_or(CliError::RemoteNotFound { id })
}

async fn confirm_overwrite(
    app: &App,
    details: &SiteDetails,
    remote_site: &SyncSite,
    direction: SyncDirection,
) -> Result<(), CliError> {
    let (key, request) = match direction {
        SyncDirection::Pull => (
            DONT_SHOW_PULL_CONFIRMATION,
            ConfirmRequest {
                title: "Overwrite local site".into(),
                message: format!(
                    "Pulling will replace everything on '{}' with the contents of {}.",
                    details.name, remote_site.url
                ),
                confirm_label: "Pull".into(),
                offer_remember: true,
            },
        ),
        SyncDirection::Push => (
            DONT_SHOW_PUSH_CONFIRMATION,
            ConfirmRequest {
                title: if remote_site.is_staging {
                    "Overwrite Staging site".into()
                } else {
                    "Overwrite Production site".into()
                },
                message: format!(
                    "Pushing will replace everything on {} with the contents of '{}'.",
                    remote_site.url, details.name
                ),
                confirm_label: "Push".into(),
                offer_remember: true,
            },
        ),
    };

    match app.confirmation().confirm(key, request).await? {
        Outcome::Confirmed => Ok(()),
        Outcome::Cancelled => Err(CliError::Cancelled),
    }
}

/// Follow the run's state until it reaches Finished or Failed, showing a
/// progress bar on interactive invocations.
async fn watch_until_terminal(
    engine: &SyncEngine,
    details: &SiteDetails,
    remote: RemoteSiteId,
    direction: SyncDirection,
    global: &GlobalOpts,
) -> wplocal_core::SyncState {
    let bar = if global.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let mut version = engine.subscribe();
    loop {
        let state = match direction {
            SyncDirection::Pull => engine.get_pull_state(details.id, remote),
            SyncDirection::Push => engine.get_push_state(details.id, remote),
        };
        if let Some(state) = state {
            bar.set_position(u64::from(state.progress));
            bar.set_message(state.message.clone());
            if state.status.is_terminal() {
                bar.finish_and_clear();
                return state;
            }
        }
        // The version counter ticks on every state change; time out as a
        // safety net against a missed wakeup.
        let _ = tokio::time::timeout(Duration::from_millis(500), version.changed()).await;
    }
}

/// Show each local site's connections and any failures awaiting
/// acknowledgement.
fn status(app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    let failures = app.store.failed_syncs();
    let mut lines = Vec::new();
    for details in app.registry.list() {
        let connections = app.store.connections(details.id);
        if connections.is_empty() {
            lines.push(format!("{}: not connected", details.name));
        } else {
            let remotes: Vec<String> = connections.iter().map(ToString::to_string).collect();
            lines.push(format!("{}: connected to {}", details.name, remotes.join(", ")));
        }
        for run in failures.iter().filter(|run| run.local == details.id) {
            lines.push(format!(
                "  {} with {} failed: {} (run `wplocal sync clear` to retry)",
                run.direction, run.remote, run.state.message
            ));
        }
    }
    if lines.is_empty() {
        lines.push("No sites registered".into());
    }
    output::print_output(&lines.join("\n"), global.quiet);
    Ok(())
}
