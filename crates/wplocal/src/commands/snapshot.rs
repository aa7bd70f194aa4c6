//! Snapshot listing.

use tabled::Tabled;

use wplocal_core::Snapshot;

use crate::cli::{GlobalOpts, SnapshotArgs, SnapshotCommand};
use crate::context::App;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "WHEN")]
    when: String,
    #[tabled(rename = "REMOTE")]
    remote: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "LOCAL SITE")]
    local: String,
}

fn to_row(snapshot: &Snapshot) -> SnapshotRow {
    SnapshotRow {
        when: snapshot.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        remote: snapshot.remote_site_id.to_string(),
        url: snapshot.url.clone(),
        local: snapshot.local_site_id.to_string(),
    }
}

pub async fn handle(app: &App, args: SnapshotArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SnapshotCommand::List => {
            let snapshots = app.store.snapshots();
            let rendered = output::render_list(&global.output, &snapshots, to_row, |s| {
                s.remote_site_id.to_string()
            });
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
    }
}
