//! WordPress.com site listing.

use tabled::Tabled;

use wplocal_api::SiteFilter;
use wplocal_core::SyncSite;

use crate::cli::{GlobalOpts, RemoteArgs, RemoteCommand};
use crate::context::App;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RemoteRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "SYNC")]
    sync: String,
}

fn to_row(site: &SyncSite) -> RemoteRow {
    RemoteRow {
        id: site.id.0,
        name: site.name.clone(),
        url: site.url.clone(),
        kind: if site.is_staging {
            "staging".into()
        } else {
            "production".into()
        },
        sync: site.sync_support.to_string(),
    }
}

pub async fn handle(app: &App, args: RemoteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        RemoteCommand::List { all } => {
            let client = app.api_client()?;
            let filter = if all {
                SiteFilter::All
            } else {
                SiteFilter::SyncCandidates
            };
            let remotes = app.fetch_remotes(&client, filter).await?;
            let rendered =
                output::render_list(&global.output, &remotes, to_row, |s| s.id.0.to_string());
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
    }
}
