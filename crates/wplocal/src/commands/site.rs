//! Local site command handlers.

use owo_colors::OwoColorize;
use tabled::Tabled;

use wplocal_core::provision::Prepared;
use wplocal_core::{RunState, SiteDetails};

use crate::cli::{GlobalOpts, SiteArgs, SiteCommand};
use crate::context::App;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "ID")]
    id: String,
}

fn to_row(details: &SiteDetails) -> SiteRow {
    let (status, url) = match &details.run {
        RunState::Stopped => ("stopped".to_string(), String::new()),
        RunState::Running { url, .. } => ("running".to_string(), url.to_string()),
    };
    SiteRow {
        name: details.name.clone(),
        status,
        url,
        path: details.path.display().to_string(),
        id: details.id.to_string(),
    }
}

pub async fn handle(app: &App, args: SiteArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SiteCommand::List => {
            let sites = app.registry.list();
            let rendered = output::render_list(&global.output, &sites, to_row, |d| {
                d.id.to_string()
            });
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        SiteCommand::Create { path, name } => {
            let (server, prepared) = app.registry.create(path, name).await?;
            app.persist_sites()?;
            let details = server.start(prepared == Prepared::Fresh).await?;
            serve_until_interrupted(app, details, global).await
        }

        SiteCommand::Start { site } => {
            let server = app.resolve_site(&site)?;
            let details = server.start(false).await?;
            serve_until_interrupted(app, details, global).await
        }

        SiteCommand::Stop { site } => {
            let server = app.resolve_site(&site)?;
            let details = server.stop().await?;
            if !global.quiet {
                eprintln!("'{}' stopped", details.name);
            }
            Ok(())
        }

        SiteCommand::Delete { site, delete_files } => {
            let server = app.resolve_site(&site)?;
            let details = server.details();
            let warning = if delete_files {
                format!(
                    "Delete '{}' and remove {} from disk?",
                    details.name,
                    details.path.display()
                )
            } else {
                format!("Delete '{}'? Its files stay on disk.", details.name)
            };
            if !util::confirm(&warning, global.yes)? {
                return Err(CliError::Cancelled);
            }
            app.registry.delete(details.id, delete_files).await?;
            app.store.forget_site(details.id)?;
            app.persist_sites()?;
            if !global.quiet {
                eprintln!("'{}' deleted", details.name);
            }
            Ok(())
        }
    }
}

/// Print where the site is serving, then block until Ctrl-C and stop it.
async fn serve_until_interrupted(
    app: &App,
    details: SiteDetails,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !global.quiet {
        if let Some(url) = details.run.url() {
            if output::should_color() {
                eprintln!("'{}' running at {}", details.name, url.to_string().green());
            } else {
                eprintln!("'{}' running at {url}", details.name);
            }
            eprintln!("Press Ctrl-C to stop");
        }
    }

    tokio::signal::ctrl_c().await?;

    let server = app.registry.get(details.id)?;
    server.stop().await?;
    if !global.quiet {
        eprintln!("'{}' stopped", details.name);
    }
    Ok(())
}
