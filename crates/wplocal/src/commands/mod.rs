//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod remote;
pub mod site;
pub mod snapshot;
pub mod sync;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::context::App;
use crate::error::CliError;

pub async fn dispatch(cmd: Command, app: &App, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Site(args) => site::handle(app, args, global).await,
        Command::Remote(args) => remote::handle(app, args, global).await,
        Command::Sync(args) => sync::handle(app, args, global).await,
        Command::Snapshot(args) => snapshot::handle(app, args, global).await,
    }
}
