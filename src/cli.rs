mod foxess;
mod snapshot;
mod watch;

use clap::{Parser, Subcommand};

pub use self::{foxess::CoordinatorArgs, watch::WatchArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: poll the cloud and render the readings on every update.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),

    /// Fetch everything once, render the readings, and exit.
    #[clap(name = "snapshot")]
    Snapshot(Box<CoordinatorArgs>),
}
