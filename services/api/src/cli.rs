use crate::commands::{run_batch, run_check, run_events, BatchArgs, CheckArgs, EventsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use eligibility::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Eligibility",
    about = "Check account eligibility for community events across every source an account uses",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Check one account against one event
    Check(CheckArgs),
    /// List the events in the catalog and their requirements
    Events(EventsArgs),
    /// Check every username in a CSV file against one event
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Check(args) => run_check(args),
        Command::Events(args) => run_events(args),
        Command::Batch(args) => run_batch(args),
    }
}
