use crate::demo::{run_demo, run_queue_preview, DemoArgs, QueueArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use leadflow::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Leadflow",
    about = "Run the lead lifecycle and work queue engine from the command line",
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
    /// Print the ranked work queue an agent would receive
    Queue(QueueArgs),
    /// Walk a lead from dispatch to signed appointment on the sample contact base
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Contact CSV used to seed the in-memory store
    #[arg(long)]
    pub(crate) contacts: Option<PathBuf>,
    /// JSON agent roster (defaults to a two-agent team plus a supervisor)
    #[arg(long)]
    pub(crate) agents: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Queue(args) => run_queue_preview(args),
        Command::Demo(args) => run_demo(args),
    }
}
