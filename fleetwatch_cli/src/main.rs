use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{config::Config, replay::ReplayArgs, snapshot::SnapshotArgs, watch::WatchArgs};

mod config;
mod logging_adapter;
mod parsers;
mod replay;
mod scope_args;
mod snapshot;
mod watch;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the live fleet feed until interrupted
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: WatchArgs,
    },
    /// Fetch the current fleet once and print it
    Snapshot {
        #[command(flatten)]
        args: SnapshotArgs,
    },
    /// Run recorded feed frames, one per line, through a fleet view
    Replay {
        #[command(flatten)]
        args: ReplayArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = Config::from_env();

    match cli.command {
        Commands::Watch { args } => watch::run(args, &config).await?,
        Commands::Snapshot { args } => snapshot::run(args, &config).await?,
        Commands::Replay { args } => replay::run(args)?,
    }

    Ok(())
}
