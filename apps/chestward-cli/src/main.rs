use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use chestward_common::{BlockPos, ContainerKey, DEFAULT_DIMENSION, PlayerId};

mod commands;

#[derive(Parser)]
#[command(name = "chestward", about = "Container access audit log and lock administration")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the log and lock files
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// Directory holding chestward.json (defaults to <data-dir>/config)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query and maintain the access log
    #[command(subcommand)]
    Log(LogCommand),
    /// Manage container locks
    #[command(subcommand)]
    Lock(LockCommand),
    /// Record one open/close of a container from JSON item counts
    Record {
        #[command(flatten)]
        at: Position,
        /// Name of the player who opened the container
        #[arg(long)]
        player: String,
        /// Contents on open, e.g. '{"minecraft:stone": 5}'
        #[arg(long)]
        before: String,
        /// Contents on close
        #[arg(long)]
        after: String,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Show every record for a player (case-insensitive)
    Query { player: String },
    /// Show the most recent records (1 to 100)
    Recent {
        #[arg(
            default_value = "10",
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=100)
        )]
        count: usize,
    },
    /// Show records for one container
    At(Position),
    /// Show records for a container at or next to a standing position
    Near(Position),
    /// Delete every record
    Clear,
    /// Delete records older than a number of days
    Prune {
        /// Defaults to the configured retention
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show record and lock counts
    Stats,
}

#[derive(Subcommand)]
enum LockCommand {
    /// Lock a container for a player
    Add {
        #[command(flatten)]
        at: Position,
        #[arg(long)]
        owner: PlayerId,
        #[arg(long)]
        owner_name: String,
    },
    /// Remove a lock as its owner or an admin
    Remove {
        #[command(flatten)]
        at: Position,
        #[command(flatten)]
        who: Requester,
    },
    /// Show the lock on a container
    Info(Position),
    /// List locks, optionally for one owner
    List {
        #[arg(long)]
        owner: Option<PlayerId>,
    },
    /// Check whether a player may open a container
    Check {
        #[command(flatten)]
        at: Position,
        #[command(flatten)]
        who: Requester,
    },
    /// Apply the rules for a player breaking a container
    Break {
        #[command(flatten)]
        at: Position,
        #[command(flatten)]
        who: Requester,
    },
}

#[derive(Args)]
struct Position {
    #[arg(allow_negative_numbers = true)]
    x: i32,
    #[arg(allow_negative_numbers = true)]
    y: i32,
    #[arg(allow_negative_numbers = true)]
    z: i32,
    #[arg(long, default_value = DEFAULT_DIMENSION)]
    dimension: String,
}

impl Position {
    fn pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }

    fn key(&self) -> ContainerKey {
        ContainerKey::new(self.pos(), self.dimension.clone())
    }
}

#[derive(Args)]
struct Requester {
    #[arg(long)]
    requester: PlayerId,
    /// Act with admin permissions
    #[arg(long)]
    admin: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let config_dir = cli
        .config_dir
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("config"));
    let ctx = commands::Context::open(cli.data_dir, &config_dir);

    match cli.command {
        Commands::Log(cmd) => commands::log(ctx, cmd),
        Commands::Lock(cmd) => commands::lock(ctx, cmd),
        Commands::Record {
            at,
            player,
            before,
            after,
        } => commands::record(ctx, &at, &player, &before, &after),
    }
}
