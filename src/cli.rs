use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::window::WindowOptions;

#[derive(Parser)]
#[command(
    name = "awr-gather",
    version,
    about = "Gather AWR reports from the cluster control plane"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and download an AWR report per target into a new pack dir.
    Awr(AwrArgs),
    /// List the snapshots each target holds inside the window.
    Snapshots(SnapshotsArgs),
}

#[derive(Args, Clone, Default)]
pub struct WindowArgs {
    /// Window start, `yyyy-mm-dd hh:mm:ss` (needs --to).
    #[arg(long)]
    pub from: Option<String>,
    /// Window end, `yyyy-mm-dd hh:mm:ss` (needs --from).
    #[arg(long)]
    pub to: Option<String>,
    /// Look back from now, `<n><m|h|d>`; never less than one hour.
    #[arg(long)]
    pub since: Option<String>,
}

impl From<WindowArgs> for WindowOptions {
    fn from(args: WindowArgs) -> Self {
        Self {
            from: args.from,
            to: args.to,
            since: args.since,
        }
    }
}

#[derive(Args, Clone, Default)]
pub struct TargetArgs {
    /// Gather config JSON (defaults to $AWR_GATHER_CONFIG or ./awr-gather.json).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Only these clusters (repeatable); defaults to every configured target.
    #[arg(long = "cluster")]
    pub clusters: Vec<String>,
}

#[derive(Args)]
pub struct AwrArgs {
    #[command(flatten)]
    pub window: WindowArgs,
    #[command(flatten)]
    pub targets: TargetArgs,
    /// Directory the pack dir is created under.
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
    /// Seconds between task status polls.
    #[arg(long)]
    pub poll_interval: Option<u64>,
    /// Give up on a report task after this many seconds.
    #[arg(long)]
    pub task_timeout: Option<u64>,
    /// Give up on a whole target after this many seconds.
    #[arg(long)]
    pub target_timeout: Option<u64>,
}

#[derive(Args)]
pub struct SnapshotsArgs {
    #[command(flatten)]
    pub window: WindowArgs,
    #[command(flatten)]
    pub targets: TargetArgs,
}
