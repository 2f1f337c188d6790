use clap::{Args, Parser, Subcommand};
use offline_proxy::PrecacheStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "offline-proxy",
    version,
    about = "Offline-capable content proxy: precache a site, then answer requests cache-first"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

/// Options shared by every command. Flags win over the config file and
/// `OFFLINE_PROXY_*` environment variables.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// YAML config file
    #[arg(long, global = true, env = "OFFLINE_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Origin base URL
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Current cache generation name
    #[arg(long, global = true)]
    pub cache_name: Option<String>,

    /// Disk store root
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Install strategy: per-entry or atomic
    #[arg(long, global = true)]
    pub precache: Option<PrecacheStrategy>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Precache the manifest into the current generation
    Install(InstallArgs),
    /// Delete superseded generations and start serving
    Activate,
    /// Route one request; the body goes to stdout
    Fetch(FetchArgs),
    /// List cache generations
    List(ListArgs),
    /// Delete cache generations
    Purge(PurgeArgs),
    /// Print the effective configuration
    Config,
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Activate right after a successful install
    #[arg(long)]
    pub activate: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Site-relative path (base path is applied) or absolute URL
    pub path: String,

    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// Print status, source and headers before the body
    #[arg(long, short = 'i')]
    pub include: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Also list the entries of each generation
    #[arg(long)]
    pub entries: bool,

    #[arg(long, default_value = "text")]
    pub format: String, // text|json
}

#[derive(Args, Debug, Clone, Default)]
pub struct PurgeArgs {
    /// Generations to delete
    pub names: Vec<String>,

    /// Delete every generation except the current one
    #[arg(long, conflicts_with_all = ["all", "names"])]
    pub stale: bool,

    /// Delete every generation, the current one included
    #[arg(long, conflicts_with = "names")]
    pub all: bool,
}
