use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor: inspect and edit hierarchical array stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store root directory (overrides the config file)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// Config file (defaults to ./arbor.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a root group in the store
    Init(InitArgs),
    /// Render the hierarchy below a group
    Tree(PathArgs),
    /// List the members of a group
    Ls(LsArgs),
    /// Show a group's info report
    Info(PathArgs),
    /// Create a group
    Mkgroup(MkgroupArgs),
    /// Create an array
    Mkarray(MkarrayArgs),
    /// Remove a group or array and everything below it
    Rm(RmArgs),
    /// Show or set attributes of a group or array
    Attrs(AttrsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Replace any existing content
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args)]
pub struct PathArgs {
    /// Group path (defaults to the root)
    pub path: Option<String>,
}

#[derive(Args)]
pub struct LsArgs {
    pub path: Option<String>,
    /// Only list groups
    #[arg(long, conflicts_with = "arrays")]
    pub groups: bool,
    /// Only list arrays
    #[arg(long)]
    pub arrays: bool,
}

#[derive(Args)]
pub struct MkgroupArgs {
    pub name: String,
    /// Succeed if the group already exists
    #[arg(long)]
    pub require: bool,
}

#[derive(Args)]
pub struct MkarrayArgs {
    pub name: String,
    /// Comma-separated shape, e.g. 10,10
    #[arg(long, value_delimiter = ',', required = true)]
    pub shape: Vec<u64>,
    /// Element type, as a type string (<f8) or name (float64)
    #[arg(long, default_value = "<f8")]
    pub dtype: String,
    /// Comma-separated chunk shape
    #[arg(long, value_delimiter = ',')]
    pub chunks: Option<Vec<u64>>,
    /// Fill value, parsed as JSON (bare words become strings)
    #[arg(long, allow_hyphen_values = true)]
    pub fill: Option<String>,
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args)]
pub struct RmArgs {
    pub name: String,
}

#[derive(Args)]
pub struct AttrsArgs {
    pub path: String,
    pub key: Option<String>,
    /// New value, parsed as JSON (bare words become strings)
    #[arg(allow_hyphen_values = true)]
    pub value: Option<String>,
}
