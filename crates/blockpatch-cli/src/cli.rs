use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blockpatch",
    about = "Diff block-tree documents into anchored patch operations",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with diff engine settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a document as a flat block list
    Flatten(FlattenArgs),
    /// Compute patch operations between two documents
    Diff(DiffArgs),
    /// Replay patch operations onto a document
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct FlattenArgs {
    /// Document JSON (array of blocks)
    pub document: PathBuf,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Old document JSON
    pub old: PathBuf,
    /// New document JSON
    pub new: PathBuf,
    /// Include diff counters
    #[arg(long)]
    pub stats: bool,
    /// Group inserts into chains of consecutive siblings
    #[arg(long)]
    pub chains: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Base document JSON
    pub document: PathBuf,
    /// Patch operations JSON (array of ops)
    pub ops: PathBuf,
}
