use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pref_types::TypeTag;

#[derive(Parser)]
#[command(
    name = "prefs",
    about = "Inspect and edit prefstore preference files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every entry with its decoded value
    Show(ShowArgs),
    /// Report lines a datastore would skip while loading
    Check(CheckArgs),
    /// Print the decoded value of one entry
    Get(GetArgs),
    /// Add or replace one entry
    Set(SetArgs),
    /// Remove one entry
    Unset(UnsetArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub file: PathBuf,
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub file: PathBuf,
    /// Wire type: b, d, f, i, l or s
    pub tag: TypeTag,
    pub key: String,
    pub value: String,
}

#[derive(Args)]
pub struct UnsetArgs {
    pub file: PathBuf,
    pub key: String,
}
