use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `shape` binary.
#[derive(Debug, Parser)]
#[command(name = "shape", version, about = "shape - schema-enforced records")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a record from each JSON payload and print it, or the error
    Check(CheckArgs),
    /// Print the attributes of the record types in a manifest
    Describe(DescribeArgs),
}

/// Schema selection shared by every command.
#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// Schema manifest (TOML or JSON). Defaults to `engine.manifest` from config
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Record type to use (required when the manifest declares several)
    #[arg(short = 't', long = "type")]
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,

    /// JSON files holding an object or an array of objects
    #[arg(required = true)]
    pub payloads: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
}
