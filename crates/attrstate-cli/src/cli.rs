use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "attrstate",
    about = "Migrate flat attribute-store state between schema versions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Builtin {
    LaunchConfiguration,
}

#[derive(Subcommand)]
pub enum Command {
    /// Migrate a state file to the next (or current) schema version
    Migrate(MigrateArgs),
    /// List the elements of one collection in a state file
    Elements(ElementsArgs),
    /// Compute the element key a set of field values would receive
    Hash(HashArgs),
}

/// Where migration steps come from.
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct StepSource {
    /// TOML migration plan
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Built-in resource migration
    #[arg(long, value_enum)]
    pub builtin: Option<Builtin>,
}

#[derive(Args)]
pub struct MigrateArgs {
    /// JSON state file (`{"id", "attributes", "schema_version"}`)
    #[arg(long)]
    pub state: PathBuf,
    #[command(flatten)]
    pub source: StepSource,
    /// Declared version of the state; defaults to the file's `schema_version`
    #[arg(long)]
    pub from: Option<u32>,
    /// Chain steps up to the current version
    #[arg(long)]
    pub all: bool,
    /// Write the migrated state here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Show the key changes without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ElementsArgs {
    #[arg(long)]
    pub state: PathBuf,
    #[arg(long)]
    pub collection: String,
}

#[derive(Args)]
pub struct HashArgs {
    #[command(flatten)]
    pub source: StepSource,
    /// Version whose outgoing step supplies the schema
    #[arg(long, default_value = "0")]
    pub from: u32,
    /// Raw field value as `name=value`; repeatable
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}
