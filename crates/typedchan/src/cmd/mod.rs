use std::path::{Path, PathBuf};

use clap::{ArgGroup, Args, Subcommand};
use tracing::debug;
use typedchan_schema::{RegistryConfig, SchemaRegistry};

use crate::exit::{manifest_error, CliResult};
use crate::output::OutputFormat;

pub mod encode;
pub mod kinds;
pub mod validate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the channel kinds declared in a manifest.
    Kinds(KindsArgs),
    /// Print the wire channel name for a kind and instance id.
    Encode(EncodeArgs),
    /// Check a JSON payload against a declared event schema.
    Validate(ValidateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Kinds(args) => kinds::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Validate(args) => validate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Load a manifest file into a registry.
pub fn load_registry(path: &Path, config: RegistryConfig) -> CliResult<SchemaRegistry> {
    let registry = SchemaRegistry::from_file_with_config(path, config)
        .map_err(|err| manifest_error(&format!("manifest {}", path.display()), err))?;
    debug!(
        path = %path.display(),
        kinds = registry.len(),
        "manifest loaded"
    );
    Ok(registry)
}

#[derive(Args, Debug)]
pub struct KindsArgs {
    /// Manifest file declaring channel kinds and events.
    pub manifest: PathBuf,
    /// Only kinds that require authorization (`private-` prefix).
    #[arg(long, conflicts_with = "presence")]
    pub restricted: bool,
    /// Only presence kinds (`presence-` prefix).
    #[arg(long)]
    pub presence: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Channel kind.
    pub kind: String,
    /// Instance id.
    pub id: String,
    /// Separator between kind and id (one of `_ - = @ , . ;`).
    #[arg(long, short = 's', default_value = ".")]
    pub separator: String,
    /// Check the kind against a manifest before encoding.
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["channel", "user_event"])))]
#[command(group(ArgGroup::new("payload").required(true).args(["json", "json_file"])))]
pub struct ValidateArgs {
    /// Manifest file declaring channel kinds and events.
    pub manifest: PathBuf,
    /// Channel kind the event belongs to.
    #[arg(long, short = 'c', requires = "event")]
    pub channel: Option<String>,
    /// Channel event name.
    #[arg(long, short = 'e', requires = "channel")]
    pub event: Option<String>,
    /// User event name.
    #[arg(long, conflicts_with_all = ["channel", "event"])]
    pub user_event: Option<String>,
    /// JSON payload.
    #[arg(long)]
    pub json: Option<String>,
    /// Read the JSON payload from a file.
    #[arg(long, value_name = "PATH")]
    pub json_file: Option<PathBuf>,
    /// Reject properties not named by the schema.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
