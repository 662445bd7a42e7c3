use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use typedchan_schema::{GateTarget, RegistryConfig, SchemaError, SchemaRegistry};

use crate::cmd::{load_registry, ValidateArgs};
use crate::exit::{io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ValidateOutput {
    target: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let target = target(&args)?;
    let payload = read_payload(args.json.as_deref(), args.json_file.as_deref())?;
    let config = RegistryConfig {
        strict_mode: args.strict,
        ..RegistryConfig::default()
    };
    let registry = load_registry(&args.manifest, config)?;

    let out = match check(&registry, &target, &payload) {
        Ok(()) => ValidateOutput {
            target: target.to_string(),
            valid: true,
            error: None,
        },
        Err(err @ SchemaError::ValidationFailed { .. }) => {
            debug!(subject = %target, "payload rejected");
            ValidateOutput {
                target: target.to_string(),
                valid: false,
                error: Some(err.to_string()),
            }
        }
        Err(err) => return Err(schema_error("validate", err)),
    };

    match format {
        OutputFormat::Json => print_json(&out)?,
        OutputFormat::Table => print_table(
            &["TARGET", "VALID", "ERROR"],
            [vec![
                out.target.clone(),
                out.valid.to_string(),
                out.error.clone().unwrap_or_default(),
            ]],
        ),
        OutputFormat::Pretty => match &out.error {
            None => println!("ok: {}", out.target),
            Some(error) => println!("invalid: {error}"),
        },
        OutputFormat::Raw => println!("{}", if out.valid { "valid" } else { "invalid" }),
    }

    Ok(if out.valid { SUCCESS } else { DATA_INVALID })
}

fn target(args: &ValidateArgs) -> CliResult<GateTarget> {
    match (&args.channel, &args.event, &args.user_event) {
        (Some(kind), Some(event), None) => Ok(GateTarget::channel(kind, event)),
        (None, None, Some(event)) => Ok(GateTarget::user(event)),
        _ => Err(CliError::new(
            USAGE,
            "expected either --channel with --event, or --user-event",
        )),
    }
}

fn read_payload(json: Option<&str>, file: Option<&Path>) -> CliResult<Value> {
    let text = match (json, file) {
        (Some(json), None) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        _ => return Err(CliError::new(USAGE, "expected one of --json or --json-file")),
    };
    serde_json::from_str(&text).map_err(|err| schema_error("payload", err.into()))
}

fn check(
    registry: &SchemaRegistry,
    target: &GateTarget,
    payload: &Value,
) -> Result<(), SchemaError> {
    match target {
        GateTarget::Channel { kind, event } => registry.validate(kind, event, payload),
        GateTarget::User { event } => registry.validate_user_event(event, payload),
    }
}
