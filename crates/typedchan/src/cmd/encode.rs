use serde::Serialize;
use typedchan_naming::{encode, ChannelVisibility, InstanceId, Separator};
use typedchan_schema::{RegistryConfig, SchemaError};

use crate::cmd::{load_registry, EncodeArgs};
use crate::exit::{naming_error, schema_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    kind: String,
    instance: InstanceId,
    separator: Separator,
    wire_name: String,
    visibility: &'static str,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let separator: Separator = args
        .separator
        .parse()
        .map_err(|err| naming_error("--separator", err))?;

    if let Some(path) = &args.manifest {
        let registry = load_registry(path, RegistryConfig::default())?;
        if !registry.has_channel(&args.kind) {
            return Err(schema_error(
                "encode",
                SchemaError::UndeclaredChannel(args.kind),
            ));
        }
        registry
            .check_separator(separator)
            .map_err(|err| schema_error("encode", err))?;
    }

    let instance = InstanceId::from(args.id);
    let out = EncodeOutput {
        wire_name: encode(&args.kind, &instance, separator).into_string(),
        visibility: ChannelVisibility::of(&args.kind).as_str(),
        kind: args.kind,
        instance,
        separator,
    };

    match format {
        OutputFormat::Json => print_json(&out)?,
        OutputFormat::Table => print_table(
            &["KIND", "INSTANCE", "SEPARATOR", "WIRE NAME", "VISIBILITY"],
            [vec![
                out.kind.clone(),
                out.instance.to_string(),
                out.separator.to_string(),
                out.wire_name.clone(),
                out.visibility.to_string(),
            ]],
        ),
        OutputFormat::Pretty => {
            println!("{} -> {} ({})", out.kind, out.wire_name, out.visibility)
        }
        OutputFormat::Raw => println!("{}", out.wire_name),
    }

    Ok(SUCCESS)
}
