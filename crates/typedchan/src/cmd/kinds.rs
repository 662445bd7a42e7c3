use serde::Serialize;
use typedchan_naming::{is_presence, is_restricted};
use typedchan_schema::{describe, ChannelSummary, RegistryConfig};

use crate::cmd::{load_registry, KindsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct KindsOutput {
    kinds: Vec<ChannelSummary>,
    user_events: Vec<String>,
}

pub fn run(args: KindsArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.manifest, RegistryConfig::default())?;

    let kinds: Vec<ChannelSummary> = describe(&registry)
        .into_iter()
        .filter(|summary| keep(&args, &summary.kind))
        .collect();
    let out = KindsOutput {
        kinds,
        user_events: registry
            .user_events()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    match format {
        OutputFormat::Json => print_json(&out)?,
        OutputFormat::Table => print_table(
            &["KIND", "VISIBILITY", "EVENTS"],
            out.kinds.iter().map(|summary| {
                vec![
                    summary.kind.clone(),
                    summary.visibility.to_string(),
                    summary.events.join(", "),
                ]
            }),
        ),
        OutputFormat::Pretty => {
            for summary in &out.kinds {
                println!(
                    "{} ({}): {}",
                    summary.kind,
                    summary.visibility,
                    summary.events.join(", ")
                );
            }
            if !out.user_events.is_empty() {
                println!("user events: {}", out.user_events.join(", "));
            }
        }
        OutputFormat::Raw => {
            for summary in &out.kinds {
                println!("{}", summary.kind);
            }
        }
    }

    Ok(SUCCESS)
}

fn keep(args: &KindsArgs, kind: &str) -> bool {
    if args.restricted {
        is_restricted(kind)
    } else if args.presence {
        is_presence(kind)
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(restricted: bool, presence: bool) -> KindsArgs {
        KindsArgs {
            manifest: PathBuf::from("unused.json"),
            restricted,
            presence,
        }
    }

    fn kept(restricted: bool, presence: bool) -> Vec<&'static str> {
        let args = args(restricted, presence);
        [
            "room",
            "private-yolo",
            "private-encrypted-vault",
            "presence-lobby",
        ]
        .into_iter()
        .filter(|kind| keep(&args, kind))
        .collect()
    }

    #[test]
    fn filters_by_prefix() {
        assert_eq!(kept(false, false).len(), 4);
        assert_eq!(
            kept(true, false),
            vec!["private-yolo", "private-encrypted-vault"]
        );
        assert_eq!(kept(false, true), vec!["presence-lobby"]);
    }
}
