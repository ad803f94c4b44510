//! # Validate Subcommand
//!
//! Validates one event document and, when it passes, appends it to a local
//! JSON-lines queue. Exit code 0 means delivered; 1 means rejected.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use evs_validator::{EventPipeline, JsonLinesQueue, Outcome, DEFAULT_QUEUE};

use crate::load_schema_or_none;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Event JSON file, or `-` to read from stdin.
    pub event: PathBuf,

    /// Schema file. Defaults to `schemas/event.schema.json`.
    #[arg(long, env = "EVS_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Queue receiving valid events.
    #[arg(long, env = "EVS_QUEUE", default_value = DEFAULT_QUEUE)]
    pub queue: String,

    /// Directory holding the queue files.
    #[arg(long, env = "EVS_QUEUE_DIR", default_value = "queues")]
    pub queue_dir: PathBuf,
}

/// Read the event document from a file or stdin.
pub fn read_event(source: &Path) -> Result<Value> {
    let content = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("cannot read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("cannot read event file {}", source.display()))?
    };
    serde_json::from_str(&content)
        .with_context(|| format!("event {} is not valid JSON", source.display()))
}

/// Run the validate subcommand.
pub fn run_validate(args: &ValidateArgs, repo_root: &Path) -> Result<u8> {
    let event = read_event(&args.event)?;
    let schema = load_schema_or_none(args.schema.as_deref(), repo_root);

    let queue = JsonLinesQueue::new(&args.queue_dir);
    let pipeline = EventPipeline::new(schema, queue).with_queue(&args.queue);

    match pipeline.handle(&event)? {
        Outcome::Delivered(receipt) => {
            println!(
                "OK: event delivered to {} (message {})",
                receipt.destination, receipt.message_id
            );
            Ok(0)
        }
        Outcome::Rejected(e) => {
            eprintln!("REJECTED: {e}");
            Ok(1)
        }
    }
}
