//! `lore watch` command implementation.
//!
//! Reads one change event per line from stdin, for example
//! `{"scheme": "page", "unit": 1, "fields": ["order"]}`, and rebuilds the
//! affected spines on a background thread until stdin closes.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use clap::Args;
use lore_config::CliSettings;
use lore_spine::SpineRefresher;
use lore_storage::{ChangeEvent, FsStorage, channel};

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Rebuild on structural changes (default: from config).
    #[arg(long)]
    rebuild: Option<bool>,

    /// Disable rebuilds; only report which events are structural.
    #[arg(long, conflicts_with = "rebuild")]
    no_rebuild: bool,
}

impl WatchArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.store.load_config(CliSettings {
            auto_rebuild: self.no_rebuild.then_some(false).or(self.rebuild),
            ..CliSettings::default()
        })?;
        let storage = Arc::new(FsStorage::new(config.storage_resolved.data_dir.clone()));

        output.info(&format!("Data: {}", storage.root().display()));
        if config.spine.auto_rebuild {
            output.info("Watching stdin for change events");
        } else {
            output.warning("Automatic rebuild disabled; reporting events only");
        }

        let refresher = SpineRefresher::new(storage)
            .with_max_depth_warning(config.spine.max_depth_warning);
        let (sender, receiver) = channel();
        let worker = config
            .spine
            .auto_rebuild
            .then(|| thread::spawn(move || refresher.run(&receiver)));

        let mut received = 0usize;
        let mut structural = 0usize;
        for (number, line) in std::io::stdin().lock().lines().enumerate() {
            let line = line?;
            let Some(event) = parse_event(&line).transpose() else {
                continue;
            };
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    output.warning(&format!("Line {}: invalid event: {e}", number + 1));
                    continue;
                }
            };

            received += 1;
            if event.affects_spine() {
                structural += 1;
            }
            tracing::debug!(
                line = number + 1,
                unit = event.unit,
                scheme = ?event.scheme,
                structural = event.affects_spine(),
                "Change event received"
            );
            if worker.is_some() {
                if !sender.send(event) {
                    output.warning("Refresher stopped; ignoring remaining events");
                    break;
                }
            } else if event.affects_spine() {
                output.data(&format!("project {}: structural", event.unit));
            } else {
                output.muted(&format!("project {}: ignored", event.unit));
            }
        }
        drop(sender);

        let rebuilds = match worker {
            Some(handle) => handle
                .join()
                .map_err(|_| CliError::Validation("Refresher thread panicked".to_owned()))?,
            None => 0,
        };

        output.success(&format!(
            "{received} events, {structural} structural, {rebuilds} rebuilds"
        ));
        Ok(())
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
fn parse_event(line: &str) -> Result<Option<ChangeEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
