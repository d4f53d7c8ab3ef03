//! `lore build` command implementation.

use std::time::Instant;

use clap::Args;
use lore_spine::SpineIndex;
use lore_storage::Storage;

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Project id.
    #[arg(short, long)]
    unit: i64,

    /// Build and report without storing the result.
    #[arg(long)]
    dry_run: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (config, storage) = self.store.open()?;

        output.info(&format!("Data: {}", storage.root().display()));

        let start = Instant::now();
        let mut tx = storage.begin()?;
        let spine = SpineIndex::create(&*tx, self.unit)?;

        if self.dry_run {
            output.info("Dry run: spine not stored");
        } else {
            tx.set_spine(self.unit, spine.encode()?)?;
            tx.commit()?;
            tracing::info!(unit = self.unit, "Spine stored");
        }

        let max_depth = spine.max_depth();
        if max_depth > config.spine.max_depth_warning {
            output.warning(&format!(
                "Spine depth {max_depth} exceeds {}",
                config.spine.max_depth_warning
            ));
        }

        output.success(&format!(
            "Built spine for project {}: {} nodes, {} pages in reading order, {} tags ({:.1} ms)",
            self.unit,
            spine.nodes().count(),
            spine.pages().len(),
            spine.tags().len(),
            start.elapsed().as_secs_f64() * 1000.0
        ));
        Ok(())
    }
}
