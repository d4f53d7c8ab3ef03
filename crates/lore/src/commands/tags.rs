//! `lore tags` command implementation.

use clap::Args;
use lore_spine::TagIndex;

use super::{SpineArgs, StoreArgs};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tags command.
#[derive(Args)]
pub(crate) struct TagsArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    spine: SpineArgs,

    /// Sort by descending count instead of by tag.
    #[arg(long)]
    by_count: bool,
}

impl TagsArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, storage) = self.store.open()?;
        let spine = self.spine.load(&storage)?;

        if spine.tags().is_empty() {
            output.warning(&format!("No tags for project {}", self.spine.unit()));
            return Ok(());
        }

        for line in render_tags(spine.tags(), self.by_count) {
            output.data(&line);
        }
        Ok(())
    }
}

/// `count  tag` lines, counts right-aligned.
fn render_tags(tags: &TagIndex, by_count: bool) -> Vec<String> {
    let mut entries: Vec<&(String, usize)> = tags.entries().iter().collect();
    if by_count {
        // stable: ties keep tag order
        entries.sort_by(|a, b| b.1.cmp(&a.1));
    }
    let width = entries
        .iter()
        .map(|(_, count)| count.to_string().len())
        .max()
        .unwrap_or(1);
    entries
        .into_iter()
        .map(|(tag, count)| format!("{count:>width$}  {tag}"))
        .collect()
}
