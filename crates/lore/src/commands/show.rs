//! `lore show` command implementation.

use std::collections::HashSet;

use clap::Args;
use lore_spine::{Node, SpineIndex};

use super::{SpineArgs, StoreArgs, node_label};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the show command.
#[derive(Args)]
pub(crate) struct ShowArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    spine: SpineArgs,

    /// Print the stored JSON form instead of a tree.
    #[arg(long)]
    json: bool,
}

impl ShowArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, storage) = self.store.open()?;
        let spine = self.spine.load(&storage)?;

        if spine.is_empty() {
            output.warning(&format!(
                "No spine stored for project {}; run `lore build --unit {}`",
                self.spine.unit(),
                self.spine.unit()
            ));
            return Ok(());
        }

        if self.json {
            let json = serde_json::to_string_pretty(&spine.encode()?)
                .map_err(|e| CliError::Validation(format!("Failed to serialize spine: {e}")))?;
            output.data(&json);
            return Ok(());
        }

        for line in render_tree(&spine) {
            output.data(&line);
        }
        output.info(&format!(
            "{} nodes, {} pages in reading order, depth {}",
            spine.nodes().count(),
            spine.pages().len(),
            spine.max_depth()
        ));
        Ok(())
    }
}

/// Indented tree in traversal order, starting at the project.
///
/// Excluded nodes are marked; unreachable nodes are listed at the end.
fn render_tree(spine: &SpineIndex) -> Vec<String> {
    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    if let Some(root) = spine.get_node(spine.unit()) {
        render_node(spine, root, 0, &mut visited, &mut lines);
    }

    let orphans: Vec<&Node> = spine
        .nodes()
        .filter(|n| !visited.contains(&n.id))
        .collect();
    if !orphans.is_empty() {
        lines.push("unreachable:".to_owned());
        for node in orphans {
            lines.push(format!("  {}", node_label(node)));
        }
    }
    lines
}

fn render_node<'a>(
    spine: &'a SpineIndex,
    node: &'a Node,
    indent: usize,
    visited: &mut HashSet<i64>,
    lines: &mut Vec<String>,
) {
    if !visited.insert(node.id) {
        return;
    }

    let mut line = format!("{}{}", "  ".repeat(indent), node_label(node));
    if node.excluded {
        line.push_str(" (excluded)");
    }
    lines.push(line);

    for child in spine.children(node.id) {
        render_node(spine, child, indent + 1, visited, lines);
    }
}
