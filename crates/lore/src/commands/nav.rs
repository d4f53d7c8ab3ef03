//! `lore nav` command implementation.

use clap::Args;
use lore_spine::{Node, SpineIndex};

use super::{SpineArgs, StoreArgs, node_label};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the nav command.
#[derive(Args)]
pub(crate) struct NavArgs {
    #[command(flatten)]
    store: StoreArgs,

    #[command(flatten)]
    spine: SpineArgs,

    /// Node id to navigate from.
    #[arg(short, long)]
    node: i64,
}

impl NavArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let (_, storage) = self.store.open()?;
        let spine = self.spine.load(&storage)?;

        let Some(node) = spine.get_node(self.node) else {
            return Err(CliError::Validation(format!(
                "Node {} is not in the spine of project {}",
                self.node,
                self.spine.unit()
            )));
        };

        output.highlight(&node_label(node));
        for line in render_nav(&spine, node) {
            output.data(&line);
        }
        if node.excluded {
            output.warning("Node is excluded from navigation");
        }
        Ok(())
    }
}

fn link_label(node: Option<&Node>) -> String {
    node.map_or_else(|| "-".to_owned(), node_label)
}

/// Breadcrumbs, chain neighbours and children of `node`.
fn render_nav(spine: &SpineIndex, node: &Node) -> Vec<String> {
    let path: Vec<String> = spine
        .breadcrumbs(node.id)
        .into_iter()
        .map(node_label)
        .collect();

    let mut lines = vec![format!(
        "path:     {}",
        if path.is_empty() {
            "-".to_owned()
        } else {
            path.join(" / ")
        }
    )];

    if node.kind.is_container() {
        lines.push(format!("prev:     {}", link_label(spine.prev_sibling(node.id))));
        lines.push(format!("next:     {}", link_label(spine.next_sibling(node.id))));
    } else {
        lines.push(format!("prev:     {}", link_label(spine.prev_page(node.id))));
        lines.push(format!("next:     {}", link_label(spine.next_page(node.id))));
    }

    lines.push(format!("depth:    {}", node.depth));
    for child in spine.children(node.id) {
        lines.push(format!("child:    {}", node_label(child)));
    }
    lines
}
