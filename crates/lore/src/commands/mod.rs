//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod nav;
pub(crate) mod show;
pub(crate) mod tags;
pub(crate) mod watch;

use std::path::PathBuf;

use clap::Args;
use lore_config::{CliSettings, Config};
use lore_spine::{Node, SpineIndex};
use lore_storage::{FsStorage, Storage};

use crate::error::CliError;

pub(crate) use build::BuildArgs;
pub(crate) use nav::NavArgs;
pub(crate) use show::ShowArgs;
pub(crate) use tags::TagsArgs;
pub(crate) use watch::WatchArgs;

/// Options shared by every command that opens the content store.
#[derive(Args)]
pub(crate) struct StoreArgs {
    /// Path to configuration file (default: auto-discover lore.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides config).
    #[arg(short, long, env = "LORE_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl StoreArgs {
    /// Load configuration with `extra` applied on top of the store options.
    pub(crate) fn load_config(&self, extra: CliSettings) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            data_dir: self.data_dir.clone(),
            ..extra
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Load configuration and open the file store it points at.
    pub(crate) fn open(&self) -> Result<(Config, FsStorage), CliError> {
        let config = self.load_config(CliSettings::default())?;
        let storage = FsStorage::new(config.storage_resolved.data_dir.clone());
        Ok((config, storage))
    }
}

/// Options for commands that read a spine.
#[derive(Args)]
pub(crate) struct SpineArgs {
    /// Project id.
    #[arg(short, long)]
    unit: i64,

    /// Rebuild from rows instead of reading the stored spine.
    #[arg(long)]
    fresh: bool,
}

impl SpineArgs {
    /// Load the spine, stored or freshly built, in a read-only transaction.
    pub(crate) fn load(&self, storage: &dyn Storage) -> Result<SpineIndex, CliError> {
        let tx = storage.begin()?;
        let spine = if self.fresh {
            SpineIndex::create(&*tx, self.unit)?
        } else {
            SpineIndex::get(&*tx, self.unit)?
        };
        Ok(spine)
    }

    pub(crate) fn unit(&self) -> i64 {
        self.unit
    }
}

/// One-line description of a node: kind, title and id.
pub(crate) fn node_label(node: &Node) -> String {
    let title = if !node.payload.title.is_empty() {
        node.payload.title.as_str()
    } else if !node.payload.name.is_empty() {
        node.payload.name.as_str()
    } else {
        "(untitled)"
    };
    format!("[{}] {title} #{}", node.kind.as_str(), node.id)
}
