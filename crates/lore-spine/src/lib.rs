//! Navigation spine for Lore projects.
//!
//! A project holds sections (which may nest) and pages. The spine is a
//! derived, cached index over that tree answering three questions cheaply:
//!
//! - **Siblings**: previous/next container at the same nesting depth
//! - **Reading order**: previous/next page across the whole project
//! - **Tags**: which tags occur across all pages, and how often
//!
//! # Architecture
//!
//! Raw rows flow through a fixed pipeline:
//!
//! ```text
//! rows ──▶ build_store ──▶ NodeStore ──▶ linearize ──▶ encode ──▶ stored `spine`
//!                                                          │
//! stored `spine` ──▶ decode ──▶ SpineIndex ◀───────────────┘
//! ```
//!
//! - [`SpineIndex::create`] always rebuilds from rows
//! - [`SpineIndex::get`] only reads the stored encoding
//! - [`SpineRefresher`] rebuilds and persists on structural change events
//!
//! # Example
//!
//! ```ignore
//! use lore_spine::SpineIndex;
//! use lore_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new("data".into());
//! let mut tx = storage.begin()?;
//! let spine = SpineIndex::create(&*tx, 1)?;
//! tx.set_spine(1, spine.encode()?)?;
//! tx.commit()?;
//!
//! if let Some(next) = spine.next_page(20) {
//!     println!("next: {}", next.payload.title);
//! }
//! ```

mod builder;
mod codec;
mod error;
mod linearize;
mod node;
mod refresh;
mod spine;
mod tags;

pub use builder::build_store;
pub use codec::{decode_node, encode_node};
pub use error::SpineError;
pub use linearize::{LinearizeStats, linearize};
pub use node::{Node, NodeKind, NodePayload, NodeStore};
pub use refresh::{DEFAULT_MAX_DEPTH_WARNING, SpineRefresher};
pub use spine::SpineIndex;
pub use tags::{TagIndex, aggregate};
