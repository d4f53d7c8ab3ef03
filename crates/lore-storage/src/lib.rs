//! Storage collaborator for the Lore navigation spine.
//!
//! The spine never talks to a database directly. Everything it needs from the
//! outside world goes through the [`Storage`] and [`Transaction`] traits:
//!
//! - **Row fetch**: the project (unit) record plus its sections and pages,
//!   ascending by id
//! - **Cache fetch**: the previously encoded spine stored on the project
//! - **Cache write**: replacing that encoded spine inside a transaction
//!
//! # Architecture
//!
//! The crate provides:
//! - Row types ([`UnitRow`], [`SectionRow`], [`PageRow`]) deserialized with serde
//! - [`Storage`] / [`Transaction`] traits; a transaction is the explicit context
//!   passed to every spine call
//! - [`FsStorage`] backed by a directory of JSON records
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//! - [`ChangeEvent`] describing edits that may require a spine rebuild
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use lore_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new(PathBuf::from("data"));
//! let tx = storage.begin()?;
//! let pages = tx.pages(1)?;
//! ```

mod event;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod rows;
mod storage;

pub use event::{ChangeEvent, ChangeEventReceiver, ChangeEventSender, Scheme, channel};
pub use fs::FsStorage;
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use rows::{PageRow, RowOptions, SectionRow, UnitRow, normalize_order};
pub use storage::{ErrorStatus, Storage, StorageError, StorageErrorKind, Transaction};
