//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::rows::{PageRow, SectionRow, UnitRow};
use crate::storage::{Storage, StorageError, Transaction};

const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores rows and encoded spines in memory. Use the builder methods to
/// configure the mock with test data.
///
/// # Example
///
/// ```ignore
/// use lore_storage::{MockStorage, PageRow, Storage, UnitRow};
///
/// let storage = MockStorage::new()
///     .with_unit(UnitRow { id: 1, ..UnitRow::default() })
///     .with_page(PageRow { id: 2, project: 1, ..PageRow::default() });
///
/// let tx = storage.begin().unwrap();
/// assert_eq!(tx.pages(1).unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    units: RwLock<BTreeMap<i64, UnitRow>>,
    sections: RwLock<Vec<SectionRow>>,
    pages: RwLock<Vec<PageRow>>,
    spines: RwLock<BTreeMap<i64, Value>>,
    fail_next_begin: AtomicBool,
    fail_next_read: AtomicBool,
    commits: AtomicUsize,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project row.
    #[must_use]
    pub fn with_unit(self, row: UnitRow) -> Self {
        self.units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(row.id, row);
        self
    }

    /// Add a section row.
    #[must_use]
    pub fn with_section(self, row: SectionRow) -> Self {
        self.sections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
        self
    }

    /// Add a page row.
    #[must_use]
    pub fn with_page(self, row: PageRow) -> Self {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
        self
    }

    /// Seed the stored spine of a project with an arbitrary value.
    #[must_use]
    pub fn with_spine(self, unit: i64, spine: Value) -> Self {
        self.spines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(unit, spine);
        self
    }

    /// Replace a page row in place (matched by id), or add it.
    pub fn put_page(&self, row: PageRow) {
        let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
        match pages.iter_mut().find(|p| p.id == row.id) {
            Some(existing) => *existing = row,
            None => pages.push(row),
        }
    }

    /// Make the next [`Storage::begin`] call fail as if the backend were down.
    pub fn fail_next_begin(&self) {
        self.fail_next_begin.store(true, Ordering::SeqCst);
    }

    /// Make the next `sections`, `pages` or `spine` read fail.
    ///
    /// Project lookups are unaffected, so a build gets past loading its root.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), StorageError> {
        if self.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(StorageError::unavailable().with_backend(BACKEND));
        }
        Ok(())
    }

    /// Committed spine of a project.
    #[must_use]
    pub fn spine_of(&self, unit: i64) -> Option<Value> {
        self.spines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&unit)
            .cloned()
    }

    /// Number of committed transactions.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl Storage for MockStorage {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StorageError> {
        if self.fail_next_begin.swap(false, Ordering::SeqCst) {
            return Err(StorageError::unavailable().with_backend(BACKEND));
        }
        Ok(Box::new(MockTransaction {
            storage: self,
            pending: BTreeMap::new(),
        }))
    }
}

struct MockTransaction<'a> {
    storage: &'a MockStorage,
    pending: BTreeMap<i64, Value>,
}

impl Transaction for MockTransaction<'_> {
    fn unit(&self, id: i64) -> Result<Option<UnitRow>, StorageError> {
        Ok(self
            .storage
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }

    fn sections(&self, unit: i64) -> Result<Vec<SectionRow>, StorageError> {
        self.storage.check_read()?;
        let mut rows: Vec<SectionRow> = self
            .storage
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|row| row.project == unit)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn pages(&self, unit: i64) -> Result<Vec<PageRow>, StorageError> {
        self.storage.check_read()?;
        let mut rows: Vec<PageRow> = self
            .storage
            .pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|row| row.project == unit)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn spine(&self, unit: i64) -> Result<Option<Value>, StorageError> {
        self.storage.check_read()?;
        if let Some(pending) = self.pending.get(&unit) {
            return Ok(Some(pending.clone()));
        }
        Ok(self.storage.spine_of(unit))
    }

    fn set_spine(&mut self, unit: i64, spine: Value) -> Result<(), StorageError> {
        self.pending.insert(unit, spine);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let storage = self.storage;
        storage
            .spines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(self.pending);
        storage.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
