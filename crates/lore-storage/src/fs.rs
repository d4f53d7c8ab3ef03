//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`], which keeps every record as a JSON document:
//!
//! ```text
//! {root}/
//! +-- projects/
//! |   +-- 1.json        # {"id": 1, "title": ..., "order": [...], "spine": {...}}
//! +-- sections/
//! |   +-- 10.json       # {"id": 10, "project": 1, "root": 0, ...}
//! +-- pages/
//!     +-- 20.json       # {"id": 20, "project": 1, "section": 10, ...}
//! ```
//!
//! The encoded spine lives under the `spine` key of the project document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::rows::{PageRow, SectionRow, UnitRow};
use crate::storage::{Storage, StorageError, StorageErrorKind, Transaction};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

const PROJECTS_DIR: &str = "projects";
const SECTIONS_DIR: &str = "sections";
const PAGES_DIR: &str = "pages";

/// Key under which the encoded spine is stored on a project document.
const SPINE_KEY: &str = "spine";

/// Filesystem storage backed by a directory of JSON records.
///
/// Transactions are serialized within the process by a writer lock, so two
/// rebuilds of the same project never interleave their writes. Separate
/// processes sharing one directory get last-writer-wins semantics.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use lore_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("data"));
/// let tx = storage.begin()?;
/// let unit = tx.unit(1)?;
/// ```
pub struct FsStorage {
    root: PathBuf,
    writer: Mutex<()>,
}

impl FsStorage {
    /// Create a new filesystem storage rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            writer: Mutex::new(()),
        }
    }

    /// Root data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Storage for FsStorage {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StorageError> {
        if !self.root.is_dir() {
            return Err(StorageError::not_found(&self.root).with_backend(BACKEND));
        }

        let guard = self
            .writer
            .lock()
            .map_err(|_| StorageError::unavailable().with_backend(BACKEND))?;

        Ok(Box::new(FsTransaction {
            root: &self.root,
            _guard: guard,
            pending: BTreeMap::new(),
        }))
    }
}

/// Transaction over an [`FsStorage`] directory.
struct FsTransaction<'a> {
    root: &'a Path,
    _guard: MutexGuard<'a, ()>,
    /// Spine writes not yet committed, keyed by project id.
    pending: BTreeMap<i64, Value>,
}

impl FsTransaction<'_> {
    fn project_path(&self, id: i64) -> PathBuf {
        self.root.join(PROJECTS_DIR).join(format!("{id}.json"))
    }

    /// Every well-formed row in one record directory.
    fn read_rows<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, StorageError> {
        let mut rows = Vec::new();
        for (path, value) in read_records(&self.root.join(dir))? {
            match serde_json::from_value::<T>(value) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping malformed record"
                    );
                }
            }
        }
        Ok(rows)
    }
}

impl Transaction for FsTransaction<'_> {
    fn unit(&self, id: i64) -> Result<Option<UnitRow>, StorageError> {
        let path = self.project_path(id);
        let Some(value) = read_record(&path)? else {
            return Ok(None);
        };

        match serde_json::from_value::<UnitRow>(value) {
            Ok(mut row) => {
                if row.id == 0 {
                    row.id = id;
                }
                Ok(Some(row))
            }
            Err(e) => Err(StorageError::new(StorageErrorKind::InvalidRecord)
                .with_path(path)
                .with_backend(BACKEND)
                .with_source(e)),
        }
    }

    fn sections(&self, unit: i64) -> Result<Vec<SectionRow>, StorageError> {
        let mut rows: Vec<SectionRow> = self.read_rows(SECTIONS_DIR)?;
        rows.retain(|row| row.project == unit);
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn pages(&self, unit: i64) -> Result<Vec<PageRow>, StorageError> {
        let mut rows: Vec<PageRow> = self.read_rows(PAGES_DIR)?;
        rows.retain(|row| row.project == unit);
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    fn spine(&self, unit: i64) -> Result<Option<Value>, StorageError> {
        if let Some(pending) = self.pending.get(&unit) {
            return Ok(Some(pending.clone()));
        }

        let Some(mut project) = read_record(&self.project_path(unit))? else {
            return Ok(None);
        };
        Ok(project
            .as_object_mut()
            .and_then(|obj| obj.remove(SPINE_KEY)))
    }

    fn set_spine(&mut self, unit: i64, spine: Value) -> Result<(), StorageError> {
        self.pending.insert(unit, spine);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        for (unit, spine) in &self.pending {
            let path = self.project_path(*unit);
            let mut project = read_record(&path)?
                .ok_or_else(|| StorageError::not_found(&path).with_backend(BACKEND))?;

            let Some(obj) = project.as_object_mut() else {
                return Err(StorageError::new(StorageErrorKind::InvalidRecord)
                    .with_path(path)
                    .with_backend(BACKEND));
            };
            obj.insert(SPINE_KEY.to_owned(), spine.clone());

            write_record(&path, &project)?;
            tracing::debug!(unit, path = %path.display(), "Spine written");
        }
        Ok(())
    }
}

/// Read and parse one JSON record.
///
/// Returns `Ok(None)` if the file does not exist.
fn read_record(path: &Path) -> Result<Option<Value>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::io(e, Some(path.to_path_buf())).with_backend(BACKEND));
        }
    };

    serde_json::from_str(&content).map(Some).map_err(|e| {
        StorageError::new(StorageErrorKind::InvalidRecord)
            .with_path(path)
            .with_backend(BACKEND)
            .with_source(e)
    })
}

/// Read every `*.json` record in `dir`, sorted by file name.
///
/// A missing directory yields no records. Records that fail to parse are
/// skipped with a warning.
fn read_records(dir: &Path) -> Result<Vec<(PathBuf, Value)>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StorageError::io(e, Some(dir.to_path_buf())).with_backend(BACKEND));
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| StorageError::io(e, Some(dir.to_path_buf())).with_backend(BACKEND))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        match read_record(&path) {
            Ok(Some(value)) => records.push((path, value)),
            Ok(None) => {}
            Err(e) if e.kind == StorageErrorKind::InvalidRecord => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Skipping unreadable record"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

/// Write a record atomically via a temporary sibling file.
fn write_record(path: &Path, value: &Value) -> Result<(), StorageError> {
    let content = serde_json::to_vec_pretty(value).map_err(|e| {
        StorageError::new(StorageErrorKind::Other)
            .with_path(path)
            .with_backend(BACKEND)
            .with_source(e)
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|e| StorageError::io(e, Some(path.to_path_buf())).with_backend(BACKEND))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, dir: &str, id: i64, value: &Value) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{id}.json")), value.to_string()).unwrap();
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root,
            PROJECTS_DIR,
            1,
            &json!({"id": 1, "title": "Codex", "name": "codex", "order": [11, 10]}),
        );
        write(root, PROJECTS_DIR, 2, &json!({"id": 2, "title": "Other"}));
        write(
            root,
            SECTIONS_DIR,
            11,
            &json!({"id": 11, "project": 1, "title": "B"}),
        );
        write(
            root,
            SECTIONS_DIR,
            10,
            &json!({"id": 10, "project": 1, "title": "A", "priority": 3}),
        );
        write(
            root,
            SECTIONS_DIR,
            12,
            &json!({"id": 12, "project": 2, "title": "Elsewhere"}),
        );
        write(
            root,
            PAGES_DIR,
            20,
            &json!({"id": 20, "project": 1, "section": 10, "tags": "a, b"}),
        );
        tmp
    }

    #[test]
    fn test_unit_reads_project() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        let unit = tx.unit(1).unwrap().unwrap();

        assert_eq!(unit.title, "Codex");
        assert_eq!(unit.order, vec![11, 10]);
    }

    #[test]
    fn test_unit_missing_returns_none() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        assert!(tx.unit(99).unwrap().is_none());
    }

    #[test]
    fn test_unit_id_defaults_to_file_name() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), PROJECTS_DIR, 5, &json!({"title": "No id"}));
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        assert_eq!(tx.unit(5).unwrap().unwrap().id, 5);
    }

    #[test]
    fn test_sections_filtered_and_sorted() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        let ids: Vec<i64> = tx.sections(1).unwrap().iter().map(|s| s.id).collect();

        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_pages_skip_malformed_records() {
        let tmp = fixture();
        fs::write(tmp.path().join(PAGES_DIR).join("21.json"), "{not json").unwrap();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        let pages = tx.pages(1).unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, 20);
    }

    #[test]
    fn test_missing_record_dirs_are_empty() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), PROJECTS_DIR, 1, &json!({"id": 1}));
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        assert!(tx.sections(1).unwrap().is_empty());
        assert!(tx.pages(1).unwrap().is_empty());
    }

    #[test]
    fn test_begin_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let storage = FsStorage::new(tmp.path().join("absent"));

        let err = storage.begin().err().unwrap();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
    }

    #[test]
    fn test_spine_absent_returns_none() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let tx = storage.begin().unwrap();

        assert!(tx.spine(1).unwrap().is_none());
        assert!(tx.spine(99).unwrap().is_none());
    }

    #[test]
    fn test_set_spine_visible_in_transaction_before_commit() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let mut tx = storage.begin().unwrap();

        tx.set_spine(1, json!({"unit": 1})).unwrap();

        assert_eq!(tx.spine(1).unwrap(), Some(json!({"unit": 1})));
    }

    #[test]
    fn test_uncommitted_spine_is_discarded() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        {
            let mut tx = storage.begin().unwrap();
            tx.set_spine(1, json!({"unit": 1})).unwrap();
        }

        let tx = storage.begin().unwrap();
        assert!(tx.spine(1).unwrap().is_none());
    }

    #[test]
    fn test_commit_preserves_other_project_keys() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let mut tx = storage.begin().unwrap();
        tx.set_spine(1, json!({"unit": 1, "nodes": [], "tags": []}))
            .unwrap();
        tx.commit().unwrap();

        let raw: Value = serde_json::from_str(
            &fs::read_to_string(tmp.path().join("projects/1.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["title"], "Codex");
        assert_eq!(raw["order"], json!([11, 10]));
        assert_eq!(raw["spine"]["unit"], 1);

        let tx = storage.begin().unwrap();
        assert_eq!(
            tx.spine(1).unwrap(),
            Some(json!({"unit": 1, "nodes": [], "tags": []}))
        );
    }

    #[test]
    fn test_commit_missing_project_fails() {
        let tmp = fixture();
        let storage = FsStorage::new(tmp.path().to_path_buf());
        let mut tx = storage.begin().unwrap();
        tx.set_spine(42, json!({})).unwrap();

        let err = tx.commit().unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
    }
}
