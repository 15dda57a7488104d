//! Snapshot persistence.
//!
//! The snapshot store is the only filesystem touchpoint of the pipeline:
//! the driver loads the previous Model AST before compiling and persists
//! the current one after a successful emission.

use std::path::{Path, PathBuf};

use laforge_schema::{SNAPSHOT_VERSION, SnapshotDoc};
use tracing::{debug, info};

use crate::error::{MigrateError, MigrateResult};

/// Load/save contract for the persisted Model AST.
pub trait SnapshotStore {
    /// Load the previous snapshot, or `None` on the first run.
    fn load(&self) -> MigrateResult<Option<SnapshotDoc>>;

    /// Persist the current snapshot.
    fn save(&self, doc: &SnapshotDoc) -> MigrateResult<()>;
}

/// JSON-file snapshot store.
pub struct FsSnapshotStore {
    path: PathBuf,
}

impl FsSnapshotStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load(&self) -> MigrateResult<Option<SnapshotDoc>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot present");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let doc: SnapshotDoc = serde_json::from_str(&content)?;
        if doc.version != SNAPSHOT_VERSION {
            return Err(MigrateError::SnapshotVersion {
                found: doc.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        debug!(path = %self.path.display(), models = doc.models.len(), "snapshot loaded");
        Ok(Some(doc))
    }

    fn save(&self, doc: &SnapshotDoc) -> MigrateResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), models = doc.models.len(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laforge_schema::compile_domain;

    fn sample_doc() -> SnapshotDoc {
        let domain = compile_domain(
            r#"
            model Team { id: uuid pk }
            model User { id: uuid pk; teamId: uuid; team: belongsTo(Team) }
            "#,
        )
        .unwrap();
        SnapshotDoc::project(&domain)
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::new(dir.path().join("snapshot.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSnapshotStore::new(dir.path().join("nested/dir/snapshot.json"));

        let doc = sample_doc();
        store.save(&doc).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let store = FsSnapshotStore::new(&path);

        let mut doc = sample_doc();
        doc.version = 99;
        let json = serde_json::to_string(&doc).unwrap();
        std::fs::write(&path, json).unwrap();

        assert!(matches!(
            store.load(),
            Err(MigrateError::SnapshotVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FsSnapshotStore::new(&path);
        assert!(matches!(store.load(), Err(MigrateError::Serde(_))));
    }
}
