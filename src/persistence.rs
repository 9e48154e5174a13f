//! Persistence
//!
//! The cart store reads its snapshot once when it opens and writes one after
//! every transition. Writes are best-effort: callers log failures and carry on
//! with the in-memory state.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::cart::CartSnapshot;

/// Errors raised by a snapshot store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the snapshot slot failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A durable single-slot home for the cart snapshot.
pub trait SnapshotStore: fmt::Debug {
    /// Read the stored snapshot, if there is one.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the slot exists but cannot be read.
    fn load(&self) -> Result<Option<CartSnapshot>, PersistenceError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the snapshot cannot be written.
    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), PersistenceError>;
}

/// Keeps the snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotStore {
    snapshot: Option<CartSnapshot>,
}

impl MemorySnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: CartSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, PersistenceError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), PersistenceError> {
        self.snapshot = Some(snapshot.clone());

        Ok(())
    }
}

/// Keeps the snapshot as a JSON file.
///
/// A missing file reads as "no snapshot". Writes go to a sibling temporary file
/// that is then renamed over the slot, so a reader never sees a partial file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");

        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<CartSnapshot>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, snapshot: &CartSnapshot) -> Result<(), PersistenceError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)?,
            _ => {}
        }

        let temp_path = self.temp_path();
        let contents = serde_json::to_string_pretty(snapshot)?;

        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}
