//! Durable storage of the session snapshot.
//!
//! The snapshot lives in three entries: the active step index, the
//! accumulated form data and the remote record identifier. A missing or
//! unreadable entry makes `load` report no snapshot at all; it never fails.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{FormData, RecordId, SessionSnapshot};

pub const ACTIVE_STEP_ENTRY: &str = "active_step";
pub const FORM_DATA_ENTRY: &str = "form_data.json";
pub const RECORD_ID_ENTRY: &str = "record_id.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait SessionStore {
    fn load(&self) -> Option<SessionSnapshot>;
    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn load(&self) -> Option<SessionSnapshot> {
        (**self).load()
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        (**self).save(snapshot)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// Stores the snapshot as plain files in one directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_entry(&self, name: &str) -> Option<String> {
        let path = self.entry(name);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable snapshot entry");
                None
            }
        }
    }

    /// Replaces an entry through a temporary file, so a reader sees either
    /// the old content or the new one.
    fn write_entry(&self, name: &str, content: &str) -> Result<(), StorageError> {
        let tmp = self.entry(&format!("{name}.tmp"));
        fs::write(&tmp, content).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        let path = self.entry(name);
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }

    fn remove_entry(&self, name: &str) -> Result<(), StorageError> {
        let path = self.entry(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<SessionSnapshot> {
        let step_text = self.read_entry(ACTIVE_STEP_ENTRY)?;
        let Ok(active_step) = step_text.trim().parse::<usize>() else {
            tracing::warn!(value = %step_text.trim(), "corrupt active step entry");
            return None;
        };

        let data = match self.read_entry(FORM_DATA_ENTRY) {
            Some(json) => match serde_json::from_str::<FormData>(&json) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt form data entry");
                    return None;
                }
            },
            None => {
                tracing::warn!("active step stored without form data");
                return None;
            }
        };

        let record_id = match self.read_entry(RECORD_ID_ENTRY) {
            Some(json) => match serde_json::from_str::<Option<RecordId>>(&json) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(error = %e, "corrupt record id entry");
                    return None;
                }
            },
            None => None,
        };

        Some(SessionSnapshot {
            active_step,
            data,
            record_id,
        })
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Record id first, step index last. A save cut short leaves data ahead
        // of the stored step, which resumes like a session that went back.
        match &snapshot.record_id {
            Some(id) => self.write_entry(RECORD_ID_ENTRY, &serde_json::to_string(id)?)?,
            None => self.remove_entry(RECORD_ID_ENTRY)?,
        }
        self.write_entry(FORM_DATA_ENTRY, &serde_json::to_string(&snapshot.data)?)?;
        self.write_entry(ACTIVE_STEP_ENTRY, &snapshot.active_step.to_string())?;

        tracing::debug!(dir = %self.dir.display(), step = snapshot.active_step, "snapshot saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.remove_entry(ACTIVE_STEP_ENTRY)?;
        self.remove_entry(FORM_DATA_ENTRY)?;
        self.remove_entry(RECORD_ID_ENTRY)?;
        tracing::debug!(dir = %self.dir.display(), "snapshot cleared");
        Ok(())
    }
}

/// Keeps the snapshot in memory only. Used for ephemeral sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    snapshot: Option<SessionSnapshot>,
    saves: usize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            saves: 0,
        }
    }

    /// Number of successful `save` calls so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<SessionSnapshot> {
        self.snapshot.clone()
    }

    fn save(&mut self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.snapshot = None;
        Ok(())
    }
}
