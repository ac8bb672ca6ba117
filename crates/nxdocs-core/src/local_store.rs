//! Device-local persistence for quick-saved commands.
//!
//! The list is stored as one JSON array under a single key, the way a
//! browser keeps it in local storage. Nothing here talks to the server.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::CoreError;
use crate::generator::LocalSavedCommand;

/// Key the saved-command list is stored under.
pub const STORAGE_KEY: &str = "netexec-commands";

/// A key-scoped store for the quick-save list.
pub trait LocalStore {
    /// Load the list. A missing entry yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corrupt`] if the stored value is not a valid list,
    /// or [`CoreError::Io`] if it cannot be read.
    fn load(&self) -> Result<Vec<LocalSavedCommand>, CoreError>;

    /// Replace the stored list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the list cannot be written.
    fn persist(&self, commands: &[LocalSavedCommand]) -> Result<(), CoreError>;
}

fn decode(raw: &str) -> Result<Vec<LocalSavedCommand>, CoreError> {
    serde_json::from_str(raw).map_err(|e| CoreError::Corrupt {
        key: STORAGE_KEY.to_owned(),
        reason: e.to_string(),
    })
}

fn encode(commands: &[LocalSavedCommand]) -> Result<String, CoreError> {
    serde_json::to_string(commands).map_err(|e| CoreError::Encode {
        key: STORAGE_KEY.to_owned(),
        reason: e.to_string(),
    })
}

/// Stores the list in `<dir>/netexec-commands.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The file is created on first persist.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: &std::io::Error) -> CoreError {
        CoreError::Io {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

impl LocalStore for FileStore {
    fn load(&self) -> Result<Vec<LocalSavedCommand>, CoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(&e)),
        }
    }

    fn persist(&self, commands: &[LocalSavedCommand]) -> Result<(), CoreError> {
        let raw = encode(commands)?;
        std::fs::write(&self.path, raw).map_err(|e| self.io_error(&e))
    }
}

/// Keeps the encoded list in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw JSON currently stored, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Overwrite the raw stored value.
    pub fn set_raw(&self, raw: impl Into<String>) {
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.into());
    }
}

impl LocalStore for MemoryStore {
    fn load(&self) -> Result<Vec<LocalSavedCommand>, CoreError> {
        self.raw().map_or_else(|| Ok(Vec::new()), |raw| decode(&raw))
    }

    fn persist(&self, commands: &[LocalSavedCommand]) -> Result<(), CoreError> {
        self.set_raw(encode(commands)?);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::{CommandForm, build_command};

    fn snapshot(name: &str) -> LocalSavedCommand {
        let form = CommandForm::default();
        let command = build_command(&form);
        LocalSavedCommand::from_form(name, form, command)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.persist(&[snapshot("a"), snapshot("b")]).unwrap();

        let reopened = FileStore::new(dir.path());
        let names: Vec<String> = reopened.load().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(store.path().ends_with("netexec-commands.json"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn memory_store_uses_camel_case_json() {
        let store = MemoryStore::new();
        store.persist(&[snapshot("quick")]).unwrap();
        let raw = store.raw().unwrap();
        assert!(raw.contains("\"targetValue\""));
        assert!(raw.contains("\"selectedModule\""));
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
