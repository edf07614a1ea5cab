// src/storage_handler.rs
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::data_types::TableState;
use crate::table_state::ChangeListener;

/// Fixed key the table is stored under, one slot per user.
pub const STORAGE_KEY: &str = "sharetable_data_v1";

/// Reads and writes the serialized table at a fixed location in the user
/// data directory. All failures are local concerns: reads fall back to
/// "nothing stored" and writes are logged and swallowed, so the in-memory
/// table stays the source of truth for the session.
#[derive(Debug, Clone)]
pub struct StorageHandler {
    path: PathBuf,
}

impl StorageHandler {
    pub fn new() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sharetable");
        StorageHandler {
            path: dir.join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Storage rooted at an explicit file path, for tests.
    pub fn with_path(path: PathBuf) -> Self {
        StorageHandler { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored table, or `None` when nothing usable is stored:
    /// missing file, unreadable file, malformed JSON, or a decoded table
    /// with ragged rows or zero columns.
    pub fn load(&self) -> Option<TableState> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no stored table at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("could not read stored table {}: {e}", self.path.display());
                return None;
            }
        };

        let state: TableState = match serde_json::from_str(&text) {
            Ok(state) => state,
            Err(e) => {
                warn!("stored table {} is malformed: {e}", self.path.display());
                return None;
            }
        };

        if !state.is_consistent() {
            warn!(
                "stored table {} has an unexpected shape, ignoring it",
                self.path.display()
            );
            return None;
        }

        Some(state)
    }

    /// Overwrites the stored table. Best effort: serialization or I/O
    /// failures are logged and swallowed.
    pub fn save(&self, state: &TableState) {
        let json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                warn!("could not serialize table for storage: {e}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("could not create storage dir {}: {e}", parent.display());
                return;
            }
        }

        if let Err(e) = fs::write(&self.path, json) {
            warn!("could not write stored table {}: {e}", self.path.display());
        }
    }
}

impl Default for StorageHandler {
    fn default() -> Self {
        StorageHandler::new()
    }
}

impl ChangeListener for StorageHandler {
    fn table_changed(&self, state: &TableState) {
        self.save(state);
    }
}
