// src/data_types.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The editable table: column headers plus a grid of cell text.
///
/// Invariant: every row has exactly `headers.len()` cells, and there is
/// always at least one header. `TableManager` upholds this across all
/// mutations; `StorageHandler` rejects persisted data that violates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableState {
    pub fn empty() -> Self {
        TableState {
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// The starter table shown on first launch or when stored data is
    /// missing or unreadable: 3 named columns, 2 pre-filled rows.
    pub fn initial() -> Self {
        TableState {
            headers: vec![
                "Item".to_string(),
                "On hand".to_string(),
                "Counted".to_string(),
            ],
            rows: vec![
                vec!["Product 1".to_string(), "0".to_string(), "0".to_string()],
                vec!["Product 2".to_string(), "0".to_string(), "0".to_string()],
            ],
        }
    }

    /// True when every row length matches the header count and at least one
    /// column exists.
    pub fn is_consistent(&self) -> bool {
        !self.headers.is_empty() && self.rows.iter().all(|row| row.len() == self.headers.len())
    }
}

/// Parameters for one export/share request. Built fresh per call.
#[derive(Debug, Clone)]
pub struct ShareOptions {
    /// Plain file name for the produced PDF, e.g. "inventory.pdf".
    pub filename: String,
    /// Dialog title where the platform can display one.
    pub title: String,
    /// Accompanying message; display only.
    pub text: String,
}

/// How an export request ended. Cancellation is a normal outcome, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The user confirmed the share dialog and the file was handed over.
    Shared,
    /// Sharing was unavailable; the file went straight to the download dir.
    Downloaded(PathBuf),
    /// The user dismissed the share dialog.
    Cancelled,
}
