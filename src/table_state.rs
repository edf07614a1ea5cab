// src/table_state.rs
use log::warn;

use crate::data_types::TableState;
use crate::storage_handler::StorageHandler;

/// Observer for table mutations. The persistence adapter subscribes one of
/// these so that storage writes stay out of the mutation logic itself.
pub trait ChangeListener {
    fn table_changed(&self, state: &TableState);
}

/// Owns the table and applies all edits to it.
///
/// Every successful mutation leaves the state consistent (row lengths equal
/// the header count) and notifies the subscribed listeners exactly once.
/// Boundary cases (removing the last column, removing a row from an empty
/// table, out-of-bounds edits) are silent no-ops and notify nobody.
pub struct TableManager {
    state: TableState,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl TableManager {
    pub fn new(state: TableState) -> Self {
        TableManager {
            state,
            listeners: Vec::new(),
        }
    }

    /// Loads the stored table, falling back to the starter table when the
    /// adapter has nothing usable. Never fails.
    pub fn load(storage: &StorageHandler) -> Self {
        let state = storage.load().unwrap_or_else(TableState::initial);
        TableManager::new(state)
    }

    pub fn subscribe(&mut self, listener: Box<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    /// Appends one row of empty cells matching the current column count.
    pub fn add_row(&mut self) {
        let width = self.state.headers.len();
        self.state.rows.push(vec![String::new(); width]);
        self.notify();
    }

    /// Removes the last row; no-op when the table has no rows.
    pub fn remove_row(&mut self) {
        if self.state.rows.pop().is_some() {
            self.notify();
        }
    }

    /// Appends a generated header and one empty cell to every row.
    pub fn add_column(&mut self) {
        let label = column_label(self.state.headers.len() + 1);
        self.state.headers.push(label);
        for row in &mut self.state.rows {
            row.push(String::new());
        }
        self.notify();
    }

    /// Removes the last column everywhere; no-op when only one remains.
    pub fn remove_column(&mut self) {
        if self.state.headers.len() <= 1 {
            return;
        }
        self.state.headers.pop();
        for row in &mut self.state.rows {
            row.pop();
        }
        self.notify();
    }

    pub fn set_header(&mut self, index: usize, value: String) {
        match self.state.headers.get_mut(index) {
            Some(header) => {
                *header = value;
                self.notify();
            }
            None => warn!("ignoring header edit at out-of-bounds index {index}"),
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: String) {
        match self.state.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                self.notify();
            }
            None => warn!("ignoring cell edit at out-of-bounds position ({row}, {col})"),
        }
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener.table_changed(&self.state);
        }
    }
}

/// Auto-generated header text for the n-th column. Position-derived, so a
/// removed and re-added column gets the same label again.
fn column_label(n: usize) -> String {
    format!("Column {n}")
}
