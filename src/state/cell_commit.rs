use std::time::{Duration, Instant};

use crate::state::data_model::RowId;

pub const DEFAULT_CELL_COMMIT_DELAY: Duration = Duration::from_millis(300);

/// A typed value ready to be written into the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellWrite {
    pub row_id: RowId,
    pub column: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingCellWrite {
    write: CellWrite,
    deadline: Instant,
}

/// Typing debounce for the focused cell.
///
/// Keystrokes update a local draft; the draft becomes a [`CellWrite`] once
/// the delay elapses without further input, or earlier when the cell is left.
/// Only one cell can hold a draft at a time.
#[derive(Clone, Debug)]
pub struct CellCommitBuffer {
    delay: Duration,
    pending: Option<PendingCellWrite>,
}

impl Default for CellCommitBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_COMMIT_DELAY)
    }
}

impl CellCommitBuffer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records a keystroke. A draft held by a different cell is returned so
    /// the caller can commit it first.
    pub fn input(
        &mut self,
        row_id: &RowId,
        column: &str,
        value: String,
        now: Instant,
    ) -> Option<CellWrite> {
        let displaced = match self.pending.take() {
            Some(pending) if pending.write.row_id == *row_id && pending.write.column == column => {
                None
            }
            other => other.map(|pending| pending.write),
        };

        self.pending = Some(PendingCellWrite {
            write: CellWrite {
                row_id: row_id.clone(),
                column: column.to_string(),
                value,
            },
            deadline: now + self.delay,
        });
        displaced
    }

    pub fn take_due(&mut self, now: Instant) -> Option<CellWrite> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take().map(|p| p.write),
            _ => None,
        }
    }

    /// Commits the draft for the cell being left, ignoring its deadline.
    pub fn take_for(&mut self, row_id: &RowId, column: &str) -> Option<CellWrite> {
        match &self.pending {
            Some(pending) if pending.write.row_id == *row_id && pending.write.column == column => {
                self.pending.take().map(|p| p.write)
            }
            _ => None,
        }
    }

    /// Drops a draft belonging to a deleted row.
    pub fn discard_row(&mut self, row_id: &RowId) -> bool {
        if self.pending.as_ref().is_some_and(|p| p.write.row_id == *row_id) {
            self.pending = None;
            return true;
        }
        false
    }

    pub fn take_any(&mut self) -> Option<CellWrite> {
        self.pending.take().map(|p| p.write)
    }

    pub fn draft(&self, row_id: &RowId, column: &str) -> Option<&str> {
        self.pending
            .as_ref()
            .filter(|p| p.write.row_id == *row_id && p.write.column == column)
            .map(|p| p.write.value.as_str())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
