use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{GridConfig, RefetchPolicy};
use crate::io::store::StoreError;
use crate::state::cell_commit::{CellCommitBuffer, CellWrite};
use crate::state::data_model::{BatchType, CsvFileRecord, FileId, RowId, SaveRequest};
use crate::state::edit_state::{EditState, RowSetDiff};
use crate::state::flush::{FlushScheduler, FlushState, FollowUp, ManualSave};
use crate::state::grid::{GridState, GridView};
use crate::state::navigation::{self, CellCursor, NavKey};
use crate::state::viewport::Viewport;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// One flush handed to the caller. The caller sends [`request`] to the
/// store and reports the outcome through [`EditSession::complete_flush`].
///
/// [`request`]: FlushTicket::request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlushTicket {
    session_id: u64,
    generation: u64,
    revision: u64,
    diff: RowSetDiff,
    request: SaveRequest,
}

impl FlushTicket {
    pub fn request(&self) -> &SaveRequest {
        &self.request
    }
}

/// Edit session for one open file: snapshot, both debounce stages, grid
/// presentation, cursor and zoom.
///
/// All methods are synchronous. Time is passed in as `now`; the driver
/// sleeps until [`next_wakeup`](EditSession::next_wakeup) and calls
/// [`poll`](EditSession::poll).
#[derive(Clone, Debug)]
pub struct EditSession {
    file_id: FileId,
    original_name: String,
    batch_type: BatchType,
    uploaded_at: DateTime<Utc>,
    edits: EditState,
    cells: CellCommitBuffer,
    scheduler: FlushScheduler,
    grid: GridState,
    viewport: Viewport,
    cursor: Option<CellCursor>,
    notices: Vec<Notice>,
    refetch_policy: RefetchPolicy,
    session_id: u64,
    generation: u64,
    closed: bool,
}

impl EditSession {
    pub fn open(file: &CsvFileRecord, config: &GridConfig) -> Self {
        Self::with_timing(
            file,
            config.autosave_delay(),
            config.cell_commit_delay(),
            config.refetch_policy,
        )
    }

    pub fn with_timing(
        file: &CsvFileRecord,
        autosave_delay: Duration,
        cell_commit_delay: Duration,
        refetch_policy: RefetchPolicy,
    ) -> Self {
        Self {
            file_id: file.id.clone(),
            original_name: file.original_name.clone(),
            batch_type: file.batch_type.clone(),
            uploaded_at: file.uploaded_at,
            edits: EditState::from_file(file),
            cells: CellCommitBuffer::new(cell_commit_delay),
            scheduler: FlushScheduler::new(autosave_delay),
            grid: GridState::new(file.batch_type.columns.clone()),
            viewport: Viewport::default(),
            cursor: None,
            notices: Vec::new(),
            refetch_policy,
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            closed: false,
        }
    }

    /// Re-seeds from a refetched file, discarding unflushed edits. Grid
    /// presentation and cell drafts are kept.
    pub fn reseed(&mut self, file: &CsvFileRecord) {
        self.reseed_inner(file);
        if !self.scheduler.is_flushing() {
            self.scheduler.cancel();
        }
    }

    fn reseed_inner(&mut self, file: &CsvFileRecord) {
        self.edits.initialize(file);
        self.original_name = file.original_name.clone();
        self.uploaded_at = file.uploaded_at;
        self.generation += 1;
        if let Some(cursor) = &self.cursor {
            if self.edits.row(&cursor.row_id).is_none() {
                self.cursor = None;
            }
        }
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        self.edits.file_name()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn batch_type(&self) -> &BatchType {
        &self.batch_type
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn edits(&self) -> &EditState {
        &self.edits
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut GridState {
        &mut self.grid
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn cursor(&self) -> Option<&CellCursor> {
        self.cursor.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.edits.rows().len()
    }

    pub fn is_dirty(&self) -> bool {
        self.edits.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.scheduler.is_flushing()
    }

    pub fn flush_state(&self) -> FlushState {
        self.scheduler.state()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn view(&self) -> GridView {
        self.grid.view(self.edits.rows())
    }

    /// Text shown in a cell: its uncommitted draft, else the snapshot value.
    pub fn cell_display(&self, row_id: &RowId, column: &str) -> String {
        self.cells
            .draft(row_id, column)
            .or_else(|| self.edits.cell_value(row_id, column))
            .unwrap_or_default()
            .to_string()
    }

    /// Visible data columns in schema order.
    pub fn export_columns(&self) -> Vec<String> {
        self.grid
            .columns()
            .iter()
            .filter(|col| self.grid.is_visible(col))
            .cloned()
            .collect()
    }

    pub fn focus_cell(&mut self, cursor: CellCursor) {
        self.cursor = Some(cursor);
    }

    /// Keystroke into a cell. The value reaches the snapshot after the cell
    /// commit delay, or sooner when the cell is left.
    pub fn type_into_cell(&mut self, row_id: &RowId, column: &str, value: String, now: Instant) {
        if self.closed {
            return;
        }
        if let Some(displaced) = self.cells.input(row_id, column, value, now) {
            self.apply_write(displaced, now);
        }
        self.cursor = Some(CellCursor::new(row_id.clone(), column));
    }

    /// Focus left `row_id`/`column`. Its draft is committed; the cursor is
    /// cleared only if it still points there.
    pub fn blur_cell(&mut self, row_id: &RowId, column: &str, now: Instant) {
        if let Some(write) = self.cells.take_for(row_id, column) {
            self.apply_write(write, now);
        }
        if self
            .cursor
            .as_ref()
            .is_some_and(|c| &c.row_id == row_id && c.column == column)
        {
            self.cursor = None;
        }
    }

    /// Enter/arrow handling. The draft of the cell being left is committed
    /// into the snapshot whether or not focus moves. Returns true if it did.
    pub fn handle_key(&mut self, key: NavKey, now: Instant) -> bool {
        let Some(cursor) = self.cursor.clone() else {
            return false;
        };
        if let Some(write) = self.cells.take_for(&cursor.row_id, &cursor.column) {
            self.apply_write(write, now);
        }

        match navigation::navigate(&self.view(), &cursor, key) {
            Some(target) => {
                self.cursor = Some(target);
                true
            }
            None => false,
        }
    }

    pub fn set_cell_value(&mut self, row_id: &RowId, column: &str, value: String, now: Instant) {
        self.edits.set_cell_value(row_id, column, value);
        self.scheduler.note_edit(now);
    }

    /// Removes the row from the snapshot right away. The deletion reaches
    /// the store with the next flush.
    pub fn delete_row(&mut self, row_id: &RowId) {
        self.cells.discard_row(row_id);
        if self.cursor.as_ref().is_some_and(|c| &c.row_id == row_id) {
            self.cursor = None;
        }
        if self.edits.delete_row(row_id) {
            self.notices.push(Notice::success("Row deleted"));
        }
    }

    pub fn rename_file(&mut self, new_name: String) {
        self.edits.rename_file(new_name);
    }

    pub fn next_wakeup(&self) -> Option<Instant> {
        if self.closed {
            return None;
        }
        match (self.cells.deadline(), self.scheduler.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Commits a due cell draft and starts a flush if the autosave deadline
    /// has passed.
    pub fn poll(&mut self, now: Instant) -> Option<FlushTicket> {
        if self.closed {
            return None;
        }
        if let Some(write) = self.cells.take_due(now) {
            self.apply_write(write, now);
        }
        if self.scheduler.is_due(now) {
            return self.begin_flush();
        }
        None
    }

    /// Manual save: flush now, or right after the flush already in flight.
    pub fn request_save(&mut self, now: Instant) -> Option<FlushTicket> {
        if self.closed {
            return None;
        }
        if let Some(write) = self.cells.take_any() {
            self.apply_write(write, now);
        }
        match self.scheduler.request_manual() {
            ManualSave::FlushNow => self.begin_flush(),
            ManualSave::Queued => {
                debug!(file = %self.file_id, "manual save queued behind in-flight flush");
                None
            }
        }
    }

    /// Reports the store's answer for `ticket`. Returns the next flush to
    /// run when a queued manual save still has work to do.
    pub fn complete_flush(
        &mut self,
        ticket: FlushTicket,
        result: Result<CsvFileRecord, StoreError>,
        now: Instant,
    ) -> Option<FlushTicket> {
        if self.closed {
            debug!(file = %self.file_id, "flush finished after teardown; result discarded");
            return None;
        }
        if ticket.session_id != self.session_id {
            debug!(file = %self.file_id, "flush ticket from another session ignored");
            return None;
        }
        let current = ticket.generation == self.generation;

        let follow_up = match result {
            Ok(file) => {
                if current {
                    self.accept_saved(&ticket, &file);
                } else {
                    debug!(file = %self.file_id, "flush result for a previous snapshot ignored");
                }
                self.scheduler.resolve_success(self.edits.is_dirty(), now)
            }
            Err(err) => {
                warn!(file = %self.file_id, error = %err, "save failed");
                self.notices.push(Notice::error(err.to_string()));
                let edited_in_flight =
                    self.edits.is_dirty() && self.edits.revision() != ticket.revision;
                self.scheduler.resolve_failure(edited_in_flight, now)
            }
        };

        match follow_up {
            FollowUp::FlushNow => self.begin_flush(),
            FollowUp::Rearmed => {
                debug!(file = %self.file_id, "edits pending after flush; autosave re-armed");
                None
            }
            FollowUp::None => None,
        }
    }

    /// Cancels the cell draft and the autosave timer. Results of a flush
    /// still in flight are dropped when they arrive.
    pub fn teardown(&mut self) {
        self.cells.cancel();
        self.scheduler.cancel();
        self.closed = true;
        debug!(file = %self.file_id, "edit session closed");
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn accept_saved(&mut self, ticket: &FlushTicket, file: &CsvFileRecord) {
        let edited_in_flight = self.edits.revision() != ticket.revision;
        match self.refetch_policy {
            RefetchPolicy::Reseed => {
                if edited_in_flight {
                    warn!(
                        file = %self.file_id,
                        "edits made during save were replaced by the saved file"
                    );
                }
                self.reseed_inner(file);
            }
            RefetchPolicy::KeepLocal => self.edits.mark_persisted(&ticket.diff, ticket.revision),
        }
        info!(file = %self.file_id, rows = file.row_count, "changes saved");
        self.notices.push(Notice::success("Changes saved successfully"));
    }

    fn begin_flush(&mut self) -> Option<FlushTicket> {
        if !self.scheduler.begin() {
            return None;
        }
        let diff = self.edits.diff_against_baseline();
        let request = SaveRequest {
            id: self.file_id.clone(),
            file_name: self.edits.file_name().to_string(),
            rows: diff.updated_rows.clone(),
            deleted_row_ids: diff.deleted_row_ids.clone(),
        };
        debug!(
            file = %self.file_id,
            updated = request.rows.len(),
            deleted = request.deleted_row_ids.len(),
            "flush prepared"
        );
        Some(FlushTicket {
            session_id: self.session_id,
            generation: self.generation,
            revision: self.edits.revision(),
            diff,
            request,
        })
    }

    fn apply_write(&mut self, write: CellWrite, now: Instant) {
        self.set_cell_value(&write.row_id, &write.column, write.value, now);
    }
}
