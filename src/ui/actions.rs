use dioxus::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::GridConfig;
use crate::io::csv_export;
use crate::io::csv_import;
use crate::io::json_store::JsonFileStore;
use crate::io::store::{FileStore, StoreError};
use crate::state::data_model::{BatchTypeId, FileId};
use crate::state::session::{EditSession, FlushTicket, Notice};
use crate::state::wakeup::WakeupSlot;

/// Shared by every component below `App`.
#[derive(Clone)]
pub struct AppContext {
    pub config: GridConfig,
    pub store: JsonFileStore,
    wakeup: Signal<WakeupSlot<Task>>,
}

impl AppContext {
    /// Must be called from inside a component scope, which owns the wakeup
    /// signal.
    pub fn new(config: GridConfig, store: JsonFileStore) -> Self {
        Self {
            config,
            store,
            wakeup: Signal::new(WakeupSlot::default()),
        }
    }
}

pub async fn open_file(
    ctx: AppContext,
    id: FileId,
    mut session: Signal<Option<EditSession>>,
    mut error_message: Signal<Option<String>>,
) {
    match ctx.store.fetch_file(&id).await {
        Ok(file) => {
            info!(file = %file.id, rows = file.rows.len(), "file opened");
            session.set(Some(EditSession::open(&file, &ctx.config)));
            error_message.set(None);
        }
        Err(err) => {
            warn!(file = %id, error = %err, "failed to load file");
            error_message.set(Some(format!("Error loading file: {err}")));
        }
    }
}

pub async fn import_and_open(
    ctx: AppContext,
    path: PathBuf,
    batch_type_id: BatchTypeId,
    session: Signal<Option<EditSession>>,
    mut error_message: Signal<Option<String>>,
) {
    let batch_type = match ctx.store.load() {
        Ok(db) => db.batch_type(&batch_type_id).cloned(),
        Err(err) => {
            error_message.set(Some(err.to_string()));
            return;
        }
    };
    let Some(batch_type) = batch_type else {
        error_message.set(Some(format!("Unknown batch type {batch_type_id}")));
        return;
    };

    let request = match csv_import::load_import(&path, &batch_type) {
        Ok(request) => request,
        Err(err) => {
            error_message.set(Some(format!("Failed to import file: {err}")));
            return;
        }
    };

    match ctx.store.create_file(&request).await {
        Ok(file) => open_file(ctx, file.id, session, error_message).await,
        Err(err) => error_message.set(Some(format!("Failed to import file: {err}"))),
    }
}

/// Keeps one wakeup task armed at the session's next deadline. The task is
/// replaced only when the deadline moves.
pub fn schedule_wakeup(
    ctx: AppContext,
    session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
) {
    let mut wakeup = ctx.wakeup;
    let next = session.peek().as_ref().and_then(EditSession::next_wakeup);
    let retarget = wakeup.write().retarget(next);
    if let Some(stale) = retarget.cancel {
        stale.cancel();
    }
    let Some(deadline) = retarget.arm else {
        return;
    };
    let task = spawn(async move {
        tokio::time::sleep_until(deadline.into()).await;
        wakeup.write().fired();
        poll_now(ctx, session, notices);
    });
    wakeup.write().arm(deadline, task);
}

pub fn poll_now(
    ctx: AppContext,
    mut session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
) {
    let ticket = session.with_mut(|s| s.as_mut().and_then(|s| s.poll(Instant::now())));
    match ticket {
        Some(ticket) => {
            spawn(run_flush(ctx, ticket, session, notices));
        }
        None => schedule_wakeup(ctx, session, notices),
    }
}

pub fn save_now(
    ctx: AppContext,
    mut session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
) {
    let ticket = session.with_mut(|s| s.as_mut().and_then(|s| s.request_save(Instant::now())));
    if let Some(ticket) = ticket {
        spawn(run_flush(ctx, ticket, session, notices));
    }
}

/// Sends flushes to the store one at a time until the session has nothing
/// queued.
pub async fn run_flush(
    ctx: AppContext,
    mut ticket: FlushTicket,
    mut session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
) {
    loop {
        let result: Result<_, StoreError> = ctx.store.save_file(ticket.request()).await;
        let next = session.with_mut(|s| {
            s.as_mut()
                .and_then(|s| s.complete_flush(ticket, result, Instant::now()))
        });
        publish_notices(session, notices);
        match next {
            Some(next) => ticket = next,
            None => break,
        }
    }
    schedule_wakeup(ctx, session, notices);
}

/// Moves session notices into the toast list and expires them after a few
/// seconds.
pub fn publish_notices(
    mut session: Signal<Option<EditSession>>,
    mut notices: Signal<Vec<Notice>>,
) {
    let fresh = session.with_mut(|s| {
        s.as_mut()
            .map(EditSession::take_notices)
            .unwrap_or_default()
    });
    if fresh.is_empty() {
        return;
    }
    let count = fresh.len();
    notices.with_mut(|list| list.extend(fresh));
    spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        notices.with_mut(|list| {
            let drain = count.min(list.len());
            list.drain(..drain);
        });
    });
}

pub async fn export_csv(
    session: Signal<Option<EditSession>>,
    mut error_message: Signal<Option<String>>,
) {
    let (file_name, columns, rows) = {
        let read = session.read();
        let Some(s) = read.as_ref() else {
            return;
        };
        (
            s.file_name().to_string(),
            s.export_columns(),
            s.edits().rows().to_vec(),
        )
    };

    let handle = rfd::AsyncFileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name(csv_export::export_file_name(&file_name))
        .save_file()
        .await;

    if let Some(handle) = handle {
        let path = handle.path().to_path_buf();
        match csv_export::save_csv(&path, &columns, &rows) {
            Ok(()) => {
                info!(path = %path.display(), rows = rows.len(), "exported CSV");
                error_message.set(None);
            }
            Err(err) => error_message.set(Some(err.to_string())),
        }
    }
}
