mod common;

use csvgrid::config::{GridConfig, RefetchPolicy};
use csvgrid::io::csv_import;
use csvgrid::io::store::{FileStore, MemoryStore, StoreError};
use csvgrid::state::data_model::FileId;
use csvgrid::state::navigation::NavKey;
use csvgrid::state::session::{EditSession, FlushTicket, NoticeLevel};

use common::{batch_type, ms, row, sample_store, start, AUTOSAVE, CELL_COMMIT};

/// Drives flushes against the store until the session has nothing queued.
async fn run_flush(
    store: &MemoryStore,
    session: &mut EditSession,
    mut ticket: FlushTicket,
    now: std::time::Instant,
) {
    loop {
        let result = store.save_file(ticket.request()).await;
        match session.complete_flush(ticket, result, now) {
            Some(next) => ticket = next,
            None => break,
        }
    }
}

async fn open(store: &MemoryStore, policy: RefetchPolicy) -> EditSession {
    let file = store.fetch_file(&FileId::new("file-1")).await.unwrap();
    let config = GridConfig {
        refetch_policy: policy,
        ..GridConfig::default()
    };
    EditSession::open(&file, &config)
}

#[tokio::test]
async fn test_e2e_type_navigate_autosave_and_refetch() {
    let store = sample_store();
    let mut session = open(&store, RefetchPolicy::Reseed).await;
    let t0 = start();

    session.focus_cell(csvgrid::state::navigation::CellCursor::new(row("r1"), "Qty"));
    session.type_into_cell(&row("r1"), "Qty", "11".to_string(), t0);
    session.handle_key(NavKey::Down, t0 + ms(100));
    session.type_into_cell(&row("r2"), "Qty", "3".to_string(), t0 + ms(200));
    assert!(session.poll(t0 + ms(200) + CELL_COMMIT).is_none());

    let due = session.next_wakeup().unwrap();
    assert_eq!(due, t0 + ms(200) + CELL_COMMIT + AUTOSAVE);
    let ticket = session.poll(due).unwrap();
    run_flush(&store, &mut session, ticket, due + ms(10)).await;

    assert!(!session.is_dirty());
    let stored = store.fetch_file(&FileId::new("file-1")).await.unwrap();
    assert_eq!(stored.rows[0].row_data["Qty"], "11");
    assert_eq!(stored.rows[1].row_data["Qty"], "3");
    assert_eq!(session.edits().cell_value(&row("r2"), "Qty"), Some("3"));
    assert_eq!(store.saves().len(), 1);
}

#[tokio::test]
async fn test_e2e_delete_rename_and_manual_save() {
    let store = sample_store();
    let mut session = open(&store, RefetchPolicy::Reseed).await;
    let t0 = start();

    session.delete_row(&row("r1"));
    session.rename_file("shipments-q2".to_string());
    let ticket = session.request_save(t0).unwrap();
    run_flush(&store, &mut session, ticket, t0 + ms(5)).await;

    let stored = store.fetch_file(&FileId::new("file-1")).await.unwrap();
    assert_eq!(stored.file_name, "shipments-q2");
    assert_eq!(stored.row_count, 2);
    let orders: Vec<_> = stored.rows.iter().map(|r| (r.id.clone(), r.sort_order)).collect();
    assert_eq!(orders, vec![(row("r2"), 0), (row("r3"), 1)]);

    let messages: Vec<_> = session
        .take_notices()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, vec!["Row deleted", "Changes saved successfully"]);
    assert_eq!(session.row_count(), 2);
}

#[tokio::test]
async fn test_e2e_failed_save_keeps_edits_for_next_attempt() {
    let store = sample_store();
    let mut session = open(&store, RefetchPolicy::Reseed).await;
    let t0 = start();

    store.fail_next_save(StoreError::Network("offline".to_string()));
    session.set_cell_value(&row("r3"), "City", "Tromso".to_string(), t0);
    let ticket = session.poll(t0 + AUTOSAVE).unwrap();
    run_flush(&store, &mut session, ticket, t0 + ms(2100)).await;

    assert!(session.is_dirty());
    let notices = session.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Error);
    let stored = store.fetch_file(&FileId::new("file-1")).await.unwrap();
    assert_eq!(stored.rows[2].row_data["City"], "Oslo");

    let ticket = session.request_save(t0 + ms(3000)).unwrap();
    run_flush(&store, &mut session, ticket, t0 + ms(3100)).await;
    assert!(!session.is_dirty());
    let stored = store.fetch_file(&FileId::new("file-1")).await.unwrap();
    assert_eq!(stored.rows[2].row_data["City"], "Tromso");
}

#[tokio::test]
async fn test_e2e_presentation_state_never_reaches_store() {
    let store = sample_store();
    let mut session = open(&store, RefetchPolicy::Reseed).await;
    let t0 = start();

    session.grid_mut().move_column("City", "Name");
    session.grid_mut().set_visible("Qty", false);
    session
        .grid_mut()
        .toggle_sort(&csvgrid::state::grid::ColumnId::Data("Name".to_string()));
    session.grid_mut().set_filter("City", "Oslo".to_string());
    assert!(!session.is_dirty());
    assert!(session.request_save(t0).is_some());

    session.teardown();
    let reopened = open(&store, RefetchPolicy::Reseed).await;
    assert_eq!(reopened.grid().column_order(), ["Name", "Qty", "City"]);
    assert_eq!(reopened.row_count(), 3);
}

#[tokio::test]
async fn test_e2e_import_then_edit() {
    let store = sample_store();
    let request = csv_import::parse_import(
        "Name,Qty\nWidget,4\nGadget,9\n",
        &batch_type(),
        "inventory",
        "inventory.csv",
    )
    .unwrap();
    let created = store.create_file(&request).await.unwrap();

    let file = store.fetch_file(&created.id).await.unwrap();
    let mut session = EditSession::open(&file, &GridConfig::default());
    assert_eq!(session.row_count(), 2);
    assert_eq!(session.original_name(), "inventory.csv");

    let t0 = start();
    let second = file.rows[1].id.clone();
    session.set_cell_value(&second, "Qty", "10".to_string(), t0);
    let ticket = session.poll(t0 + AUTOSAVE).unwrap();
    run_flush(&store, &mut session, ticket, t0 + ms(2050)).await;

    let stored = store.fetch_file(&created.id).await.unwrap();
    assert_eq!(stored.rows[1].row_data["Qty"], "10");
    assert_eq!(stored.rows[1].id, second);
}
