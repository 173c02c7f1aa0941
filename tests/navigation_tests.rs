mod common;

use csvgrid::config::RefetchPolicy;
use csvgrid::state::grid::ColumnId;
use csvgrid::state::navigation::{navigate, CellCursor, NavKey};

use common::{ms, row, session, start};

fn at(id: &str, column: &str) -> CellCursor {
    CellCursor::new(row(id), column)
}

#[test]
fn test_key_names() {
    assert_eq!(NavKey::from_key_name("Enter"), Some(NavKey::Enter));
    assert_eq!(NavKey::from_key_name("ArrowLeft"), Some(NavKey::Left));
    assert_eq!(NavKey::from_key_name("Tab"), None);
}

#[test]
fn test_enter_and_down_move_to_next_row() {
    let s = session(RefetchPolicy::Reseed);
    let view = s.view();
    assert_eq!(navigate(&view, &at("r1", "Qty"), NavKey::Enter), Some(at("r2", "Qty")));
    assert_eq!(navigate(&view, &at("r2", "Qty"), NavKey::Down), Some(at("r3", "Qty")));
    assert_eq!(navigate(&view, &at("r3", "Qty"), NavKey::Down), None);
}

#[test]
fn test_up_at_first_row_stays() {
    let s = session(RefetchPolicy::Reseed);
    let view = s.view();
    assert_eq!(navigate(&view, &at("r1", "Name"), NavKey::Up), None);
    assert_eq!(navigate(&view, &at("r2", "Name"), NavKey::Up), Some(at("r1", "Name")));
}

#[test]
fn test_left_right_stop_at_synthetic_columns() {
    let s = session(RefetchPolicy::Reseed);
    let view = s.view();
    assert_eq!(navigate(&view, &at("r1", "Name"), NavKey::Left), None);
    assert_eq!(navigate(&view, &at("r1", "City"), NavKey::Right), None);
    assert_eq!(navigate(&view, &at("r1", "Name"), NavKey::Right), Some(at("r1", "Qty")));
}

#[test]
fn test_navigation_follows_sorted_and_filtered_view() {
    let mut s = session(RefetchPolicy::Reseed);
    s.grid_mut().toggle_sort(&ColumnId::Data("Qty".to_string()));
    let view = s.view();
    // Qty ascending: B(2), C(7), A(10)
    assert_eq!(navigate(&view, &at("r2", "Name"), NavKey::Down), Some(at("r3", "Name")));

    s.grid_mut().clear_sort();
    s.grid_mut().set_filter("City", "Oslo".to_string());
    let view = s.view();
    assert_eq!(navigate(&view, &at("r1", "Name"), NavKey::Down), Some(at("r3", "Name")));
    assert_eq!(navigate(&view, &at("r2", "Name"), NavKey::Down), None);
}

#[test]
fn test_navigation_skips_hidden_columns() {
    let mut s = session(RefetchPolicy::Reseed);
    s.grid_mut().set_visible("Qty", false);
    let view = s.view();
    assert_eq!(navigate(&view, &at("r1", "Name"), NavKey::Right), Some(at("r1", "City")));
}

#[test]
fn test_handle_key_commits_draft_then_moves() {
    let t0 = start();
    let mut s = session(RefetchPolicy::Reseed);
    s.type_into_cell(&row("r1"), "Name", "Alpha".to_string(), t0);

    assert!(s.handle_key(NavKey::Enter, t0 + ms(10)));
    assert_eq!(s.cursor(), Some(&at("r2", "Name")));
    assert_eq!(s.edits().cell_value(&row("r1"), "Name"), Some("Alpha"));
    assert!(s.is_dirty());

    s.blur_cell(&row("r1"), "Name", t0 + ms(20));
    assert_eq!(s.cursor(), Some(&at("r2", "Name")));
}

#[test]
fn test_handle_key_without_target_still_commits() {
    let t0 = start();
    let mut s = session(RefetchPolicy::Reseed);
    s.type_into_cell(&row("r3"), "City", "Molde".to_string(), t0);

    assert!(!s.handle_key(NavKey::Down, t0 + ms(10)));
    assert_eq!(s.cursor(), Some(&at("r3", "City")));
    assert_eq!(s.edits().cell_value(&row("r3"), "City"), Some("Molde"));
}

#[test]
fn test_deleting_focused_row_clears_cursor() {
    let mut s = session(RefetchPolicy::Reseed);
    s.focus_cell(at("r2", "Name"));
    s.delete_row(&row("r2"));
    assert!(s.cursor().is_none());
}
