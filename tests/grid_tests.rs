mod common;

use std::cmp::Ordering;

use csvgrid::config::RefetchPolicy;
use csvgrid::state::edit_state::EditState;
use csvgrid::state::grid::{compare_alphanumeric, ColumnId, GridState, SortOrder, SortSpec};

use common::{row, sample_file, session};

fn grid() -> GridState {
    GridState::new(vec!["Name".to_string(), "Qty".to_string(), "City".to_string()])
}

fn data(name: &str) -> ColumnId {
    ColumnId::Data(name.to_string())
}

fn names(state: &GridState, edits: &EditState) -> Vec<String> {
    state
        .view(edits.rows())
        .rows
        .iter()
        .map(|r| r.values[0].clone())
        .collect()
}

#[test]
fn test_rendered_columns_pin_synthetic_columns() {
    let cols = grid().rendered_columns();
    assert_eq!(cols.first(), Some(&ColumnId::RowNumber));
    assert_eq!(cols.last(), Some(&ColumnId::Actions));
    assert_eq!(cols.len(), 5);
    assert_eq!(cols[0].key(), "rowIndex");
    assert_eq!(cols[4].key(), "actions");
}

#[test]
fn test_row_numbers_follow_display_order() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();
    state.set_filter("City", "Oslo".to_string());

    let view = state.view(edits.rows());
    let numbered: Vec<_> = view
        .rows
        .iter()
        .map(|r| (r.values[0].clone(), r.row_number()))
        .collect();
    assert_eq!(numbered, vec![("A".to_string(), 1), ("C".to_string(), 2)]);
    assert_eq!(view.rows[1].snapshot_index, 2);
}

#[test]
fn test_filters_are_anded_substring_matches() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();
    state.set_filter("City", "sl".to_string());
    state.set_filter("Qty", "7".to_string());
    assert_eq!(names(&state, &edits), vec!["C"]);
    assert_eq!(state.active_filter_count(), 2);
}

#[test]
fn test_filter_is_case_sensitive() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();
    state.set_filter("City", "oslo".to_string());
    let view = state.view(edits.rows());
    assert!(view.rows.is_empty());
    assert_eq!(view.empty_message(), Some("No rows match the current filters."));
}

#[test]
fn test_empty_filter_removes_predicate() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();
    state.set_filter("City", "Bergen".to_string());
    state.set_filter("City", String::new());
    assert_eq!(state.active_filter_count(), 0);
    assert_eq!(state.filter("City"), "");
    assert_eq!(names(&state, &edits), vec!["A", "B", "C"]);
}

#[test]
fn test_clear_filters() {
    let mut state = grid();
    state.set_filter("City", "Oslo".to_string());
    state.set_filter("Name", "A".to_string());
    state.clear_filters();
    assert_eq!(state.active_filter_count(), 0);
}

#[test]
fn test_sort_cycles_asc_desc_none() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();

    state.toggle_sort(&data("Qty"));
    assert_eq!(
        state.sort_spec(),
        Some(&SortSpec {
            column: "Qty".to_string(),
            order: SortOrder::Asc
        })
    );
    assert_eq!(names(&state, &edits), vec!["B", "C", "A"]);

    state.toggle_sort(&data("Qty"));
    assert_eq!(names(&state, &edits), vec!["A", "C", "B"]);

    state.toggle_sort(&data("Qty"));
    assert!(state.sort_spec().is_none());
    assert_eq!(names(&state, &edits), vec!["A", "B", "C"]);
}

#[test]
fn test_sort_other_column_restarts_ascending() {
    let mut state = grid();
    state.toggle_sort(&data("Qty"));
    state.toggle_sort(&data("Qty"));
    state.toggle_sort(&data("City"));
    let spec = state.sort_spec().unwrap();
    assert_eq!(spec.column, "City");
    assert_eq!(spec.order, SortOrder::Asc);
}

#[test]
fn test_row_number_header_clears_sort() {
    let mut state = grid();
    state.toggle_sort(&data("Name"));
    state.toggle_sort(&ColumnId::RowNumber);
    assert!(state.sort_spec().is_none());

    state.toggle_sort(&ColumnId::Actions);
    assert!(state.sort_spec().is_none());
}

#[test]
fn test_sort_is_stable_for_equal_keys() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();
    state.toggle_sort(&data("City"));
    assert_eq!(names(&state, &edits), vec!["B", "A", "C"]);
}

#[test]
fn test_move_column_takes_target_slot() {
    let mut state = grid();
    assert!(state.move_column("City", "Name"));
    assert_eq!(state.column_order(), ["City", "Name", "Qty"]);

    assert!(state.move_column("City", "Qty"));
    assert_eq!(state.column_order(), ["Name", "Qty", "City"]);

    assert!(!state.move_column("Name", "Name"));
    assert!(!state.move_column("rowIndex", "Name"));
    assert_eq!(state.columns(), ["Name", "Qty", "City"]);
}

#[test]
fn test_view_values_follow_column_order() {
    let edits = EditState::from_file(&sample_file());
    let mut state = grid();
    state.move_column("City", "Name");
    let view = state.view(edits.rows());
    assert_eq!(view.rows[0].values, vec!["Oslo", "A", "10"]);
}

#[test]
fn test_hidden_columns_leave_view_and_not_diff() {
    let mut s = session(RefetchPolicy::Reseed);
    s.grid_mut().set_visible("City", false);

    let view = s.view();
    assert_eq!(view.data_columns().collect::<Vec<_>>(), vec!["Name", "Qty"]);
    assert_eq!(s.export_columns(), vec!["Name", "Qty"]);

    let diff = s.edits().diff_against_baseline();
    assert_eq!(diff.updated_rows[0].row_data["City"], "Oslo");
}

#[test]
fn test_visibility_show_hide_all() {
    let mut state = grid();
    state.set_all_visible(false);
    assert_eq!(state.visible_count(), 0);
    assert_eq!(state.rendered_columns().len(), 2);

    state.set_all_visible(true);
    assert_eq!(state.visible_count(), 3);

    state.set_visible("Unknown", false);
    assert_eq!(state.visible_count(), 3);
}

#[test]
fn test_filter_and_sort_leave_snapshot_untouched() {
    let mut s = session(RefetchPolicy::Reseed);
    s.grid_mut().set_filter("City", "Oslo".to_string());
    s.grid_mut().toggle_sort(&data("Name"));
    s.grid_mut().toggle_sort(&data("Name"));

    assert!(!s.is_dirty());
    let ids: Vec<_> = s.edits().rows().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![row("r1"), row("r2"), row("r3")]);
}

#[test]
fn test_empty_file_message() {
    let mut file = sample_file();
    file.rows.clear();
    let edits = EditState::from_file(&file);
    let view = grid().view(edits.rows());
    assert_eq!(view.empty_message(), Some("No data available."));
}

#[test]
fn test_alphanumeric_ordering() {
    assert_eq!(compare_alphanumeric("item2", "item10"), Ordering::Less);
    assert_eq!(compare_alphanumeric("Apple", "apple"), Ordering::Equal);
    assert_eq!(compare_alphanumeric("007", "7"), Ordering::Equal);
    assert_eq!(compare_alphanumeric("9", "a"), Ordering::Less);
    assert_eq!(compare_alphanumeric("", "a"), Ordering::Less);
    assert_eq!(compare_alphanumeric("b", "A"), Ordering::Greater);
}
