use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::state::data_model::{RowId, SnapshotRow};

pub const ROW_NUMBER_KEY: &str = "rowIndex";
pub const ACTIONS_KEY: &str = "actions";

/// A rendered column. The row-number and row-actions columns are pinned at
/// the left and right edges and cannot be moved, hidden, filtered or edited.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnId {
    RowNumber,
    Data(String),
    Actions,
}

impl ColumnId {
    pub fn key(&self) -> &str {
        match self {
            Self::RowNumber => ROW_NUMBER_KEY,
            Self::Data(name) => name,
            Self::Actions => ACTIONS_KEY,
        }
    }

    pub fn data_name(&self) -> Option<&str> {
        match self {
            Self::Data(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub order: SortOrder,
}

/// Presentation state of the grid: column order, sort, filters and
/// visibility. Never touches the snapshot it is applied to.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct GridState {
    columns: Vec<String>,
    column_order: Vec<String>,
    sort_spec: Option<SortSpec>,
    filters: BTreeMap<String, String>,
    hidden: BTreeSet<String>,
}

impl GridState {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            column_order: columns.clone(),
            columns,
            ..Self::default()
        }
    }

    /// Schema columns in their declared order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_order(&self) -> &[String] {
        &self.column_order
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort_spec.as_ref()
    }

    pub fn rendered_columns(&self) -> Vec<ColumnId> {
        let mut out = Vec::with_capacity(self.column_order.len() + 2);
        out.push(ColumnId::RowNumber);
        out.extend(
            self.column_order
                .iter()
                .filter(|col| self.is_visible(col))
                .cloned()
                .map(ColumnId::Data),
        );
        out.push(ColumnId::Actions);
        out
    }

    /// Drag-and-drop reorder: `dragged` takes the slot `target` occupied.
    pub fn move_column(&mut self, dragged: &str, target: &str) -> bool {
        if dragged == target {
            return false;
        }
        let Some(from) = self.column_order.iter().position(|c| c == dragged) else {
            return false;
        };
        let Some(to) = self.column_order.iter().position(|c| c == target) else {
            return false;
        };

        let moved = self.column_order.remove(from);
        self.column_order.insert(to, moved);
        true
    }

    /// Header click. Data columns cycle ascending, descending, unsorted; the
    /// row-number header clears sorting instead.
    pub fn toggle_sort(&mut self, column: &ColumnId) {
        let name = match column {
            ColumnId::RowNumber => {
                self.sort_spec = None;
                return;
            }
            ColumnId::Actions => return,
            ColumnId::Data(name) => name,
        };

        self.sort_spec = match self.sort_spec.as_ref() {
            Some(spec) if &spec.column == name => match spec.order {
                SortOrder::Asc => Some(SortSpec {
                    column: name.clone(),
                    order: SortOrder::Desc,
                }),
                SortOrder::Desc => None,
            },
            _ => Some(SortSpec {
                column: name.clone(),
                order: SortOrder::Asc,
            }),
        };
    }

    pub fn clear_sort(&mut self) {
        self.sort_spec = None;
    }

    pub fn filter(&self, column: &str) -> &str {
        self.filters.get(column).map(String::as_str).unwrap_or("")
    }

    /// An empty value removes the column's predicate.
    pub fn set_filter(&mut self, column: &str, value: String) {
        if value.is_empty() {
            self.filters.remove(column);
        } else {
            self.filters.insert(column.to_string(), value);
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn is_visible(&self, column: &str) -> bool {
        !self.hidden.contains(column)
    }

    pub fn set_visible(&mut self, column: &str, visible: bool) {
        if !self.columns.iter().any(|c| c == column) {
            return;
        }
        if visible {
            self.hidden.remove(column);
        } else {
            self.hidden.insert(column.to_string());
        }
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        if visible {
            self.hidden.clear();
        } else {
            self.hidden = self.columns.iter().cloned().collect();
        }
    }

    pub fn visible_count(&self) -> usize {
        self.columns.iter().filter(|c| self.is_visible(c)).count()
    }

    pub fn view(&self, rows: &[SnapshotRow]) -> GridView {
        let columns = self.rendered_columns();
        let data_columns: Vec<&str> = columns.iter().filter_map(ColumnId::data_name).collect();

        let mut matching: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| self.row_matches_filters(row).then_some(idx))
            .collect();

        if let Some(spec) = self.sort_spec.as_ref() {
            matching.sort_by(|a, b| {
                let ord = compare_alphanumeric(
                    rows[*a].value(&spec.column),
                    rows[*b].value(&spec.column),
                );
                match spec.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let display_rows = matching
            .into_iter()
            .enumerate()
            .map(|(display_index, snapshot_index)| {
                let row = &rows[snapshot_index];
                DisplayRow {
                    row_id: row.id.clone(),
                    snapshot_index,
                    display_index,
                    values: data_columns
                        .iter()
                        .map(|col| row.value(col).to_string())
                        .collect(),
                }
            })
            .collect();

        GridView {
            columns,
            rows: display_rows,
            total_rows: rows.len(),
        }
    }

    fn row_matches_filters(&self, row: &SnapshotRow) -> bool {
        self.filters
            .iter()
            .all(|(column, needle)| row.value(column).contains(needle.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayRow {
    pub row_id: RowId,
    pub snapshot_index: usize,
    pub display_index: usize,
    /// Cell text for each data column of the view, in rendered order.
    pub values: Vec<String>,
}

impl DisplayRow {
    pub fn row_number(&self) -> usize {
        self.display_index + 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridView {
    pub columns: Vec<ColumnId>,
    pub rows: Vec<DisplayRow>,
    pub total_rows: usize,
}

impl GridView {
    pub fn data_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(ColumnId::data_name)
    }

    pub fn row_position(&self, row_id: &RowId) -> Option<usize> {
        self.rows.iter().position(|row| &row.row_id == row_id)
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.data_name() == Some(column))
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        if self.total_rows == 0 {
            Some("No data available.")
        } else if self.rows.is_empty() {
            Some("No rows match the current filters.")
        } else {
            None
        }
    }
}

/// Case-insensitive natural ordering: digit runs compare numerically and
/// sort before text runs.
pub fn compare_alphanumeric(left: &str, right: &str) -> Ordering {
    let left = left.to_lowercase();
    let right = right.to_lowercase();
    let mut a = chunks(&left).into_iter();
    let mut b = chunks(&right).into_iter();

    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_chunk(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn chunks(value: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut prev_digit = None;
    for (idx, ch) in value.char_indices() {
        let digit = ch.is_ascii_digit();
        if prev_digit.is_some_and(|p| p != digit) {
            out.push(&value[start..idx]);
            start = idx;
        }
        prev_digit = Some(digit);
    }
    if start < value.len() {
        out.push(&value[start..]);
    }
    out
}

fn compare_chunk(a: &str, b: &str) -> Ordering {
    let a_num = a.starts_with(|c: char| c.is_ascii_digit());
    let b_num = b.starts_with(|c: char| c.is_ascii_digit());
    match (a_num, b_num) {
        (true, true) => compare_digit_runs(a, b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
