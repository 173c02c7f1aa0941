use crate::state::data_model::RowId;
use crate::state::grid::GridView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    Enter,
    Up,
    Down,
    Left,
    Right,
}

impl NavKey {
    /// Maps a DOM key name (`"Enter"`, `"ArrowUp"`, ...) to a navigation key.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Enter" => Some(Self::Enter),
            "ArrowUp" => Some(Self::Up),
            "ArrowDown" => Some(Self::Down),
            "ArrowLeft" => Some(Self::Left),
            "ArrowRight" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Focused editable cell, addressed by row identity and column name so it
/// survives re-sorting and column moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellCursor {
    pub row_id: RowId,
    pub column: String,
}

impl CellCursor {
    pub fn new(row_id: RowId, column: impl Into<String>) -> Self {
        Self {
            row_id,
            column: column.into(),
        }
    }
}

/// Adjacent rendered cell for `key`, or `None` when focus should stay put.
///
/// Adjacency is taken from the view as rendered: display row order and the
/// current column order with hidden columns removed. Landing on a pinned
/// non-editable column counts as no target.
pub fn navigate(view: &GridView, from: &CellCursor, key: NavKey) -> Option<CellCursor> {
    let row = view.row_position(&from.row_id)?;
    let col = view.column_position(&from.column)?;

    let (next_row, next_col) = match key {
        NavKey::Enter | NavKey::Down => (row.checked_add(1)?, col),
        NavKey::Up => (row.checked_sub(1)?, col),
        NavKey::Left => (row, col.checked_sub(1)?),
        NavKey::Right => (row, col.checked_add(1)?),
    };

    let target_row = view.rows.get(next_row)?;
    let column = view.columns.get(next_col)?.data_name()?;
    Some(CellCursor::new(target_row.row_id.clone(), column))
}
