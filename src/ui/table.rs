use dioxus::prelude::{Key, *};
use std::rc::Rc;
use std::time::Instant;

use crate::state::data_model::RowId;
use crate::state::grid::{ColumnId, DisplayRow, SortOrder, SortSpec};
use crate::state::navigation::{CellCursor, NavKey};
use crate::state::session::{EditSession, Notice};
use crate::state::viewport;
use crate::ui::actions::{self, AppContext};

#[component]
pub fn Table(session: Signal<Option<EditSession>>, notices: Signal<Vec<Notice>>) -> Element {
    let mut session = session;
    let dragged_column = use_signal::<Option<String>>(|| None);
    let mut container_el = use_signal::<Option<Rc<MountedData>>>(|| None);
    let mut content_el = use_signal::<Option<Rc<MountedData>>>(|| None);

    let Some(snapshot) = session.read().clone() else {
        return rsx! {
            p { class: "empty-message", id: "empty-message", "No file loaded." }
        };
    };
    let view = snapshot.view();
    let sort_spec = snapshot.grid().sort_spec().cloned();
    let cursor = snapshot.cursor().cloned();
    let transform = snapshot.viewport().transform_style();
    let empty_message = view.empty_message();

    rsx! {
        div {
            class: "table-container",
            id: "table-container",
            onmounted: move |evt| container_el.set(Some(evt.data())),
            onwheel: move |evt| {
                if !evt.modifiers().ctrl() {
                    return;
                }
                evt.prevent_default();
                let delta_y = evt.delta().strip_units().y;
                spawn(async move {
                    let min = measured_min_scale(container_el, content_el).await;
                    session.with_mut(|s| {
                        if let Some(s) = s {
                            s.viewport_mut().wheel(delta_y, true, min);
                        }
                    });
                });
            },
            onmousedown: move |evt| {
                let point = evt.client_coordinates();
                session.with_mut(|s| {
                    if let Some(s) = s {
                        s.viewport_mut().begin_drag(point.x, point.y);
                    }
                });
            },
            onmousemove: move |evt| {
                let dragging = session
                    .read()
                    .as_ref()
                    .is_some_and(|s| s.viewport().is_dragging());
                if dragging {
                    let point = evt.client_coordinates();
                    session.with_mut(|s| {
                        if let Some(s) = s {
                            s.viewport_mut().drag_to(point.x, point.y);
                        }
                    });
                }
            },
            onmouseup: move |_| end_drag(session),
            onmouseleave: move |_| end_drag(session),
            div {
                class: "table-content",
                style: "{transform}",
                onmounted: move |evt| content_el.set(Some(evt.data())),
                table {
                    thead {
                        tr {
                            for col in view.columns.iter().cloned() {
                                HeaderCell {
                                    column: col,
                                    sort_spec: sort_spec.clone(),
                                    session,
                                    dragged_column,
                                }
                            }
                        }
                    }
                    tbody {
                        for row in view.rows.iter().cloned() {
                            GridRow {
                                key: "{row.row_id}",
                                row,
                                columns: view.columns.clone(),
                                cursor: cursor.clone(),
                                session,
                                notices,
                            }
                        }
                    }
                }
                if let Some(message) = empty_message {
                    div { class: "empty-message", "{message}" }
                }
            }
        }
        div { class: "zoom-controls",
            button {
                class: "zoom-btn",
                id: "btn-zoom-in",
                onclick: move |_| session.with_mut(|s| {
                    if let Some(s) = s {
                        s.viewport_mut().zoom_in();
                    }
                }),
                "+"
            }
            button {
                class: "zoom-btn",
                id: "btn-zoom-out",
                onclick: move |_| {
                    spawn(async move {
                        let min = measured_min_scale(container_el, content_el).await;
                        session.with_mut(|s| {
                            if let Some(s) = s {
                                s.viewport_mut().zoom_out(min);
                            }
                        });
                    });
                },
                "-"
            }
            button {
                class: "zoom-btn",
                id: "btn-zoom-reset",
                onclick: move |_| session.with_mut(|s| {
                    if let Some(s) = s {
                        s.viewport_mut().reset_zoom();
                    }
                }),
                "R"
            }
        }
    }
}

#[component]
fn HeaderCell(
    column: ColumnId,
    sort_spec: Option<SortSpec>,
    session: Signal<Option<EditSession>>,
    dragged_column: Signal<Option<String>>,
) -> Element {
    let mut session = session;
    let mut dragged_column = dragged_column;
    let label = match &column {
        ColumnId::RowNumber => "Sl. No.".to_string(),
        ColumnId::Data(name) => name.clone(),
        ColumnId::Actions => String::new(),
    };
    let movable = column.is_editable();
    let header_class = if movable {
        "header-cell movable"
    } else {
        "header-cell"
    };
    let indicator = match (&column, sort_spec.as_ref()) {
        (ColumnId::Data(name), Some(spec)) if &spec.column == name => match spec.order {
            SortOrder::Asc => "\u{2191}",
            SortOrder::Desc => "\u{2193}",
        },
        (ColumnId::Data(_), _) => "\u{2195}",
        _ => "",
    };

    let drag_start_column = column.clone();
    let drop_column = column.clone();
    let sort_column = column.clone();

    rsx! {
        th {
            class: "{header_class}",
            id: format!("col-{}", sanitize_id(column.key())),
            draggable: movable,
            ondragstart: move |_| {
                if let Some(name) = drag_start_column.data_name() {
                    dragged_column.set(Some(name.to_string()));
                }
            },
            ondragover: move |evt| evt.prevent_default(),
            ondrop: move |evt| {
                evt.prevent_default();
                let dragged = dragged_column.write().take();
                if let (Some(dragged), Some(target)) = (dragged, drop_column.data_name()) {
                    session.with_mut(|s| {
                        if let Some(s) = s {
                            s.grid_mut().move_column(&dragged, target);
                        }
                    });
                }
            },
            span {
                class: "header-label",
                onclick: move |_| session.with_mut(|s| {
                    if let Some(s) = s {
                        s.grid_mut().toggle_sort(&sort_column);
                    }
                }),
                "{label} {indicator}"
            }
        }
    }
}

#[component]
fn GridRow(
    row: DisplayRow,
    columns: Vec<ColumnId>,
    cursor: Option<CellCursor>,
    session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
) -> Element {
    let mut session = session;
    let ctx = use_context::<AppContext>();
    let row_class = if row.display_index % 2 == 0 { "even" } else { "odd" };

    let mut values = row.values.iter();
    let cells: Vec<(ColumnId, String)> = columns
        .iter()
        .map(|col| {
            let value = if col.is_editable() {
                values.next().cloned().unwrap_or_default()
            } else {
                String::new()
            };
            (col.clone(), value)
        })
        .collect();

    rsx! {
        tr { class: "{row_class}", id: format!("row-{}", sanitize_id(row.row_id.as_str())),
            for (col, value) in cells {
                {match col {
                    ColumnId::RowNumber => rsx! {
                        td { class: "row-number", "{row.row_number()}" }
                    },
                    ColumnId::Actions => {
                        let row_id = row.row_id.clone();
                        let ctx = ctx.clone();
                        rsx! {
                            td { class: "row-actions",
                                button {
                                    class: "delete-row-btn",
                                    onclick: move |_| {
                                        session.with_mut(|s| {
                                            if let Some(s) = s {
                                                s.delete_row(&row_id);
                                            }
                                        });
                                        actions::publish_notices(session, notices);
                                        actions::schedule_wakeup(ctx.clone(), session, notices);
                                    },
                                    "\u{1F5D1}"
                                }
                            }
                        }
                    }
                    ColumnId::Data(name) => {
                        let editing = cursor
                            .as_ref()
                            .is_some_and(|c| c.row_id == row.row_id && c.column == name);
                        rsx! {
                            EditableCell {
                                row_id: row.row_id.clone(),
                                column: name,
                                value,
                                editing,
                                session,
                                notices,
                            }
                        }
                    }
                }}
            }
        }
    }
}

#[component]
fn EditableCell(
    row_id: RowId,
    column: String,
    value: String,
    editing: bool,
    session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
) -> Element {
    let mut session = session;
    let ctx = use_context::<AppContext>();
    let cell_id = format!("cell-{}-{}", sanitize_id(row_id.as_str()), sanitize_id(&column));

    if !editing {
        let focus_row = row_id.clone();
        let focus_column = column.clone();
        return rsx! {
            td {
                class: "cell",
                id: "{cell_id}",
                onclick: move |_| session.with_mut(|s| {
                    if let Some(s) = s {
                        s.focus_cell(CellCursor::new(focus_row.clone(), focus_column.clone()));
                    }
                }),
                "{value}"
            }
        };
    }

    let draft = session
        .read()
        .as_ref()
        .map(|s| s.cell_display(&row_id, &column))
        .unwrap_or(value);

    let input_row = row_id.clone();
    let input_column = column.clone();
    let input_ctx = ctx.clone();
    let key_ctx = ctx.clone();
    let escape_row = row_id.clone();
    let escape_column = column.clone();
    let blur_ctx = ctx.clone();

    rsx! {
        td { class: "editing-cell",
            input {
                class: "cell-input",
                id: "{cell_id}-input",
                value: "{draft}",
                autofocus: true,
                oninput: move |evt| {
                    let value = evt.value();
                    session.with_mut(|s| {
                        if let Some(s) = s {
                            s.type_into_cell(&input_row, &input_column, value, Instant::now());
                        }
                    });
                    actions::schedule_wakeup(input_ctx.clone(), session, notices);
                },
                onkeydown: move |evt| {
                    let key = evt.key();
                    if key == Key::Escape {
                        session.with_mut(|s| {
                            if let Some(s) = s {
                                s.blur_cell(&escape_row, &escape_column, Instant::now());
                            }
                        });
                        actions::schedule_wakeup(key_ctx.clone(), session, notices);
                        return;
                    }
                    let Some(nav) = NavKey::from_key_name(&key.to_string()) else {
                        return;
                    };
                    evt.prevent_default();
                    session.with_mut(|s| {
                        if let Some(s) = s {
                            s.handle_key(nav, Instant::now());
                        }
                    });
                    actions::schedule_wakeup(key_ctx.clone(), session, notices);
                },
                onblur: move |_| {
                    session.with_mut(|s| {
                        if let Some(s) = s {
                            s.blur_cell(&row_id, &column, Instant::now());
                        }
                    });
                    actions::schedule_wakeup(blur_ctx.clone(), session, notices);
                },
            }
        }
    }
}

/// Lower zoom bound from the container's visible width and the table's
/// unscaled width. Falls back when either element is not mounted yet.
async fn measured_min_scale(
    container: Signal<Option<Rc<MountedData>>>,
    content: Signal<Option<Rc<MountedData>>>,
) -> f64 {
    let container = container.read().clone();
    let content = content.read().clone();
    let container_width = match container {
        Some(el) => el.get_client_rect().await.ok().map(|rect| rect.width()),
        None => None,
    };
    let content_width = match content {
        Some(el) => el.get_scroll_size().await.ok().map(|size| size.width),
        None => None,
    };
    viewport::min_scale(container_width, content_width)
}

fn end_drag(mut session: Signal<Option<EditSession>>) {
    session.with_mut(|s| {
        if let Some(s) = s {
            s.viewport_mut().end_drag();
        }
    });
}

fn sanitize_id(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}
