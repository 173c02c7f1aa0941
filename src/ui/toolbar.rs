use dioxus::prelude::*;

use crate::state::session::{EditSession, Notice, NoticeLevel};
use crate::ui::actions::{self, AppContext};

#[component]
pub fn Toolbar(
    session: Signal<Option<EditSession>>,
    notices: Signal<Vec<Notice>>,
    error_message: Signal<Option<String>>,
    filter_panel_open: Signal<bool>,
) -> Element {
    let mut session = session;
    let mut filter_panel_open = filter_panel_open;
    let ctx = use_context::<AppContext>();

    let Some(snapshot) = session.read().clone() else {
        return rsx! {
            div { class: "toolbar",
                if let Some(err) = error_message.read().as_ref() {
                    span { class: "error-message", id: "error-message", "{err}" }
                }
            }
        };
    };

    let file_name = snapshot.file_name().to_string();
    let row_count = snapshot.row_count();
    let dirty = snapshot.is_dirty();
    let saving = snapshot.is_saving();
    let active_filters = snapshot.grid().active_filter_count();
    let upload_date = snapshot.uploaded_at().format("%Y-%m-%d").to_string();
    let save_class = if dirty { "toolbar-btn unsaved" } else { "toolbar-btn" };
    let save_label = if saving { "Saving..." } else { "Save" };

    rsx! {
        div { class: "toolbar",
            div { class: "toolbar-group file-heading",
                input {
                    class: "file-name-input",
                    id: "input-file-name",
                    value: "{file_name}",
                    oninput: move |evt| {
                        let name = evt.value();
                        session.with_mut(|s| {
                            if let Some(s) = s {
                                s.rename_file(name);
                            }
                        });
                    },
                }
                p { class: "file-status",
                    "{row_count} rows"
                    if dirty {
                        span { class: "status-unsaved", " \u{2022} Unsaved changes" }
                    }
                    if saving {
                        span { class: "status-saving", " \u{2022} Saving..." }
                    }
                }
            }
            div { class: "toolbar-separator" }
            div { class: "toolbar-group file-meta",
                div {
                    p { class: "meta-label", "Original Name" }
                    p { class: "meta-value", "{snapshot.original_name()}" }
                }
                div {
                    p { class: "meta-label", "Batch Type" }
                    p { class: "meta-value", "{snapshot.batch_type().name}" }
                }
                div {
                    p { class: "meta-label", "Upload Date" }
                    p { class: "meta-value", "{upload_date}" }
                }
            }
            div { class: "toolbar-separator" }
            div { class: "toolbar-group",
                button {
                    class: "toolbar-btn",
                    id: "btn-filters",
                    onclick: move |_| {
                        let open = *filter_panel_open.read();
                        filter_panel_open.set(!open);
                    },
                    "Filters"
                    if active_filters > 0 {
                        span { class: "badge", "{active_filters}" }
                    }
                }
                ColumnVisibility { session }
                button {
                    class: "{save_class}",
                    id: "btn-save",
                    disabled: !dirty || saving,
                    onclick: {
                        let ctx = ctx.clone();
                        move |_| actions::save_now(ctx.clone(), session, notices)
                    },
                    "{save_label}"
                }
                button {
                    class: "toolbar-btn",
                    id: "btn-export",
                    onclick: move |_| {
                        spawn(actions::export_csv(session, error_message));
                    },
                    "Export CSV"
                }
            }
            if let Some(err) = error_message.read().as_ref() {
                span { class: "error-message", id: "error-message", "{err}" }
            }
            div { class: "notices",
                for notice in notices.read().iter() {
                    span {
                        class: match notice.level {
                            NoticeLevel::Success => "notice notice-success",
                            NoticeLevel::Error => "notice notice-error",
                        },
                        "{notice.message}"
                    }
                }
            }
        }
    }
}

#[component]
fn ColumnVisibility(session: Signal<Option<EditSession>>) -> Element {
    let mut session = session;
    let mut open = use_signal(|| false);

    let Some(snapshot) = session.read().clone() else {
        return rsx! {};
    };
    let grid = snapshot.grid();
    let columns = grid.columns().to_vec();
    let visible_count = grid.visible_count();
    let total = columns.len();

    rsx! {
        div { class: "column-visibility",
            button {
                class: "toolbar-btn",
                id: "btn-columns",
                onclick: move |_| {
                    let current = *open.read();
                    open.set(!current);
                },
                "Columns "
                span { class: "badge", "{visible_count}/{total}" }
            }
            if *open.read() {
                div { class: "dropdown",
                    div { class: "dropdown-header",
                        span { "{visible_count} of {total} visible" }
                        button {
                            class: "toolbar-btn",
                            disabled: visible_count == total,
                            onclick: move |_| session.with_mut(|s| {
                                if let Some(s) = s {
                                    s.grid_mut().set_all_visible(true);
                                }
                            }),
                            "Show All"
                        }
                        button {
                            class: "toolbar-btn",
                            disabled: visible_count == 0,
                            onclick: move |_| session.with_mut(|s| {
                                if let Some(s) = s {
                                    s.grid_mut().set_all_visible(false);
                                }
                            }),
                            "Hide All"
                        }
                    }
                    for column in columns {
                        {
                            let visible = grid.is_visible(&column);
                            let toggled = column.clone();
                            rsx! {
                                div {
                                    class: "dropdown-item",
                                    onclick: move |_| session.with_mut(|s| {
                                        if let Some(s) = s {
                                            s.grid_mut().set_visible(&toggled, !visible);
                                        }
                                    }),
                                    span { "{column}" }
                                    span { class: "visibility-icon",
                                        if visible { "\u{1F441}" } else { "\u{2014}" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn FilterPanel(
    session: Signal<Option<EditSession>>,
    filter_panel_open: Signal<bool>,
) -> Element {
    let mut session = session;
    let mut filter_panel_open = filter_panel_open;

    if !*filter_panel_open.read() {
        return rsx! {};
    }
    let Some(snapshot) = session.read().clone() else {
        return rsx! {};
    };
    let grid = snapshot.grid();
    let active = grid.active_filter_count();
    let footer = match active {
        0 => "No filters applied".to_string(),
        1 => "1 filter applied".to_string(),
        n => format!("{n} filters applied"),
    };

    rsx! {
        div { class: "filter-panel", id: "filter-panel",
            div { class: "filter-panel-header",
                h3 { "Filters" }
                button {
                    class: "toolbar-btn",
                    onclick: move |_| filter_panel_open.set(false),
                    "\u{2715}"
                }
            }
            if active > 0 {
                button {
                    class: "toolbar-btn",
                    id: "btn-clear-filters",
                    onclick: move |_| session.with_mut(|s| {
                        if let Some(s) = s {
                            s.grid_mut().clear_filters();
                        }
                    }),
                    "Clear All Filters"
                }
            }
            for column in grid.columns().iter().cloned() {
                {
                    let value = grid.filter(&column).to_string();
                    let input_column = column.clone();
                    let clear_column = column.clone();
                    rsx! {
                        div { class: "filter-field",
                            label { r#for: "filter-{column}", "{column}" }
                            input {
                                id: "filter-{column}",
                                placeholder: "Filter by {column}...",
                                value: "{value}",
                                oninput: move |evt| {
                                    let value = evt.value();
                                    session.with_mut(|s| {
                                        if let Some(s) = s {
                                            s.grid_mut().set_filter(&input_column, value);
                                        }
                                    });
                                },
                            }
                            if !value.is_empty() {
                                button {
                                    class: "filter-clear",
                                    onclick: move |_| session.with_mut(|s| {
                                        if let Some(s) = s {
                                            s.grid_mut().set_filter(&clear_column, String::new());
                                        }
                                    }),
                                    "\u{2715}"
                                }
                            }
                        }
                    }
                }
            }
            p { class: "filter-footer", "{footer}" }
        }
    }
}
