use dioxus::prelude::*;
use std::path::PathBuf;

use tracing::error;

use crate::config::GridConfig;
use crate::io::json_store::JsonFileStore;
use crate::state::data_model::{BatchTypeId, FileId};
use crate::state::session::{EditSession, Notice};
use crate::ui::actions::{self, AppContext};
use crate::ui::table::Table;
use crate::ui::toolbar::{FilterPanel, Toolbar};

const STYLES: Asset = asset!("/assets/styles.css");

pub const OPEN_ENV: &str = "CSVGRID_OPEN";
pub const IMPORT_ENV: &str = "CSVGRID_IMPORT";
pub const BATCH_TYPE_ENV: &str = "CSVGRID_BATCH_TYPE";

#[component]
pub fn App() -> Element {
    let (ctx, startup_error) = use_hook(|| {
        let (config, startup_error) = match GridConfig::load() {
            Ok(config) => (config, None),
            Err(err) => {
                error!(error = %err, "failed to load config, using defaults");
                (GridConfig::default(), Some(err.to_string()))
            }
        };
        let store = JsonFileStore::new(config.store_path.clone(), config.user_id());
        (AppContext::new(config, store), startup_error)
    });
    use_context_provider(|| ctx.clone());

    let mut session = use_signal::<Option<EditSession>>(|| None);
    let error_message = use_signal::<Option<String>>(|| None);
    let notices = use_signal::<Vec<Notice>>(Vec::new);
    let filter_panel_open = use_signal(|| false);

    use_effect({
        let ctx = ctx.clone();
        let mut error_message = error_message;
        move || {
            if let Some(err) = startup_error.clone() {
                error_message.set(Some(err));
            }
            if let Ok(id) = std::env::var(OPEN_ENV) {
                spawn(actions::open_file(
                    ctx.clone(),
                    FileId::new(id),
                    session,
                    error_message,
                ));
            } else if let Ok(path) = std::env::var(IMPORT_ENV) {
                let Ok(batch_type) = std::env::var(BATCH_TYPE_ENV) else {
                    error_message.set(Some(format!("{BATCH_TYPE_ENV} must be set to import")));
                    return;
                };
                spawn(actions::import_and_open(
                    ctx.clone(),
                    PathBuf::from(path),
                    BatchTypeId::new(batch_type),
                    session,
                    error_message,
                ));
            }
        }
    });

    use_drop(move || {
        session.with_mut(|s| {
            if let Some(s) = s {
                s.teardown();
            }
        });
    });

    rsx! {
        document::Stylesheet { href: STYLES }
        div { class: "app",
            Toolbar { session, notices, error_message, filter_panel_open }
            div { class: "workspace",
                FilterPanel { session, filter_panel_open }
                div { class: "grid-area",
                    Table { session, notices }
                }
            }
        }
    }
}
