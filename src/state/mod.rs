pub mod cell_commit;
pub mod data_model;
pub mod edit_state;
pub mod flush;
pub mod grid;
pub mod navigation;
pub mod session;
pub mod viewport;
pub mod wakeup;
