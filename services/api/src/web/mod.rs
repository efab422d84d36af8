pub mod rest;
pub mod state;

// Re-export the handlers so the binary can build the router without
// reaching into the module tree.
pub use rest::{
    chat_handler, delete_history_handler, get_history_handler, list_sessions_handler,
    upload_handler,
};
