//! Domain layer: dialogs, peers, folders and the rules that classify them.

pub mod chat_list;
pub mod dialog;
pub mod folder;
pub mod peer;
pub mod record;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
