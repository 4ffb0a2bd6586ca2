//! Use case layer: application workflows and orchestration.

pub mod bootstrap;
pub mod commands;
pub mod context;
pub mod contracts;
pub mod extract;
pub mod guided_auth;
pub mod match_rules;
pub mod menu;
pub mod resolve_folder;
pub mod resolve_names;
pub mod startup;
pub mod terminal;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
