pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub use repo_types::{Role, User};
pub use store::UserStore;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}

/// Emails are stored and compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
