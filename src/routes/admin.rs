use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Moderation endpoints over every user and entry. Nested under `/api/admin` and
/// wrapped in the admin layer; each handler also takes `AdminUser`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/stats
        .route("/stats", get(handlers::get_admin_stats))
        // GET /api/admin/entries
        .route("/entries", get(handlers::list_all_entries))
        // PUT/DELETE /api/admin/entries/{id}
        .route(
            "/entries/{id}",
            put(handlers::update_any_entry).delete(handlers::delete_any_entry),
        )
        // GET /api/admin/users
        .route("/users", get(handlers::list_users))
        // PUT/DELETE /api/admin/users/{id}
        // Deleting a user also deletes their entries.
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
}
