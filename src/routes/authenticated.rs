use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any signed-in user. Every handler takes `AuthUser`, so the entry
/// queries are always scoped to the caller's own id.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/user/getusername
        .route("/user/getusername", post(handlers::get_username))
        // GET /api/user/me
        .route("/user/me", get(handlers::get_me))
        // GET/POST /api/user/entries
        // Lists the caller's entries (newest first) or creates a new one.
        .route(
            "/user/entries",
            get(handlers::get_entries).post(handlers::create_entry),
        )
        // PUT/DELETE /api/user/entries/{id}
        // Owner-Only: foreign entries answer 404.
        .route(
            "/user/entries/{id}",
            put(handlers::update_entry).delete(handlers::delete_entry),
        )
}
