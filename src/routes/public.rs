use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no session. Mounted under `/api`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /api/health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/user/create
        // Account registration. New accounts always get the 'user' role.
        .route("/user/create", post(handlers::register_user))
        // POST /api/user/login
        // Issues the session token and sets the `token` and `role` cookies.
        .route("/user/login", post(handlers::login))
        // POST /api/user/logout
        // Clears the session cookies. Works without a valid session.
        .route("/user/logout", post(handlers::logout))
}
