use axum::{
    Json, Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use serde_json::{Value, json};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod session;

// Routing segregated by caller (Public, Authenticated, Admin) plus the page host.
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, pages, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the `/api` surface, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login, handlers::logout, handlers::get_username,
        handlers::get_me, handlers::get_entries, handlers::create_entry, handlers::update_entry,
        handlers::delete_entry, handlers::list_all_entries, handlers::list_users,
        handlers::update_any_entry, handlers::delete_any_entry, handlers::update_user,
        handlers::delete_user, handlers::get_admin_stats
    ),
    components(
        schemas(
            models::User, models::Entry, models::CreateUserRequest, models::LoginRequest,
            models::LoginResponse, models::EntryPayload, models::UpdateEntryRequest,
            models::UpdateUserRequest, models::UsernameResponse, models::SessionProfile,
            models::MessageResponse, models::AdminStats,
        )
    ),
    tags(
        (name = "memory-journal", description = "Memory Journal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of application services and configuration,
/// cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: users and entries.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Route layer for the authenticated API routes. Extracting `AuthUser` rejects the
/// request with 401 before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Route layer for the admin API routes: 401 without a valid token, 403 for
/// non-admin sessions.
async fn admin_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// ping
///
/// Connectivity check used by the front-end to detect a missing backend.
async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

/// create_router
///
/// Assembles the full routing tree: API under `/api`, documentation, and the page
/// host, all behind the route gate and the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: one credentialed origin (the front-end dev server by default).
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(12 * 60 * 60));

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. API Router Assembly
    let api_router = Router::new()
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        );

    let site_dir = state.config.site_dir.clone();

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/ping", get(ping))
        .nest("/api", api_router)
        // Pages last: the page router owns the static fallback.
        .merge(pages::page_routes(&site_dir))
        .with_state(state);

    // 3. Route gate, then observability (outermost), then CORS.
    base_router
        .layer(middleware::from_fn(gate::page_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the `x-request-id` so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
