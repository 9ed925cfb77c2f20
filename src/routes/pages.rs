use crate::AppState;
use axum::Router;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Top-level pages and the HTML file that backs each one.
const PAGES: &[(&str, &str)] = &[
    ("/", "index.html"),
    ("/login", "login.html"),
    ("/register", "register.html"),
    ("/dashboard", "dashboard.html"),
    ("/admin", "admin.html"),
];

/// Page Router Module
///
/// Serves the pre-built front-end from `site_dir`. Named pages map to their HTML
/// file; everything else (scripts, styles, nested pages) falls through to the
/// directory. Access control happens earlier, in the route gate.
pub fn page_routes(site_dir: &str) -> Router<AppState> {
    let site = Path::new(site_dir);

    PAGES
        .iter()
        .fold(Router::new(), |router, (route, file)| {
            router.route_service(route, ServeFile::new(site.join(file)))
        })
        .fallback_service(ServeDir::new(site).append_index_html_on_directories(true))
}
