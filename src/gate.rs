//! Route access gate.
//!
//! Runs in front of every request and decides whether a page navigation may go
//! through or must be redirected. The decision only looks at the path and the
//! `token` / `role` cookies; it never validates the token itself. Signature and
//! expiry checks belong to the API extractors in [`crate::auth`].

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use percent_encoding::percent_decode_str;

use crate::{error::ApiError, session};

/// Paths that are never gated, matched by prefix.
const PASSTHROUGH_PREFIXES: &[&str] = &[
    "/api/",
    "/_next/",
    "/static/",
    "/assets/",
    "/public/",
    "/swagger-ui/",
    "/api-docs/",
];

/// Paths that are never gated, matched exactly.
const PASSTHROUGH_EXACT: &[&str] = &["/api", "/favicon.ico", "/ping", "/swagger-ui", "/api-docs"];

const ADMIN_ROLE: &str = "admin";

/// RouteClass
///
/// Category of a request path, derived from prefix matching only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Static files, API and documentation endpoints.
    Asset,
    /// `/login` and `/register`.
    AuthPage,
    /// Anything starting with `/admin`.
    Admin,
    /// Anything starting with `/dashboard`.
    Dashboard,
    /// Everything else, including `/`.
    Public,
}

/// Credentials
///
/// What the gate knows about the caller: whether a token cookie is present and
/// the normalized role label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub role: Option<String>,
}

impl Credentials {
    /// Builds credentials from raw cookie values. Blank values are treated as absent
    /// and the role is lowercased.
    pub fn from_cookies(token: Option<&str>, role: Option<&str>) -> Self {
        fn clean(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }
        Self {
            token: clean(token).map(str::to_string),
            role: clean(role).map(str::to_lowercase),
        }
    }

    pub fn from_jar(jar: &CookieJar) -> Self {
        Self::from_cookies(
            session::read_token(jar).as_deref(),
            session::read_role(jar).as_deref(),
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Landing page for an authenticated caller.
    fn home(&self) -> RedirectTarget {
        if self.is_admin() {
            RedirectTarget::Admin
        } else {
            RedirectTarget::Dashboard
        }
    }
}

/// RedirectTarget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Login,
    Dashboard,
    Admin,
}

impl RedirectTarget {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::Admin => "/admin",
        }
    }
}

/// GateDecision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(RedirectTarget),
}

/// normalize_path
///
/// Reduces a raw request path to the form the file host resolves: percent-decoded,
/// repeated `/` collapsed, `.` segments dropped and `..` applied. Returns `None`
/// when the decoded bytes are not UTF-8.
///
/// `/%61dmin.html`, `//admin.html` and `/./admin.html` all become `/admin.html`.
pub fn normalize_path(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    Some(format!("/{}", segments.join("/")))
}

/// classify
///
/// Maps a request path to its [`RouteClass`]. `/admin` and `/dashboard` are plain
/// prefix matches, so `/dashboard/settings` is a dashboard route.
pub fn classify(path: &str) -> RouteClass {
    if PASSTHROUGH_EXACT.contains(&path)
        || PASSTHROUGH_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
    {
        RouteClass::Asset
    } else if path == "/login" || path == "/register" {
        RouteClass::AuthPage
    } else if path.starts_with("/admin") {
        RouteClass::Admin
    } else if path.starts_with("/dashboard") {
        RouteClass::Dashboard
    } else {
        RouteClass::Public
    }
}

/// decide
///
/// The gate's decision table, evaluated in order:
///
/// 1. asset/internal paths are allowed;
/// 2. an authenticated caller on `/login` or `/register` is sent home
///    (`/admin` for admins, `/dashboard` otherwise);
/// 3. `/admin*` without a token goes to `/login`;
/// 4. `/admin*` for a non-admin goes to `/dashboard`;
/// 5. `/admin*` for an admin is allowed;
/// 6. `/dashboard*` without a token goes to `/login`;
/// 7. everything else is allowed.
pub fn decide(path: &str, credentials: &Credentials) -> GateDecision {
    match classify(path) {
        RouteClass::Asset => GateDecision::Allow,
        RouteClass::AuthPage if credentials.is_authenticated() => {
            GateDecision::Redirect(credentials.home())
        }
        RouteClass::Admin if !credentials.is_authenticated() => {
            GateDecision::Redirect(RedirectTarget::Login)
        }
        RouteClass::Admin if !credentials.is_admin() => {
            GateDecision::Redirect(RedirectTarget::Dashboard)
        }
        RouteClass::Dashboard if !credentials.is_authenticated() => {
            GateDecision::Redirect(RedirectTarget::Login)
        }
        _ => GateDecision::Allow,
    }
}

/// page_gate
///
/// Axum middleware wrapping [`decide`]. The decision is taken on the normalized
/// path, the request itself continues down the stack untouched. Redirects are
/// answered with `307 Temporary Redirect`, undecodable paths with 400.
pub async fn page_gate(jar: CookieJar, request: Request, next: Next) -> Response {
    let credentials = Credentials::from_jar(&jar);
    let Some(path) = normalize_path(request.uri().path()) else {
        tracing::debug!(raw = %request.uri().path(), "gate rejected undecodable path");
        return ApiError::BadRequest("Invalid request path".to_string()).into_response();
    };

    match decide(&path, &credentials) {
        GateDecision::Allow => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(
                path = %path,
                authenticated = credentials.is_authenticated(),
                target = target.path(),
                "gate redirect"
            );
            Redirect::temporary(target.path()).into_response()
        }
    }
}
