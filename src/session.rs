use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::{AppConfig, Env};

/// Name of the cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "token";
/// Name of the cookie holding the role label used for page routing.
pub const ROLE_COOKIE: &str = "role";

/// Lifetime of both session cookies; matches the token expiry.
pub const SESSION_TTL_HOURS: i64 = 24;

/// issue
///
/// The only write path for session credentials. Token and role are always set
/// together so the two cookies cannot drift apart.
pub fn issue(jar: CookieJar, config: &AppConfig, token: &str, role: &str) -> CookieJar {
    jar.add(session_cookie(config, TOKEN_COOKIE, token.to_string()))
        .add(session_cookie(config, ROLE_COOKIE, role.to_lowercase()))
}

/// clear
///
/// Logout path: removes both cookies.
pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(ROLE_COOKIE).path("/"))
}

/// Reads the token cookie. Empty values count as absent.
pub fn read_token(jar: &CookieJar) -> Option<String> {
    read(jar, TOKEN_COOKIE)
}

/// Reads the role cookie. Empty values count as absent.
pub fn read_role(jar: &CookieJar) -> Option<String> {
    read(jar, ROLE_COOKIE)
}

fn read(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(config: &AppConfig, name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.env == Env::Production)
        .max_age(Duration::hours(SESSION_TTL_HOURS))
        .build()
}
