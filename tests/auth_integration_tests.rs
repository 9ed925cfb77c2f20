mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use common::{InMemoryRepo, test_state};
use jsonwebtoken::{EncodingKey, Header, encode};
use memory_journal::{
    ApiError, AppState,
    auth::{self, AdminUser, AuthUser, Claims},
    config::{AppConfig, Env},
    session,
};
use std::{sync::Arc, time::SystemTime};

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Signs claims directly, bypassing `issue_token`, so tests can craft expired tokens.
fn create_token(user_id: i64, role: &str, exp: usize, secret: &str) -> String {
    let claims = Claims {
        user_id,
        username: "alice".to_string(),
        role: role.to_string(),
        iat: now(),
        exp,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_app_state(env: Env) -> AppState {
    let mut state = test_state(Arc::new(InMemoryRepo::new()));
    state.config.env = env;
    state.config.jwt_secret = TEST_JWT_SECRET.to_string();
    state
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_bearer(token: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/api/user/me".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    parts
}

// --- Token Round Trip ---

#[test]
fn test_issued_token_decodes_with_same_secret() {
    let config = AppConfig::default();
    let token = auth::issue_token(&config, 7, "alice", "USER").unwrap();

    let claims = auth::decode_token(&config, &token).unwrap();
    assert_eq!(claims.user_id, 7);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.role, "user");
    assert_eq!(
        claims.exp - claims.iat,
        session::SESSION_TTL_HOURS as usize * 3600
    );
}

#[test]
fn test_token_from_other_secret_is_rejected() {
    let config = AppConfig::default();
    let token = create_token(1, "user", now() + 3600, "some-other-secret");

    let err = auth::decode_token(&config, &token).unwrap_err();
    assert!(matches!(&err, ApiError::Unauthorized(msg) if msg == "Invalid token"));
}

#[test]
fn test_expired_token_is_rejected() {
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    let token = create_token(1, "user", now() - 60, TEST_JWT_SECRET);

    let err = auth::decode_token(&config, &token).unwrap_err();
    assert!(matches!(&err, ApiError::Unauthorized(msg) if msg == "Token expired"));
}

// --- AuthUser Extractor ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let app_state = create_app_state(Env::Production);
    let token = create_token(42, "user", now() + 3600, TEST_JWT_SECRET);
    let mut parts = parts_with_bearer(&token);

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();

    assert_eq!(user.id, 42);
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, "user");
    assert!(!user.is_admin());
}

#[tokio::test]
async fn test_auth_falls_back_to_token_cookie() {
    let app_state = create_app_state(Env::Local);
    let token = create_token(5, "admin", now() + 3600, TEST_JWT_SECRET);

    let mut parts = get_request_parts(Method::GET, "/api/user/me".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        header::HeaderValue::from_str(&format!("token={}; role=admin", token)).unwrap(),
    );

    let user = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(user.id, 5);
    assert!(user.is_admin());
}

#[tokio::test]
async fn test_auth_failure_with_missing_token() {
    let app_state = create_app_state(Env::Production);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.to_string(), "Unauthorized: Missing token");
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    let app_state = create_app_state(Env::Production);
    let token = create_token(42, "user", now() - 10, TEST_JWT_SECRET);
    let mut parts = parts_with_bearer(&token);

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    let app_state = create_app_state(Env::Local);
    let mut parts = parts_with_bearer("not.a.jwt");

    let err = AuthUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized(_)));
}

// --- AdminUser Extractor ---

#[tokio::test]
async fn test_admin_extractor_accepts_admin_role() {
    let app_state = create_app_state(Env::Local);
    let token = create_token(1, "Admin", now() + 3600, TEST_JWT_SECRET);
    let mut parts = parts_with_bearer(&token);

    let AdminUser(admin) = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap();
    assert_eq!(admin.role, "admin");
}

#[tokio::test]
async fn test_admin_extractor_forbids_regular_user() {
    let app_state = create_app_state(Env::Local);
    let token = create_token(2, "user", now() + 3600, TEST_JWT_SECRET);
    let mut parts = parts_with_bearer(&token);

    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(err.to_string(), "Forbidden: Admin access required");
}

#[tokio::test]
async fn test_admin_extractor_unauthorized_without_token() {
    let app_state = create_app_state(Env::Local);
    let mut parts = get_request_parts(Method::GET, "/api/admin/stats".parse().unwrap());

    let err = AdminUser::from_request_parts(&mut parts, &app_state)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

// --- Session Cookies ---

#[test]
fn test_session_issue_sets_both_cookies() {
    let config = AppConfig::default();
    let jar = session::issue(CookieJar::new(), &config, "abc", "ADMIN");

    let token = jar.get(session::TOKEN_COOKIE).unwrap();
    let role = jar.get(session::ROLE_COOKIE).unwrap();
    assert_eq!(token.value(), "abc");
    assert_eq!(role.value(), "admin");
    assert_eq!(token.path(), Some("/"));
    assert_eq!(token.http_only(), Some(true));
    assert_eq!(token.secure(), Some(false));
    assert_eq!(
        token.max_age(),
        Some(time::Duration::hours(session::SESSION_TTL_HOURS))
    );

    assert_eq!(session::read_token(&jar).as_deref(), Some("abc"));
    assert_eq!(session::read_role(&jar).as_deref(), Some("admin"));
}

#[test]
fn test_session_cookies_are_secure_in_production() {
    let mut config = AppConfig::default();
    config.env = Env::Production;
    let jar = session::issue(CookieJar::new(), &config, "abc", "user");

    assert_eq!(jar.get(session::TOKEN_COOKIE).unwrap().secure(), Some(true));
    assert_eq!(jar.get(session::ROLE_COOKIE).unwrap().secure(), Some(true));
}

#[test]
fn test_session_clear_removes_both_cookies() {
    let jar = session::issue(CookieJar::new(), &AppConfig::default(), "abc", "user");
    let jar = session::clear(jar);

    assert!(session::read_token(&jar).is_none());
    assert!(session::read_role(&jar).is_none());
}

// --- Password Hashing ---

#[tokio::test]
async fn test_password_hash_round_trip() {
    let hash = auth::hash_password("hunter2".to_string(), 4).await.unwrap();
    assert_ne!(hash, "hunter2");

    assert!(auth::verify_password("hunter2".to_string(), hash.clone()).await.unwrap());
    assert!(!auth::verify_password("wrong".to_string(), hash).await.unwrap());
}

#[tokio::test]
async fn test_verify_against_malformed_hash_is_false() {
    let ok = auth::verify_password("hunter2".to_string(), "plaintext".to_string())
        .await
        .unwrap();
    assert!(!ok);
}
