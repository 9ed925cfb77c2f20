use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{config::AppConfig, error::ApiError, session};

/// Claims
///
/// Payload of the HS256 session token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    /// Issued At (seconds since the epoch).
    pub iat: usize,
    /// Expiration Time; tokens are rejected after this instant.
    pub exp: usize,
}

/// issue_token
///
/// Signs a token valid for [`session::SESSION_TTL_HOURS`].
pub fn issue_token(
    config: &AppConfig,
    user_id: i64,
    username: &str,
    role: &str,
) -> Result<String, ApiError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ApiError::Internal(format!("system clock error: {e}")))?
        .as_secs() as usize;

    let claims = Claims {
        user_id,
        username: username.to_string(),
        role: role.to_lowercase(),
        iat: now,
        exp: now + (session::SESSION_TTL_HOURS as usize) * 3600,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// decode_token
///
/// Verifies signature and expiry and returns the claims.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, ApiError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        })
}

/// AuthUser
///
/// Resolved identity of an authenticated API request, taken from verified claims.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    /// Lowercased role label, 'user' or 'admin'.
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            username: claims.username,
            role: claims.role.to_lowercase(),
        }
    }
}

/// Pulls the raw token from `Authorization: Bearer ...`, falling back to the
/// `token` cookie.
fn extract_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => session::read_token(&CookieJar::from_headers(&parts.headers)),
    }
}

/// AuthUser Extractor
///
/// Rejects with 401 when no token is supplied or when it fails verification.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let token = extract_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized: Missing token".to_string()))?;

        let claims = decode_token(&config, &token).inspect_err(|e| {
            tracing::debug!("rejected token: {}", e);
        })?;

        Ok(claims.into())
    }
}

/// AdminUser
///
/// An `AuthUser` whose role is 'admin'. Authentication failures are 401, a valid
/// non-admin session is 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden(
                "Forbidden: Admin access required".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

// --- Password hashing ---

/// Hashes a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Checks a password against a stored bcrypt hash. Malformed hashes count as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))
}
