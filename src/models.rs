use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Stored Records ---

/// UserRecord
///
/// Raw row of the `users` table, including the bcrypt hash. Never serialized;
/// it only travels between the repository and the login/update handlers.
#[derive(Debug, Clone, FromRow, Default)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    // RBAC field: 'user' or 'admin'.
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User
///
/// Public view of an account as returned by the registration and admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.role,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Entry
///
/// A journal record. Serialized in lowercase snake_case; deserialization also accepts
/// the capitalised keys older clients send (`ID`, `Situation`, ...), so this type is the
/// one place loose shapes get normalized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Entry {
    #[serde(alias = "ID")]
    pub id: i64,
    #[serde(alias = "UserID")]
    pub user_id: i64,
    #[serde(alias = "Situation")]
    pub situation: String,
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "Colour")]
    pub colour: String,
    #[serde(alias = "Icon")]
    pub icon: String,
    #[serde(alias = "CreatedAt")]
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "UpdatedAt")]
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads ---

/// CreateUserRequest
///
/// Registration payload (POST /api/user/create). Missing fields deserialize as empty
/// strings so the handler can answer with a uniform 400.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// EntryPayload
///
/// Body of POST /api/user/entries. All four fields are required and must be non-blank.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(default)]
#[ts(export)]
pub struct EntryPayload {
    #[serde(alias = "Situation")]
    pub situation: String,
    #[serde(alias = "Text")]
    pub text: String,
    #[serde(alias = "Colour")]
    pub colour: String,
    #[serde(alias = "Icon")]
    pub icon: String,
}

impl EntryPayload {
    /// True when every field carries a non-blank value.
    pub fn is_complete(&self) -> bool {
        [&self.situation, &self.text, &self.colour, &self.icon]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// UpdateEntryRequest
///
/// Partial update for PUT /api/user/entries/{id} and PUT /api/admin/entries/{id}.
/// Absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateEntryRequest {
    #[serde(alias = "Situation")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(alias = "Text")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(alias = "Colour")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(alias = "Icon")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl UpdateEntryRequest {
    /// True when a field is present but blank. Updates may omit fields, not empty them.
    pub fn has_blank_field(&self) -> bool {
        [&self.situation, &self.text, &self.colour, &self.icon]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| v.trim().is_empty()))
    }
}

/// UpdateUserRequest
///
/// Admin edit of an account (PUT /api/admin/users/{id}). A non-empty `password`
/// is re-hashed before storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// UserChanges
///
/// Storage-level form of `UpdateUserRequest`, carrying the hash instead of the password.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<String>,
    pub password_hash: Option<String>,
}

// --- Responses ---

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: String,
}

/// UsernameResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UsernameResponse {
    pub username: String,
}

/// SessionProfile
///
/// Output of GET /api/user/me, built from the verified token claims.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionProfile {
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

/// MessageResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// AdminStats
///
/// Counters for the admin dashboard (GET /api/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_entries: i64,
}
