use crate::{
    AppState,
    auth::{self, AdminUser, AuthUser},
    error::ApiError,
    models::{
        AdminStats, CreateUserRequest, Entry, EntryPayload, LoginRequest, LoginResponse,
        MessageResponse, SessionProfile, UpdateEntryRequest, UpdateUserRequest, User, UserChanges,
        UsernameResponse,
    },
    session,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;

const ALLOWED_ROLES: &[&str] = &["user", "admin"];

/// Account backing the `ADMIN_PASSWORD` login.
const ADMIN_NAME: &str = "admin";
const ADMIN_EMAIL: &str = "admin@localhost";

// --- Account Handlers ---

/// register_user
///
/// [Public Route] Creates an account with the default 'user' role.
/// The password is stored as a bcrypt hash and never echoed back.
#[utoipa::path(
    post,
    path = "/api/user/create",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Name or email taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    }

    let password_hash = auth::hash_password(payload.password, state.config.bcrypt_cost).await?;
    let user = state
        .repo
        .create_user(name, email, &password_hash, "user")
        .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Verifies the credentials, signs a session token and writes the
/// `token` and `role` cookies through the session store.
///
/// When `ADMIN_PASSWORD` is configured, the name `admin` (any case) with that password
/// is always accepted with the 'admin' role. A missing `admin` row is created on the
/// first such login.
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid name or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Invalid input".to_string()));
    }

    let is_config_admin = name.eq_ignore_ascii_case(ADMIN_NAME)
        && state
            .config
            .admin_password
            .as_deref()
            .is_some_and(|admin_password| admin_password == payload.password);

    let (user_id, username, role) = if is_config_admin {
        // The token needs a real row id so the admin's own entries satisfy the owner key.
        let user_id = match state.repo.find_user_by_name(ADMIN_NAME).await? {
            Some(record) => record.id,
            None => {
                let password_hash =
                    auth::hash_password(payload.password.clone(), state.config.bcrypt_cost)
                        .await?;
                let user = state
                    .repo
                    .ensure_user(ADMIN_NAME, ADMIN_EMAIL, &password_hash, "admin")
                    .await?;
                tracing::info!(user_id = user.id, "admin account row created");
                user.id
            }
        };
        (user_id, ADMIN_NAME.to_string(), "admin".to_string())
    } else {
        let invalid = || ApiError::Unauthorized("Invalid name or password".to_string());

        let record = state
            .repo
            .find_user_by_name(name)
            .await?
            .ok_or_else(invalid)?;

        if !auth::verify_password(payload.password, record.password_hash.clone()).await? {
            tracing::info!(name = %name, "login rejected");
            return Err(invalid());
        }

        let role = match record.role.trim() {
            "" => "user".to_string(),
            role => role.to_lowercase(),
        };
        (record.id, record.name, role)
    };

    let token = auth::issue_token(&state.config, user_id, &username, &role)?;
    let jar = session::issue(jar, &state.config, &token, &role);

    tracing::info!(user_id, role = %role, "user logged in");
    Ok((
        jar,
        Json(LoginResponse {
            token,
            username,
            role,
        }),
    ))
}

/// logout
///
/// [Public Route] Clears both session cookies. Public so an expired session can
/// still be cleared.
#[utoipa::path(
    post,
    path = "/api/user/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        session::clear(jar),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

/// get_username
///
/// [Authenticated Route] Returns the username carried by the session token.
#[utoipa::path(
    post,
    path = "/api/user/getusername",
    responses(
        (status = 200, description = "Username", body = UsernameResponse),
        (status = 401, description = "No or invalid token")
    )
)]
pub async fn get_username(user: AuthUser) -> Json<UsernameResponse> {
    Json(UsernameResponse {
        username: user.username,
    })
}

/// get_me
///
/// [Authenticated Route] The caller's identity as resolved from the token.
#[utoipa::path(
    get,
    path = "/api/user/me",
    responses((status = 200, description = "Profile", body = SessionProfile))
)]
pub async fn get_me(user: AuthUser) -> Json<SessionProfile> {
    Json(SessionProfile {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

// --- Entry Handlers (Owner-Only) ---

/// get_entries
///
/// [Authenticated Route] Lists the caller's entries, newest first.
#[utoipa::path(
    get,
    path = "/api/user/entries",
    responses((status = 200, description = "My entries", body = [Entry]))
)]
pub async fn get_entries(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    Ok(Json(state.repo.get_entries(id).await?))
}

/// create_entry
///
/// [Authenticated Route] Stores a new entry owned by the caller. The owner always
/// comes from the session, never from the body.
#[utoipa::path(
    post,
    path = "/api/user/entries",
    request_body = EntryPayload,
    responses(
        (status = 201, description = "Created", body = Entry),
        (status = 400, description = "Missing fields")
    )
)]
pub async fn create_entry(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<EntryPayload>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    if !payload.is_complete() {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    }
    let entry = state.repo.create_entry(id, payload).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// update_entry
///
/// [Authenticated Route] Partial update of one of the caller's entries. Entries owned
/// by someone else answer 404, same as missing ones.
#[utoipa::path(
    put,
    path = "/api/user/entries/{id}",
    params(("id" = i64, Path, description = "Entry ID")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Updated", body = Entry),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn update_entry(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<Entry>, ApiError> {
    if payload.has_blank_field() {
        return Err(ApiError::BadRequest("Fields cannot be empty".to_string()));
    }
    state
        .repo
        .update_entry(id, user_id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Entry not found".to_string()))
}

/// delete_entry
///
/// [Authenticated Route] Deletes one of the caller's entries.
#[utoipa::path(
    delete,
    path = "/api/user/entries/{id}",
    params(("id" = i64, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Entry not found or unauthorized")
    )
)]
pub async fn delete_entry(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.repo.delete_entry(id, user_id).await? {
        Ok(Json(MessageResponse::new("Entry deleted successfully")))
    } else {
        Err(ApiError::NotFound(
            "Entry not found or unauthorized".to_string(),
        ))
    }
}

// --- Admin Handlers ---

/// list_all_entries
///
/// [Admin Route] Every entry in the system, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/entries",
    responses(
        (status = 200, description = "All entries", body = [Entry]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_all_entries(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    Ok(Json(state.repo.get_all_entries().await?))
}

/// list_users
///
/// [Admin Route] Every account, without password hashes.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.repo.get_users().await?))
}

/// update_any_entry
///
/// [Admin Route] Partial update of any entry, no ownership check.
#[utoipa::path(
    put,
    path = "/api/admin/entries/{id}",
    params(("id" = i64, Path, description = "Entry ID")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Updated", body = Entry),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn update_any_entry(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<Entry>, ApiError> {
    if payload.has_blank_field() {
        return Err(ApiError::BadRequest("Fields cannot be empty".to_string()));
    }
    state
        .repo
        .update_any_entry(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Entry not found".to_string()))
}

/// delete_any_entry
///
/// [Admin Route] Deletes any entry.
#[utoipa::path(
    delete,
    path = "/api/admin/entries/{id}",
    params(("id" = i64, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_any_entry(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.repo.delete_any_entry(id).await? {
        tracing::info!(admin_id = admin.id, entry_id = id, "entry removed by admin");
        Ok(Json(MessageResponse::new("Entry deleted successfully")))
    } else {
        Err(ApiError::NotFound("Entry not found".to_string()))
    }
}

/// update_user
///
/// [Admin Route] Renames an account, changes its role, or resets its password.
/// Roles are limited to 'user' and 'admin'.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid role or name"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let name = match payload.name.map(|n| n.trim().to_string()) {
        Some(n) if n.is_empty() => {
            return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
        }
        other => other,
    };

    let role = match payload.role.map(|r| r.trim().to_lowercase()) {
        Some(r) if !ALLOWED_ROLES.contains(&r.as_str()) => {
            return Err(ApiError::BadRequest(format!("Unknown role '{}'", r)));
        }
        other => other,
    };

    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(auth::hash_password(password, state.config.bcrypt_cost).await?),
        None => None,
    };

    let changes = UserChanges {
        name,
        role,
        password_hash,
    };

    state
        .repo
        .update_user(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// delete_user
///
/// [Admin Route] Deletes an account together with all of its entries.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.repo.delete_user(id).await? {
        tracing::info!(admin_id = admin.id, user_id = id, "user removed by admin");
        Ok(Json(MessageResponse::new("User deleted successfully")))
    } else {
        Err(ApiError::NotFound("User not found".to_string()))
    }
}

/// get_admin_stats
///
/// [Admin Route] Account and entry counters.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses((status = 200, description = "Stats", body = AdminStats))
)]
pub async fn get_admin_stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(state.repo.get_stats().await?))
}
