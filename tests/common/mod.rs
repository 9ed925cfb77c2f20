#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, Response, header},
};
use chrono::{Duration, Utc};
use memory_journal::{
    AppConfig, AppState, create_router,
    error::RepoError,
    models::{AdminStats, Entry, EntryPayload, UpdateEntryRequest, User, UserChanges, UserRecord},
    repository::Repository,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

// --- In-Memory Repository ---

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    entries: Vec<Entry>,
    next_user_id: i64,
    next_entry_id: i64,
}

/// Repository double backed by two vectors. Mirrors the Postgres semantics the
/// handlers rely on: unique names/emails, the entry owner key, owner-scoped entry
/// queries, cascade on user delete, newest-first listing.
#[derive(Default)]
pub struct InMemoryRepo {
    tables: Mutex<Tables>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry_count(&self) -> usize {
        self.tables.lock().unwrap().entries.len()
    }
}

fn apply(entry: &mut Entry, req: UpdateEntryRequest) {
    if let Some(v) = req.situation {
        entry.situation = v;
    }
    if let Some(v) = req.text {
        entry.text = v;
    }
    if let Some(v) = req.colour {
        entry.colour = v;
    }
    if let Some(v) = req.icon {
        entry.icon = v;
    }
    entry.updated_at = Utc::now();
}

fn newest_first(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    entries
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, RepoError> {
        let mut t = self.tables.lock().unwrap();
        if t.users.iter().any(|u| u.name == name || u.email == email) {
            return Err(RepoError::Duplicate);
        }
        t.next_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: t.next_user_id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: role.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.users.push(record.clone());
        Ok(record.into())
    }

    async fn ensure_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, RepoError> {
        if let Some(existing) = self.find_user_by_name(name).await? {
            return Ok(existing.into());
        }
        self.create_user(name, email, password_hash, role).await
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<UserRecord>, RepoError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.name == name).cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, RepoError> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().cloned().map(User::from).collect())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut t = self.tables.lock().unwrap();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone().into()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, RepoError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        let removed = t.users.len() < before;
        if removed {
            t.entries.retain(|e| e.user_id != id);
        }
        Ok(removed)
    }

    async fn get_entries(&self, user_id: i64) -> Result<Vec<Entry>, RepoError> {
        let t = self.tables.lock().unwrap();
        Ok(newest_first(
            t.entries.iter().filter(|e| e.user_id == user_id).cloned().collect(),
        ))
    }

    async fn create_entry(&self, user_id: i64, payload: EntryPayload) -> Result<Entry, RepoError> {
        let mut t = self.tables.lock().unwrap();
        if !t.users.iter().any(|u| u.id == user_id) {
            return Err(RepoError::UnknownOwner);
        }
        t.next_entry_id += 1;
        // Spread timestamps so ordering is deterministic within one test.
        let now = Utc::now() + Duration::milliseconds(t.next_entry_id);
        let entry = Entry {
            id: t.next_entry_id,
            user_id,
            situation: payload.situation,
            text: payload.text,
            colour: payload.colour,
            icon: payload.icon,
            created_at: now,
            updated_at: now,
        };
        t.entries.push(entry.clone());
        Ok(entry)
    }

    async fn update_entry(
        &self,
        id: i64,
        user_id: i64,
        req: UpdateEntryRequest,
    ) -> Result<Option<Entry>, RepoError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t
            .entries
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .map(|e| {
                apply(e, req);
                e.clone()
            }))
    }

    async fn delete_entry(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.entries.len();
        t.entries.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(t.entries.len() < before)
    }

    async fn get_all_entries(&self) -> Result<Vec<Entry>, RepoError> {
        let t = self.tables.lock().unwrap();
        Ok(newest_first(t.entries.clone()))
    }

    async fn update_any_entry(
        &self,
        id: i64,
        req: UpdateEntryRequest,
    ) -> Result<Option<Entry>, RepoError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.entries.iter_mut().find(|e| e.id == id).map(|e| {
            apply(e, req);
            e.clone()
        }))
    }

    async fn delete_any_entry(&self, id: i64) -> Result<bool, RepoError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.entries.len();
        t.entries.retain(|e| e.id != id);
        Ok(t.entries.len() < before)
    }

    async fn get_stats(&self) -> Result<AdminStats, RepoError> {
        let t = self.tables.lock().unwrap();
        Ok(AdminStats {
            total_users: t.users.len() as i64,
            total_admins: t.users.iter().filter(|u| u.role == "admin").count() as i64,
            total_entries: t.entries.len() as i64,
        })
    }
}

// --- App Scaffolding ---

pub const ADMIN_PASSWORD: &str = "root-password";

pub fn test_config() -> AppConfig {
    AppConfig {
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        ..AppConfig::default()
    }
}

pub fn test_state(repo: Arc<InMemoryRepo>) -> AppState {
    AppState {
        repo,
        config: test_config(),
    }
}

pub fn test_app() -> (Router, Arc<InMemoryRepo>) {
    let repo = Arc::new(InMemoryRepo::new());
    (create_router(test_state(repo.clone())), repo)
}

// --- Request Helpers ---

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bearer_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values of a response.
pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
