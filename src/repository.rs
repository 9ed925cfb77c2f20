use crate::error::RepoError;
use crate::models::{
    AdminStats, Entry, EntryPayload, UpdateEntryRequest, User, UserChanges, UserRecord,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see this trait,
/// which lets the tests swap in in-memory implementations.
///
/// `Send + Sync + async_trait` make `Arc<dyn Repository>` usable across Axum's task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Fails with `RepoError::Duplicate` when the name or email is taken.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, RepoError>;
    // Returns the user called `name`, inserting it first when missing.
    async fn ensure_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, RepoError>;
    // Credential lookup for login; returns the row including the password hash.
    async fn find_user_by_name(&self, name: &str) -> Result<Option<UserRecord>, RepoError>;
    async fn get_users(&self) -> Result<Vec<User>, RepoError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, RepoError>;
    // Removes the account; its entries go with it.
    async fn delete_user(&self, id: i64) -> Result<bool, RepoError>;

    // --- Owner-scoped entries ---
    // Newest first.
    async fn get_entries(&self, user_id: i64) -> Result<Vec<Entry>, RepoError>;
    async fn create_entry(&self, user_id: i64, payload: EntryPayload) -> Result<Entry, RepoError>;
    // Owner-Only: `None` when the entry is missing or belongs to someone else.
    async fn update_entry(
        &self,
        id: i64,
        user_id: i64,
        req: UpdateEntryRequest,
    ) -> Result<Option<Entry>, RepoError>;
    async fn delete_entry(&self, id: i64, user_id: i64) -> Result<bool, RepoError>;

    // --- Admin ---
    async fn get_all_entries(&self) -> Result<Vec<Entry>, RepoError>;
    async fn update_any_entry(
        &self,
        id: i64,
        req: UpdateEntryRequest,
    ) -> Result<Option<Entry>, RepoError>;
    async fn delete_any_entry(&self, id: i64) -> Result<bool, RepoError>;
    async fn get_stats(&self) -> Result<AdminStats, RepoError>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Queries are bound at runtime so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, user_id, situation, text, colour, icon, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, RepoError> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    /// ensure_user
    ///
    /// Insert-or-fetch keyed on the unique `name`. The no-op `DO UPDATE` makes
    /// `RETURNING` yield the existing row on conflict.
    async fn ensure_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, RepoError> {
        let query = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<UserRecord>, RepoError> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, role, created_at, updated_at FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)
    }

    async fn get_users(&self) -> Result<Vec<User>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    /// update_user
    ///
    /// `COALESCE` keeps the stored value for every field left as `None`.
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                role = COALESCE($3, role),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.role)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    /// delete_user
    ///
    /// Entries are removed by the `ON DELETE CASCADE` foreign key.
    async fn delete_user(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_entries(&self, user_id: i64) -> Result<Vec<Entry>, RepoError> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn create_entry(&self, user_id: i64, payload: EntryPayload) -> Result<Entry, RepoError> {
        let query = format!(
            "INSERT INTO entries (user_id, situation, text, colour, icon) VALUES ($1, $2, $3, $4, $5) RETURNING {ENTRY_COLUMNS}"
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(user_id)
            .bind(payload.situation)
            .bind(payload.text)
            .bind(payload.colour)
            .bind(payload.icon)
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    /// update_entry
    ///
    /// Owner-Only partial update: the `user_id` predicate makes foreign entries
    /// indistinguishable from missing ones.
    async fn update_entry(
        &self,
        id: i64,
        user_id: i64,
        req: UpdateEntryRequest,
    ) -> Result<Option<Entry>, RepoError> {
        let query = format!(
            r#"
            UPDATE entries
            SET situation = COALESCE($3, situation),
                text = COALESCE($4, text),
                colour = COALESCE($5, colour),
                icon = COALESCE($6, icon),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .bind(user_id)
            .bind(req.situation)
            .bind(req.text)
            .bind(req.colour)
            .bind(req.icon)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn delete_entry(&self, id: i64, user_id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_all_entries(&self) -> Result<Vec<Entry>, RepoError> {
        let query = format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Entry>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    /// update_any_entry
    ///
    /// **Admin Override**: same partial update as `update_entry`, without the owner check.
    async fn update_any_entry(
        &self,
        id: i64,
        req: UpdateEntryRequest,
    ) -> Result<Option<Entry>, RepoError> {
        let query = format!(
            r#"
            UPDATE entries
            SET situation = COALESCE($2, situation),
                text = COALESCE($3, text),
                colour = COALESCE($4, colour),
                icon = COALESCE($5, icon),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .bind(req.situation)
            .bind(req.text)
            .bind(req.colour)
            .bind(req.icon)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)
    }

    async fn delete_any_entry(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_stats(&self) -> Result<AdminStats, RepoError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        let total_admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        let total_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        Ok(AdminStats {
            total_users,
            total_admins,
            total_entries,
        })
    }
}
