//! Repository pattern for database operations
//!
//! Provides a clean interface for all account store operations
//! with proper error handling.

use crate::auth::{hash_password, verify_password};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};

/// A search to append to a user's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSearchRecord {
    pub user_id: i32,
    /// Original user input, before any keyword expansion
    pub keyword: String,
    pub search_mode: String,
    pub fields_to_search: Vec<String>,
    pub data_search_mode: String,
}

/// Administrator edit of an account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: Option<String>,
    /// New plain-text password; empty means unchanged
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Account Operations
    // ========================================================================

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: i32) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// List all accounts ordered by ID
    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserEntity::find()
            .order_by_asc(UserColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Register a new, non-admin account
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        self.create_user(username, password, false).await
    }

    /// Create an account with the given admin flag
    pub async fn create_user(&self, username: &str, password: &str, is_admin: bool) -> Result<User> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(AppError::DuplicateUsername { username: username.to_string() });
        }

        let user = UserActiveModel {
            id: NotSet,
            username: Set(username.to_string()),
            password: Set(hash_password(password)),
            is_admin: Set(is_admin),
        };

        user.insert(self.conn())
            .await
            .map_err(|e| map_unique_violation(e, username))
    }

    /// Check credentials; unknown user and wrong password are indistinguishable
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        match self.find_user_by_username(username).await? {
            Some(user) if verify_password(password, &user.password) => Ok(user),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    /// Seed the default administrator unless an account with that name exists
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<()> {
        match self.create_user(username, password, true).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "Seeded default administrator");
                Ok(())
            }
            Err(AppError::DuplicateUsername { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Apply an administrator edit to an account
    pub async fn update_user(&self, id: i32, update: UserUpdate) -> Result<User> {
        let existing = self
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "user".to_string(),
                id: id.to_string(),
            })?;

        let mut user: UserActiveModel = existing.clone().into();

        if let Some(username) = update.username.filter(|u| *u != existing.username) {
            if self.find_user_by_username(&username).await?.is_some() {
                return Err(AppError::DuplicateUsername { username });
            }
            user.username = Set(username);
        }

        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            user.password = Set(hash_password(&password));
        }

        if let Some(is_admin) = update.is_admin {
            user.is_admin = Set(is_admin);
        }

        let username = existing.username.clone();
        user.update(self.conn())
            .await
            .map_err(|e| map_unique_violation(e, &username))
    }

    // ========================================================================
    // Search History Operations
    // ========================================================================

    /// Append a search to the user's history
    pub async fn record_search(&self, record: NewSearchRecord) -> Result<SearchHistory> {
        let entry = SearchHistoryActiveModel {
            id: NotSet,
            user_id: Set(record.user_id),
            keyword: Set(Some(record.keyword)),
            search_mode: Set(Some(record.search_mode)),
            fields_to_search: Set(Some(record.fields_to_search.join(","))),
            data_search_mode: Set(Some(record.data_search_mode)),
            timestamp: Set(chrono::Utc::now()),
        };

        entry.insert(self.conn()).await.map_err(Into::into)
    }

    /// A user's search history, newest first
    pub async fn search_history(&self, user_id: i32) -> Result<Vec<SearchHistory>> {
        SearchHistoryEntity::find()
            .filter(SearchHistoryColumn::UserId.eq(user_id))
            .order_by_desc(SearchHistoryColumn::Timestamp)
            .order_by_desc(SearchHistoryColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Password Reset Operations
    // ========================================================================

    /// File a reset request for the named user; repeated requests are all kept
    pub async fn request_password_reset(&self, username: &str) -> Result<PasswordResetRequest> {
        let user = self
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::UnknownUser { username: username.to_string() })?;

        let request = PasswordResetActiveModel {
            id: NotSet,
            user_id: Set(user.id),
            username: Set(user.username),
            status: Set(ResetStatus::Pending.into()),
            timestamp: Set(chrono::Utc::now()),
        };

        request.insert(self.conn()).await.map_err(Into::into)
    }

    /// Requests still waiting for an administrator
    pub async fn pending_password_resets(&self) -> Result<Vec<PasswordResetRequest>> {
        PasswordResetEntity::find()
            .filter(PasswordResetColumn::Status.eq(String::from(ResetStatus::Pending)))
            .order_by_asc(PasswordResetColumn::Id)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Overwrite the requesting user's password and mark the request completed
    pub async fn complete_password_reset(
        &self,
        request_id: i32,
        new_password: &str,
    ) -> Result<PasswordResetRequest> {
        if new_password.is_empty() {
            return Err(AppError::Validation {
                message: "New password must not be empty".to_string(),
                field: Some("new_password".to_string()),
            });
        }

        let txn = self.conn().begin().await?;

        let request = PasswordResetEntity::find_by_id(request_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "password_reset_request".to_string(),
                id: request_id.to_string(),
            })?;

        if !request.is_pending() {
            return Err(AppError::Conflict {
                message: format!("Password reset request {} is already completed", request_id),
            });
        }

        let user = UserEntity::find_by_id(request.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "user".to_string(),
                id: request.user_id.to_string(),
            })?;

        let mut user: UserActiveModel = user.into();
        user.password = Set(hash_password(new_password));
        user.update(&txn).await?;

        let mut request: PasswordResetActiveModel = request.into();
        request.status = Set(ResetStatus::Completed.into());
        let request = request.update(&txn).await?;

        txn.commit().await?;

        Ok(request)
    }
}

fn map_unique_violation(err: DbErr, username: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateUsername {
            username: username.to_string(),
        },
        _ => AppError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_pool;

    async fn repo() -> (Repository, tempfile::TempDir) {
        let (pool, dir) = temp_pool().await;
        (Repository::new(pool), dir)
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let (repo, _dir) = repo().await;

        let alice = repo.register("alice", "pw1").await.unwrap();
        assert!(!alice.is_admin);

        let dup = repo.register("alice", "pw2").await;
        assert!(matches!(dup, Err(AppError::DuplicateUsername { .. })));

        let authed = repo.authenticate("alice", "pw1").await.unwrap();
        assert_eq!(authed.id, alice.id);

        assert!(matches!(
            repo.authenticate("alice", "pw2").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            repo.authenticate("nobody", "pw1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (repo, _dir) = repo().await;

        repo.ensure_admin("admin", "admin123").await.unwrap();
        repo.ensure_admin("admin", "changed").await.unwrap();

        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin);
        assert!(repo.authenticate("admin", "admin123").await.is_ok());
    }

    #[tokio::test]
    async fn test_search_history_newest_first() {
        let (repo, _dir) = repo().await;
        let user = repo.register("carol", "pw").await.unwrap();

        for keyword in ["retrieval", "agent"] {
            repo.record_search(NewSearchRecord {
                user_id: user.id,
                keyword: keyword.to_string(),
                search_mode: "OR".to_string(),
                fields_to_search: vec!["title".to_string(), "abstract".to_string()],
                data_search_mode: "iclr".to_string(),
            })
            .await
            .unwrap();
        }

        let history = repo.search_history(user.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].keyword.as_deref(), Some("agent"));
        assert_eq!(history[1].fields_to_search.as_deref(), Some("title,abstract"));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (repo, _dir) = repo().await;
        repo.register("dave", "old").await.unwrap();

        assert!(matches!(
            repo.request_password_reset("ghost").await,
            Err(AppError::UnknownUser { .. })
        ));

        let first = repo.request_password_reset("dave").await.unwrap();
        repo.request_password_reset("dave").await.unwrap();
        assert_eq!(repo.pending_password_resets().await.unwrap().len(), 2);

        assert!(matches!(
            repo.complete_password_reset(first.id, "").await,
            Err(AppError::Validation { .. })
        ));

        let done = repo.complete_password_reset(first.id, "new").await.unwrap();
        assert_eq!(done.reset_status(), ResetStatus::Completed);
        assert!(repo.authenticate("dave", "new").await.is_ok());
        assert!(repo.authenticate("dave", "old").await.is_err());

        assert!(matches!(
            repo.complete_password_reset(first.id, "again").await,
            Err(AppError::Conflict { .. })
        ));
        assert_eq!(repo.pending_password_resets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_username() {
        let (repo, _dir) = repo().await;
        let erin = repo.register("erin", "pw").await.unwrap();
        repo.register("frank", "pw").await.unwrap();

        let clash = repo
            .update_user(erin.id, UserUpdate { username: Some("frank".into()), ..Default::default() })
            .await;
        assert!(matches!(clash, Err(AppError::DuplicateUsername { .. })));

        let updated = repo
            .update_user(
                erin.id,
                UserUpdate {
                    username: Some("erin2".into()),
                    password: Some(String::new()),
                    is_admin: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "erin2");
        assert!(updated.is_admin);
        assert!(repo.authenticate("erin2", "pw").await.is_ok());
    }
}
