use sqlx::Row;

use folio_core::domain::user::{User, UserId};

use super::{format_timestamp, parse_timestamp, RepositoryError, UserCredentials, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String = row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let display_name: String =
        row.try_get("display_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(User {
        id: UserId(id),
        email,
        display_name,
        created_at: parse_timestamp("created_at", &created_at_str)?,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn insert(&self, user: User, password_hash: String) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id.0)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&password_hash)
        .bind(format_timestamp(user.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(error) if is_unique_violation(&error) => Err(RepositoryError::Duplicate(user.email)),
            Err(error) => Err(error.into()),
        }
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, email, display_name, password_hash, created_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let password_hash: String =
            row.try_get("password_hash").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        Ok(Some(UserCredentials { user: row_to_user(&row)?, password_hash }))
    }
}
