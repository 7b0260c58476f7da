use chrono::{DateTime, Utc};
use sqlx::Row;

use folio_core::domain::user::{Session, SessionToken, User, UserId};

use super::{format_timestamp, parse_timestamp, RepositoryError, SessionRepository};
use crate::DbPool;

pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn insert(&self, session: Session) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token.0)
        .bind(&session.user.id.0)
        .bind(format_timestamp(Utc::now()))
        .bind(format_timestamp(session.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_live(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            "SELECT s.token, s.expires_at, u.id, u.email, u.display_name, u.created_at
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.token = ? AND s.expires_at > ?",
        )
        .bind(&token.0)
        .bind(format_timestamp(now))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());
        let expires_at: String = row.try_get("expires_at").map_err(decode)?;
        let created_at: String = row.try_get("created_at").map_err(decode)?;

        Ok(Some(Session {
            token: SessionToken(row.try_get("token").map_err(decode)?),
            user: User {
                id: UserId(row.try_get("id").map_err(decode)?),
                email: row.try_get("email").map_err(decode)?,
                display_name: row.try_get("display_name").map_err(decode)?,
                created_at: parse_timestamp("created_at", &created_at)?,
            },
            expires_at: parse_timestamp("expires_at", &expires_at)?,
        }))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(&token.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(format_timestamp(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
