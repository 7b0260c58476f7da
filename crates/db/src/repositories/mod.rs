use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use folio_core::domain::portfolio::{Portfolio, PortfolioForm, PortfolioId};
use folio_core::domain::user::{Session, SessionToken, User, UserId};

pub mod memory;
pub mod portfolio;
pub mod session;
pub mod user;

pub use memory::{InMemoryPortfolioRepository, InMemorySessionRepository, InMemoryUserRepository};
pub use portfolio::SqlPortfolioRepository;
pub use session::SqlSessionRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

/// A user together with the stored password hash, only handed out for
/// credential verification.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    async fn insert(&self, portfolio: Portfolio) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &PortfolioId) -> Result<Option<Portfolio>, RepositoryError>;

    /// Records owned by `owner_id`, in no particular order.
    async fn list_by_owner(&self, owner_id: &UserId) -> Result<Vec<Portfolio>, RepositoryError>;

    /// Replaces content and form snapshot. Unknown ids are a no-op.
    async fn replace(
        &self,
        id: &PortfolioId,
        content: &str,
        form: &PortfolioForm,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Unknown ids are a no-op.
    async fn delete(&self, id: &PortfolioId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`RepositoryError::Duplicate`] when the email is taken.
    async fn insert(&self, user: User, password_hash: String) -> Result<(), RepositoryError>;

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn insert(&self, session: Session) -> Result<(), RepositoryError>;

    /// The session for `token` if it exists and has not expired at `now`.
    async fn find_live(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RepositoryError>;

    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError>;

    /// Removes sessions expired at `now`, returning how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Fixed-width RFC 3339 so stored timestamps also compare correctly as text.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}
