use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use folio_core::domain::portfolio::{Portfolio, PortfolioForm, PortfolioId};
use folio_core::domain::user::{Session, SessionToken, User, UserId};

use super::{
    PortfolioRepository, RepositoryError, SessionRepository, UserCredentials, UserRepository,
};

#[derive(Default)]
pub struct InMemoryPortfolioRepository {
    portfolios: RwLock<HashMap<String, Portfolio>>,
}

#[async_trait::async_trait]
impl PortfolioRepository for InMemoryPortfolioRepository {
    async fn insert(&self, portfolio: Portfolio) -> Result<(), RepositoryError> {
        let mut portfolios = self.portfolios.write().await;
        if portfolios.contains_key(&portfolio.id.0) {
            return Err(RepositoryError::Duplicate(portfolio.id.0));
        }
        portfolios.insert(portfolio.id.0.clone(), portfolio);
        Ok(())
    }

    async fn find_by_id(&self, id: &PortfolioId) -> Result<Option<Portfolio>, RepositoryError> {
        let portfolios = self.portfolios.read().await;
        Ok(portfolios.get(&id.0).cloned())
    }

    async fn list_by_owner(&self, owner_id: &UserId) -> Result<Vec<Portfolio>, RepositoryError> {
        let portfolios = self.portfolios.read().await;
        Ok(portfolios.values().filter(|p| &p.owner_id == owner_id).cloned().collect())
    }

    async fn replace(
        &self,
        id: &PortfolioId,
        content: &str,
        form: &PortfolioForm,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut portfolios = self.portfolios.write().await;
        if let Some(portfolio) = portfolios.get_mut(&id.0) {
            portfolio.content = content.to_string();
            portfolio.form = form.clone();
            portfolio.updated_at = Some(updated_at);
        }
        Ok(())
    }

    async fn delete(&self, id: &PortfolioId) -> Result<(), RepositoryError> {
        self.portfolios.write().await.remove(&id.0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserCredentials>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User, password_hash: String) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.user.email == user.email) {
            return Err(RepositoryError::Duplicate(user.email));
        }
        users.insert(user.id.0.clone(), UserCredentials { user, password_hash });
        Ok(())
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|entry| entry.user.email == email).cloned())
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

#[async_trait::async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.0.clone(), session);
        Ok(())
    }

    async fn find_live(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&token.0).filter(|session| !session.is_expired_at(now)).cloned())
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError> {
        self.sessions.write().await.remove(&token.0);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}
