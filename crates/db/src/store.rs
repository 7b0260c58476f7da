//! Document store client for portfolio records.
//!
//! Each call is a single repository round trip. Failures are logged and handed
//! back as [`StoreError`]; nothing is retried and nothing spans more than one
//! operation.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::error;
use uuid::Uuid;

use folio_core::domain::portfolio::{Portfolio, PortfolioForm, PortfolioId};
use folio_core::domain::user::UserId;
use folio_core::errors::StoreError;

use crate::repositories::{PortfolioRepository, RepositoryError, SqlPortfolioRepository};
use crate::DbPool;

#[derive(Clone)]
pub struct PortfolioStore {
    repository: Arc<dyn PortfolioRepository>,
}

impl PortfolioStore {
    pub fn new(repository: Arc<dyn PortfolioRepository>) -> Self {
        Self { repository }
    }

    pub fn sqlite(pool: DbPool) -> Self {
        Self::new(Arc::new(SqlPortfolioRepository::new(pool)))
    }

    pub async fn create(
        &self,
        owner_id: &UserId,
        content: &str,
        form: &PortfolioForm,
    ) -> Result<PortfolioId, StoreError> {
        let id = PortfolioId(Uuid::new_v4().to_string());
        let portfolio = Portfolio {
            id: id.clone(),
            owner_id: owner_id.clone(),
            content: content.to_string(),
            form: form.clone(),
            created_at: Utc::now().trunc_subsecs(6),
            updated_at: None,
        };

        self.repository.insert(portfolio).await.map_err(|e| store_failure("create", e))?;
        Ok(id)
    }

    pub async fn list(&self, owner_id: &UserId) -> Result<Vec<Portfolio>, StoreError> {
        self.repository.list_by_owner(owner_id).await.map_err(|e| store_failure("list", e))
    }

    pub async fn get(&self, id: &PortfolioId) -> Result<Option<Portfolio>, StoreError> {
        self.repository.find_by_id(id).await.map_err(|e| store_failure("get", e))
    }

    pub async fn update(
        &self,
        id: &PortfolioId,
        content: &str,
        form: &PortfolioForm,
    ) -> Result<(), StoreError> {
        self.repository
            .replace(id, content, form, Utc::now().trunc_subsecs(6))
            .await
            .map_err(|e| store_failure("update", e))
    }

    pub async fn delete(&self, id: &PortfolioId) -> Result<(), StoreError> {
        self.repository.delete(id).await.map_err(|e| store_failure("delete", e))
    }
}

fn store_failure(operation: &'static str, error: RepositoryError) -> StoreError {
    error!(
        event_name = "store.portfolio.failed",
        operation,
        error = %error,
        "portfolio store operation failed"
    );
    StoreError::Backend(error.to_string())
}
