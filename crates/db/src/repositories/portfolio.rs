use chrono::{DateTime, Utc};
use sqlx::Row;

use folio_core::domain::portfolio::{Portfolio, PortfolioForm, PortfolioId};
use folio_core::domain::user::UserId;

use super::{format_timestamp, parse_timestamp, PortfolioRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPortfolioRepository {
    pool: DbPool,
}

impl SqlPortfolioRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn encode_form(form: &PortfolioForm) -> Result<String, RepositoryError> {
    serde_json::to_string(form).map_err(|e| RepositoryError::Decode(format!("form_json: {e}")))
}

fn row_to_portfolio(row: &sqlx::sqlite::SqliteRow) -> Result<Portfolio, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let owner_id: String =
        row.try_get("owner_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let content: String =
        row.try_get("content").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let form_json: String =
        row.try_get("form_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: Option<String> =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let form = serde_json::from_str::<PortfolioForm>(&form_json)
        .map_err(|e| RepositoryError::Decode(format!("form_json: {e}")))?;
    let updated_at =
        updated_at_str.map(|raw| parse_timestamp("updated_at", &raw)).transpose()?;

    Ok(Portfolio {
        id: PortfolioId(id),
        owner_id: UserId(owner_id),
        content,
        form,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at,
    })
}

#[async_trait::async_trait]
impl PortfolioRepository for SqlPortfolioRepository {
    async fn insert(&self, portfolio: Portfolio) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO portfolios (id, owner_id, content, form_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&portfolio.id.0)
        .bind(&portfolio.owner_id.0)
        .bind(&portfolio.content)
        .bind(encode_form(&portfolio.form)?)
        .bind(format_timestamp(portfolio.created_at))
        .bind(portfolio.updated_at.map(format_timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PortfolioId) -> Result<Option<Portfolio>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, owner_id, content, form_json, created_at, updated_at
             FROM portfolios WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_portfolio).transpose()
    }

    async fn list_by_owner(&self, owner_id: &UserId) -> Result<Vec<Portfolio>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, content, form_json, created_at, updated_at
             FROM portfolios WHERE owner_id = ?",
        )
        .bind(&owner_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_portfolio).collect()
    }

    async fn replace(
        &self,
        id: &PortfolioId,
        content: &str,
        form: &PortfolioForm,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE portfolios SET content = ?, form_json = ?, updated_at = ? WHERE id = ?",
        )
        .bind(content)
        .bind(encode_form(form)?)
        .bind(format_timestamp(updated_at))
        .bind(&id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &PortfolioId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM portfolios WHERE id = ?").bind(&id.0).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{SubsecRound, Utc};

    use folio_core::domain::portfolio::{Portfolio, PortfolioForm, PortfolioId};
    use folio_core::domain::user::UserId;

    use super::SqlPortfolioRepository;
    use crate::repositories::PortfolioRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn portfolio(id: &str, owner: &str) -> Portfolio {
        Portfolio {
            id: PortfolioId(id.to_string()),
            owner_id: UserId(owner.to_string()),
            content: format!("# Portfolio {id}"),
            form: PortfolioForm {
                name: "Ada".to_string(),
                skills: "Rust".to_string(),
                ..PortfolioForm::default()
            },
            created_at: Utc::now().trunc_subsecs(6),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn stored_portfolio_reads_back_with_form_snapshot() {
        let pool = pool().await;
        let repo = SqlPortfolioRepository::new(pool.clone());
        let stored = portfolio("P-1", "U-1");

        repo.insert(stored.clone()).await.expect("insert");
        let found = repo.find_by_id(&stored.id).await.expect("find");

        assert_eq!(found, Some(stored));
        pool.close().await;
    }

    #[tokio::test]
    async fn list_by_owner_excludes_other_owners() {
        let pool = pool().await;
        let repo = SqlPortfolioRepository::new(pool.clone());
        repo.insert(portfolio("P-1", "U-1")).await.expect("insert P-1");
        repo.insert(portfolio("P-2", "U-2")).await.expect("insert P-2");
        repo.insert(portfolio("P-3", "U-1")).await.expect("insert P-3");

        let owned = repo.list_by_owner(&UserId("U-1".to_string())).await.expect("list");

        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|p| p.owner_id.0 == "U-1"));
        pool.close().await;
    }

    #[tokio::test]
    async fn replace_and_delete_ignore_unknown_ids() {
        let pool = pool().await;
        let repo = SqlPortfolioRepository::new(pool.clone());
        let missing = PortfolioId("P-missing".to_string());

        repo.replace(&missing, "text", &PortfolioForm::default(), Utc::now())
            .await
            .expect("replace on unknown id should be a no-op");
        repo.delete(&missing).await.expect("delete on unknown id should be a no-op");

        assert_eq!(repo.find_by_id(&missing).await.expect("find"), None);
        pool.close().await;
    }

    #[tokio::test]
    async fn corrupt_form_json_surfaces_decode_error() {
        let pool = pool().await;
        sqlx::query(
            "INSERT INTO portfolios (id, owner_id, content, form_json, created_at)
             VALUES ('P-bad', 'U-1', 'x', 'not json', '2024-01-01T00:00:00.000000Z')",
        )
        .execute(&pool)
        .await
        .expect("seed corrupt row");

        let repo = SqlPortfolioRepository::new(pool.clone());
        let result = repo.find_by_id(&PortfolioId("P-bad".to_string())).await;

        assert!(matches!(result, Err(crate::repositories::RepositoryError::Decode(_))));
        pool.close().await;
    }
}
