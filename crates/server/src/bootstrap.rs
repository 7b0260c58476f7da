use std::sync::Arc;

use folio_agent::{GeminiClient, PortfolioGenerator};
use folio_core::config::{AppConfig, ConfigError, LoadOptions};
use folio_core::errors::GenerationError;
use folio_db::{connect_with_settings, migrations, DbPool, PortfolioStore};
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::AuthGateway;
use crate::session::CookieSettings;
use crate::state::{init_templates, AppState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
    pub generation_configured: bool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("generation client init failed: {0}")]
    Generation(#[source] GenerationError),
    #[error("template compilation failed: {0}")]
    Templates(#[from] tera::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let auth = AuthGateway::sqlite(db_pool.clone(), config.auth.session_ttl_hours);
    match auth.purge_expired_sessions().await {
        Ok(purged) => info!(
            event_name = "system.bootstrap.sessions_purged",
            correlation_id = "bootstrap",
            purged,
            "expired sessions removed"
        ),
        Err(error) => warn!(
            event_name = "system.bootstrap.sessions_purge_failed",
            correlation_id = "bootstrap",
            error = %error,
            "could not purge expired sessions"
        ),
    }

    let gemini = GeminiClient::from_config(&config.llm).map_err(BootstrapError::Generation)?;
    let generation_configured = gemini.has_credential();
    info!(
        event_name = "system.bootstrap.generation_ready",
        correlation_id = "bootstrap",
        model = gemini.model(),
        credential_configured = generation_configured,
        "generation client initialized"
    );

    let state = AppState {
        auth,
        store: PortfolioStore::sqlite(db_pool.clone()),
        generator: PortfolioGenerator::new(Arc::new(gemini)),
        templates: init_templates()?,
        cookies: CookieSettings::from_config(&config.auth),
    };

    Ok(Application { config, db_pool, state, generation_configured })
}

#[cfg(test)]
mod tests {
    use folio_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn options(database_url: &str, api_key: Option<&str>) -> LoadOptions {
        LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                llm_api_key: api_key.map(str::to_string),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_non_sqlite_database_url() {
        let result = bootstrap(options("postgres://localhost/folio", Some("key"))).await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("database.url"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_applies_schema_and_tolerates_missing_api_key() {
        let app = bootstrap(options("sqlite::memory:", None))
            .await
            .expect("bootstrap should succeed without a generation key");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('users', 'sessions', 'portfolios')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema query");
        assert_eq!(table_count, 3);

        app.db_pool.close().await;
    }
}
