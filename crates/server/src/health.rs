use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use folio_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    generation_configured: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub generation: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, generation_configured: bool) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(HealthState { db_pool, generation_configured })
}

/// Readiness follows the database only. A missing generation key is reported
/// but does not fail the check.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "folio-server runtime initialized".to_string(),
        },
        database,
        generation: generation_check(state.generation_configured),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

fn generation_check(configured: bool) -> HealthCheck {
    if configured {
        HealthCheck { status: "ready", detail: "generation api key configured".to_string() }
    } else {
        HealthCheck { status: "unconfigured", detail: "generation api key missing".to_string() }
    }
}
