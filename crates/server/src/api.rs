//! JSON API over the same operations as the pages.
//!
//! - `POST   /api/v1/generate`
//! - `GET    /api/v1/portfolios`
//! - `POST   /api/v1/portfolios`
//! - `GET    /api/v1/portfolios/{id}`
//! - `PUT    /api/v1/portfolios/{id}`
//! - `DELETE /api/v1/portfolios/{id}`
//!
//! Every route needs a session; errors are `{ "error", "correlation_id" }`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use folio_core::domain::portfolio::{validate_for_save, Portfolio, PortfolioForm, PortfolioId};
use folio_core::domain::user::User;
use folio_core::errors::{ApplicationError, InterfaceError};

use crate::session::SessionContext;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/generate", post(generate))
        .route("/api/v1/portfolios", get(list_portfolios).post(create_portfolio))
        .route(
            "/api/v1/portfolios/{id}",
            get(get_portfolio).put(update_portfolio).delete(delete_portfolio),
        )
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
pub struct PortfolioRequest {
    pub content: String,
    pub form: PortfolioForm,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

pub(crate) fn status_of(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn api_error(error: ApplicationError, operation: &'static str) -> (StatusCode, Json<ApiError>) {
    let message = error.notice();
    let interface = error.into_interface(correlation_id());
    warn!(
        event_name = "api.request.failed",
        correlation_id = interface.correlation_id(),
        operation,
        error = %interface,
        "api request failed"
    );
    (
        status_of(&interface),
        Json(ApiError { error: message, correlation_id: interface.correlation_id().to_string() }),
    )
}

fn unauthorized() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError { error: "Sign in to continue.".to_string(), correlation_id: correlation_id() }),
    )
}

fn not_found() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: "The requested portfolio could not be found.".to_string(),
            correlation_id: correlation_id(),
        }),
    )
}

fn signed_in(session: &SessionContext) -> ApiResult<&User> {
    session.require_user().map_err(|_| unauthorized())
}

/// Loads a portfolio the caller owns; anything else is reported as missing.
async fn owned_portfolio(
    state: &AppState,
    user: &User,
    id: &PortfolioId,
    operation: &'static str,
) -> ApiResult<Portfolio> {
    match state.store.get(id).await {
        Ok(Some(portfolio)) if portfolio.is_owned_by(&user.id) => Ok(portfolio),
        Ok(_) => Err(not_found()),
        Err(error) => Err(api_error(error.into(), operation)),
    }
}

async fn generate(
    State(state): State<AppState>,
    session: SessionContext,
    Json(form): Json<PortfolioForm>,
) -> ApiResult<Json<GenerateResponse>> {
    signed_in(&session)?;
    form.validate().map_err(|error| api_error(error.into(), "generate.validate"))?;

    let content =
        state.generator.generate(&form).await.map_err(|error| api_error(error.into(), "generate"))?;
    Ok(Json(GenerateResponse { content }))
}

async fn list_portfolios(
    State(state): State<AppState>,
    session: SessionContext,
) -> ApiResult<Json<Vec<Portfolio>>> {
    let user = signed_in(&session)?;
    let portfolios =
        state.store.list(&user.id).await.map_err(|error| api_error(error.into(), "list"))?;
    Ok(Json(portfolios))
}

async fn create_portfolio(
    State(state): State<AppState>,
    session: SessionContext,
    Json(request): Json<PortfolioRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let user = signed_in(&session)?;
    validate_for_save(&request.content, &request.form)
        .map_err(|error| api_error(error.into(), "create.validate"))?;
    let id = state
        .store
        .create(&user.id, &request.content, &request.form)
        .await
        .map_err(|error| api_error(error.into(), "create"))?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.0 })))
}

async fn get_portfolio(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Portfolio>> {
    let user = signed_in(&session)?;
    let portfolio = owned_portfolio(&state, user, &PortfolioId(id), "get").await?;
    Ok(Json(portfolio))
}

async fn update_portfolio(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
    Json(request): Json<PortfolioRequest>,
) -> ApiResult<StatusCode> {
    let user = signed_in(&session)?;
    let id = PortfolioId(id);
    owned_portfolio(&state, user, &id, "update.lookup").await?;

    state
        .store
        .update(&id, &request.content, &request.form)
        .await
        .map_err(|error| api_error(error.into(), "update"))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_portfolio(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = signed_in(&session)?;
    let id = PortfolioId(id);
    owned_portfolio(&state, user, &id, "delete.lookup").await?;

    state.store.delete(&id).await.map_err(|error| api_error(error.into(), "delete"))?;
    Ok(StatusCode::NO_CONTENT)
}
