//! Server-rendered pages.
//!
//! - `GET  /`                          home
//! - `GET  /login`, `POST /login`      sign in (signed-out visitors only)
//! - `POST /logout`                    sign out
//! - `GET  /dashboard`                 list of the user's portfolios
//! - `GET  /generator`, `POST /generator` form and generated preview
//! - `POST /portfolios`                save the previewed portfolio
//! - `GET  /portfolio/{id}`            portfolio detail
//! - `POST /portfolio/{id}/delete`     delete

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::{error, info, warn};

use folio_core::domain::portfolio::{validate_for_save, Portfolio, PortfolioForm, PortfolioId};
use folio_core::errors::ApplicationError;
use folio_core::view::{Notice, PageState, DASHBOARD_PATH};

use crate::api::status_of;
use crate::session::SessionContext;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/generator", get(generator_page).post(generate))
        .route("/portfolios", post(save_portfolio))
        .route("/portfolio/{id}", get(portfolio_detail))
        .route("/portfolio/{id}/delete", post(delete_portfolio))
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

impl NoticeQuery {
    fn resolve(&self) -> Option<NoticeView> {
        self.notice.as_deref().and_then(Notice::from_code).map(NoticeView::from)
    }
}

#[derive(Clone, Debug, Serialize)]
struct NoticeView {
    message: String,
    is_error: bool,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        Self { message: notice.message().to_string(), is_error: notice.is_error() }
    }
}

impl From<&ApplicationError> for NoticeView {
    fn from(error: &ApplicationError) -> Self {
        Self { message: error.notice(), is_error: true }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Generated text plus the form snapshot it was produced from.
#[derive(Debug, Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub generated: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub projects: String,
    #[serde(default)]
    pub content: String,
}

impl SaveForm {
    fn into_parts(self) -> (String, PortfolioForm) {
        let form = PortfolioForm {
            name: self.name,
            skills: self.skills,
            experience: self.experience,
            education: self.education,
            projects: self.projects,
            content: self.content,
        };
        (self.generated, form)
    }
}

#[derive(Debug, Serialize)]
struct PortfolioSummary {
    id: String,
    name: String,
    skills: String,
    created_at: String,
}

impl From<&Portfolio> for PortfolioSummary {
    fn from(portfolio: &Portfolio) -> Self {
        Self {
            id: portfolio.id.0.clone(),
            name: portfolio.form.name.clone(),
            skills: portfolio.form.skills.clone(),
            created_at: display_time(portfolio.created_at),
        }
    }
}

fn display_time(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

fn correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn page_context(session: &SessionContext, notice: Option<NoticeView>) -> Context {
    let mut context = Context::new();
    context.insert("signed_in", &session.is_signed_in());
    context.insert(
        "user_name",
        &session.user.as_ref().map(|user| user.display_name.as_str()).unwrap_or_default(),
    );
    context.insert("notice", &notice);
    context
}

fn render(state: &AppState, template: &str, context: &Context, status: StatusCode) -> Response {
    match state.templates.render(template, context) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(error) => {
            error!(
                event_name = "view.render.failed",
                correlation_id = %correlation_id(),
                template,
                error = %error,
                "template rendering failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Something went wrong</h1>".to_string()),
            )
                .into_response()
        }
    }
}

fn render_generator(
    state: &AppState,
    session: &SessionContext,
    form: &PortfolioForm,
    preview: &PageState<String>,
    notice: Option<NoticeView>,
    status: StatusCode,
) -> Response {
    let mut context = page_context(session, notice);
    context.insert("form", form);
    context.insert("page_state", preview.as_str());
    if let PageState::Populated(generated) = preview {
        context.insert("generated", generated);
    }
    render(state, "generator.html", &context, status)
}

/// Logs the failure and converts it into a notice plus a response status.
fn report(error: ApplicationError, operation: &'static str) -> (NoticeView, StatusCode) {
    let notice = NoticeView::from(&error);
    let interface = error.into_interface(correlation_id());
    warn!(
        event_name = "view.action.failed",
        correlation_id = interface.correlation_id(),
        operation,
        error = %interface,
        "page action failed"
    );
    (notice, status_of(&interface))
}

async fn home(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<NoticeQuery>,
) -> Response {
    render(&state, "home.html", &page_context(&session, query.resolve()), StatusCode::OK)
}

async fn login_page(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<NoticeQuery>,
) -> Response {
    if let Err(redirect) = session.forbid_user() {
        return redirect.into_response();
    }
    let mut context = page_context(&session, query.resolve());
    context.insert("email", "");
    render(&state, "login.html", &context, StatusCode::OK)
}

async fn login_submit(
    State(state): State<AppState>,
    session: SessionContext,
    Form(login): Form<LoginForm>,
) -> Response {
    if let Err(redirect) = session.forbid_user() {
        return redirect.into_response();
    }

    match state.auth.login(&login.email, &login.password).await {
        Ok(new_session) => {
            let mut response = Redirect::to(DASHBOARD_PATH).into_response();
            if let Some(cookie) = state.cookies.issue(&new_session.token) {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
            response
        }
        Err(error) => {
            let (notice, status) = report(error.into(), "login");
            let mut context = page_context(&session, Some(notice));
            context.insert("email", &login.email);
            render(&state, "login.html", &context, status)
        }
    }
}

async fn logout(State(state): State<AppState>, session: SessionContext) -> Response {
    if let Some(token) = &session.token {
        state.auth.logout(token).await;
    }
    let mut response = Redirect::to(&Notice::SignedOut.redirect_to("/")).into_response();
    if let Some(cookie) = state.cookies.clear() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

async fn dashboard(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<NoticeQuery>,
) -> Response {
    let user = match session.require_user() {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    match state.store.list(&user.id).await {
        Ok(mut portfolios) => {
            // Display order only; the store returns records unordered.
            portfolios.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let summaries: Vec<PortfolioSummary> =
                portfolios.iter().map(PortfolioSummary::from).collect();
            let page = PageState::from_items(summaries);

            let mut context = page_context(&session, query.resolve());
            context.insert("page_state", page.as_str());
            match &page {
                PageState::Populated(items) => context.insert("portfolios", items),
                _ => context.insert("portfolios", &Vec::<PortfolioSummary>::new()),
            }
            render(&state, "dashboard.html", &context, StatusCode::OK)
        }
        Err(error) => {
            let (notice, status) = report(error.into(), "dashboard.list");
            let mut context = page_context(&session, Some(notice));
            context.insert("page_state", "failed");
            context.insert("portfolios", &Vec::<PortfolioSummary>::new());
            render(&state, "dashboard.html", &context, status)
        }
    }
}

async fn generator_page(State(state): State<AppState>, session: SessionContext) -> Response {
    if let Err(redirect) = session.require_user() {
        return redirect.into_response();
    }
    render_generator(
        &state,
        &session,
        &PortfolioForm::default(),
        &PageState::Empty,
        None,
        StatusCode::OK,
    )
}

async fn generate(
    State(state): State<AppState>,
    session: SessionContext,
    Form(form): Form<PortfolioForm>,
) -> Response {
    if let Err(redirect) = session.require_user() {
        return redirect.into_response();
    }

    if let Err(error) = form.validate() {
        let (notice, status) = report(error.into(), "generator.validate");
        return render_generator(&state, &session, &form, &PageState::Empty, Some(notice), status);
    }

    match state.generator.generate(&form).await {
        Ok(generated) => render_generator(
            &state,
            &session,
            &form,
            &PageState::Populated(generated),
            None,
            StatusCode::OK,
        ),
        Err(error) => {
            let (notice, status) = report(error.into(), "generator.generate");
            render_generator(&state, &session, &form, &PageState::Empty, Some(notice), status)
        }
    }
}

async fn save_portfolio(
    State(state): State<AppState>,
    session: SessionContext,
    Form(save): Form<SaveForm>,
) -> Response {
    let user = match session.require_user() {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let (generated, form) = save.into_parts();

    if let Err(error) = validate_for_save(&generated, &form) {
        let (notice, status) = report(error.into(), "portfolio.save.validate");
        let preview = if generated.trim().is_empty() {
            PageState::Empty
        } else {
            PageState::Populated(generated)
        };
        return render_generator(&state, &session, &form, &preview, Some(notice), status);
    }

    match state.store.create(&user.id, &generated, &form).await {
        Ok(id) => {
            info!(event_name = "view.portfolio.saved", portfolio_id = %id.0, "portfolio saved");
            Redirect::to(&Notice::Saved.redirect_to(DASHBOARD_PATH)).into_response()
        }
        Err(error) => {
            let (notice, status) = report(error.into(), "portfolio.save");
            render_generator(
                &state,
                &session,
                &form,
                &PageState::Populated(generated),
                Some(notice),
                status,
            )
        }
    }
}

async fn portfolio_detail(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> Response {
    let user = match session.require_user() {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };

    let portfolio = match state.store.get(&PortfolioId(id)).await {
        Ok(Some(portfolio)) if portfolio.is_owned_by(&user.id) => portfolio,
        Ok(_) => return Redirect::to(&Notice::NotFound.redirect_to(DASHBOARD_PATH)).into_response(),
        Err(error) => {
            report(error.into(), "portfolio.detail");
            return Redirect::to(&Notice::LoadFailed.redirect_to(DASHBOARD_PATH)).into_response();
        }
    };

    let mut context = page_context(&session, None);
    context.insert("created_at", &display_time(portfolio.created_at));
    context.insert("updated_at", &portfolio.updated_at.map(display_time));
    context.insert("portfolio", &portfolio);
    render(&state, "portfolio.html", &context, StatusCode::OK)
}

async fn delete_portfolio(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> Response {
    let user = match session.require_user() {
        Ok(user) => user,
        Err(redirect) => return redirect.into_response(),
    };
    let id = PortfolioId(id);

    match state.store.get(&id).await {
        Ok(Some(portfolio)) if portfolio.is_owned_by(&user.id) => {}
        Ok(_) => return Redirect::to(&Notice::NotFound.redirect_to(DASHBOARD_PATH)).into_response(),
        Err(error) => {
            report(error.into(), "portfolio.delete.lookup");
            return Redirect::to(&Notice::DeleteFailed.redirect_to(DASHBOARD_PATH)).into_response();
        }
    }

    let notice = match state.store.delete(&id).await {
        Ok(()) => Notice::Deleted,
        Err(error) => {
            report(error.into(), "portfolio.delete");
            Notice::DeleteFailed
        }
    };
    Redirect::to(&notice.redirect_to(DASHBOARD_PATH)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use folio_core::domain::portfolio::PortfolioForm;
    use folio_core::domain::user::UserId;
    use folio_core::errors::GenerationError;

    use crate::test_support::{filled_form, TestHarness};

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, location, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("request")
    }

    fn post_form(uri: &str, cookie: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).expect("request")
    }

    fn encode(form: &PortfolioForm) -> String {
        [
            ("name", &form.name),
            ("skills", &form.skills),
            ("experience", &form.experience),
            ("education", &form.education),
            ("projects", &form.projects),
            ("content", &form.content),
        ]
        .iter()
        .map(|(key, value)| format!("{key}={}", value.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&")
    }

    #[tokio::test]
    async fn anonymous_generator_request_redirects_without_rendering_the_form() {
        let harness = TestHarness::new(Ok("unused".to_string()));

        let (status, location, body) = send(harness.router(), get("/generator", None)).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/login"));
        assert!(!body.contains("<form"));
        assert_eq!(harness.llm.calls(), 0);
    }

    #[tokio::test]
    async fn signed_in_user_is_sent_from_login_to_dashboard() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;

        let (status, location, _) = send(harness.router(), get("/login", Some(&cookie))).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn login_sets_session_cookie_and_bad_password_shows_notice() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        harness.register("ada@example.com", "pw").await;

        let response = harness
            .router()
            .oneshot(post_form("/login", None, "email=ada%40example.com&password=pw".to_string()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("session cookie");
        assert!(cookie.starts_with("folio_session="));

        let (status, _, body) = send(
            harness.router(),
            post_form("/login", None, "email=ada%40example.com&password=nope".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Invalid email or password."));
        assert!(body.contains("ada@example.com"));
    }

    #[tokio::test]
    async fn empty_dashboard_shows_the_empty_state_prompt() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;

        let (status, _, body) = send(harness.router(), get("/dashboard", Some(&cookie))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No portfolios yet"));
        assert!(body.contains("Create your first portfolio now!"));
    }

    #[tokio::test]
    async fn blank_field_never_reaches_the_generator() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;
        let form = PortfolioForm { education: "   ".to_string(), ..filled_form() };

        let (status, _, body) =
            send(harness.router(), post_form("/generator", Some(&cookie), encode(&form))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please provide your education."));
        assert!(body.contains("Ada Lovelace"), "form keeps the user's input");
        assert_eq!(harness.llm.calls(), 0);
    }

    #[tokio::test]
    async fn complete_form_generates_once_and_renders_preview() {
        let harness = TestHarness::new(Ok("# Ada Lovelace portfolio".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;

        let (status, _, body) =
            send(harness.router(), post_form("/generator", Some(&cookie), encode(&filled_form())))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# Ada Lovelace portfolio"));
        assert!(body.contains("Save portfolio"));
        let prompts = harness.llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Notes on the Analytical Engine"));
    }

    #[tokio::test]
    async fn generation_failure_keeps_the_form_with_a_notice() {
        let harness = TestHarness::new(Err(GenerationError::Upstream("HTTP 500".to_string())));
        let cookie = harness.sign_in("ada@example.com").await;

        let (status, _, body) =
            send(harness.router(), post_form("/generator", Some(&cookie), encode(&filled_form())))
                .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Failed to generate portfolio. Please try again."));
        assert!(body.contains("Ada Lovelace"));
        assert!(!body.contains("Save portfolio"));
    }

    #[tokio::test]
    async fn save_uses_the_session_owner_and_exact_content() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;
        let owner = harness.user_id("ada@example.com").await;
        let body = format!("generated=Final+copy&{}", encode(&filled_form()));

        let (status, location, _) =
            send(harness.router(), post_form("/portfolios", Some(&cookie), body)).await;

        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/dashboard?notice=saved"));

        let saved = harness.state.store.list(&owner).await.expect("list");
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].owner_id, owner);
        assert_eq!(saved[0].content, "Final copy");
        assert_eq!(saved[0].form, filled_form());

        let (_, _, dashboard) =
            send(harness.router(), get("/dashboard?notice=saved", Some(&cookie))).await;
        assert!(dashboard.contains("Your portfolio has been saved successfully!"));
        assert!(dashboard.contains(&format!("/portfolio/{}", saved[0].id.0)));
    }

    #[tokio::test]
    async fn save_without_generated_text_is_refused() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;
        let owner = harness.user_id("ada@example.com").await;

        let (status, location, body) =
            send(harness.router(), post_form("/portfolios", Some(&cookie), String::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(location, None);
        assert!(body.contains("Nothing to save, generate a portfolio first."));

        let blank_generated = format!("generated=+++&{}", encode(&filled_form()));
        let (status, _, body) =
            send(harness.router(), post_form("/portfolios", Some(&cookie), blank_generated)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Ada Lovelace"), "form keeps the user's input");

        let incomplete = PortfolioForm { projects: String::new(), ..filled_form() };
        let (status, _, body) = send(
            harness.router(),
            post_form("/portfolios", Some(&cookie), format!("generated=Copy&{}", encode(&incomplete))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please provide your projects."));

        assert!(harness.state.store.list(&owner).await.expect("list").is_empty());
        assert_eq!(harness.llm.calls(), 0);
    }

    #[tokio::test]
    async fn another_users_portfolio_is_not_found() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;
        let id = harness
            .state
            .store
            .create(&UserId("someone-else".to_string()), "secret", &filled_form())
            .await
            .expect("create");

        let (status, location, _) =
            send(harness.router(), get(&format!("/portfolio/{}", id.0), Some(&cookie))).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(location.as_deref(), Some("/dashboard?notice=not_found"));

        let (_, location, _) = send(
            harness.router(),
            post_form(&format!("/portfolio/{}/delete", id.0), Some(&cookie), String::new()),
        )
        .await;
        assert_eq!(location.as_deref(), Some("/dashboard?notice=not_found"));
        assert!(harness.state.store.get(&id).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn detail_then_delete_round_trip() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;
        let owner = harness.user_id("ada@example.com").await;
        let id = harness
            .state
            .store
            .create(&owner, "Portfolio <b>copy</b>", &filled_form())
            .await
            .expect("create");

        let (status, _, body) =
            send(harness.router(), get(&format!("/portfolio/{}", id.0), Some(&cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Portfolio &lt;b&gt;copy&lt;&#x2F;b&gt;"));

        let (_, location, _) = send(
            harness.router(),
            post_form(&format!("/portfolio/{}/delete", id.0), Some(&cookie), String::new()),
        )
        .await;
        assert_eq!(location.as_deref(), Some("/dashboard?notice=deleted"));
        assert_eq!(harness.state.store.get(&id).await.expect("get"), None);

        let (_, location, _) =
            send(harness.router(), get(&format!("/portfolio/{}", id.0), Some(&cookie))).await;
        assert_eq!(location.as_deref(), Some("/dashboard?notice=not_found"));
    }

    #[tokio::test]
    async fn logout_revokes_session_and_clears_cookie() {
        let harness = TestHarness::new(Ok("unused".to_string()));
        let cookie = harness.sign_in("ada@example.com").await;

        let response = harness
            .router()
            .oneshot(post_form("/logout", Some(&cookie), String::new()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("cleared cookie");
        assert!(cleared.contains("Max-Age=0"));

        let (_, location, _) = send(harness.router(), get("/dashboard", Some(&cookie))).await;
        assert_eq!(location.as_deref(), Some("/login"));
    }
}
