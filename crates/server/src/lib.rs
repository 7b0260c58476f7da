//! HTTP surface for folio: server-rendered pages, the JSON API and the
//! password auth gateway behind both.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod health;
pub mod pages;
pub mod session;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use auth::AuthGateway;
pub use state::AppState;

/// Pages and JSON API bound to `state`. The health route is mounted by the
/// binary because it needs the raw pool.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(api::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::Router;

    use folio_agent::{LlmClient, PortfolioGenerator};
    use folio_core::domain::portfolio::PortfolioForm;
    use folio_core::domain::user::UserId;
    use folio_core::errors::GenerationError;
    use folio_db::repositories::{
        InMemoryPortfolioRepository, InMemorySessionRepository, InMemoryUserRepository,
        UserRepository,
    };
    use folio_db::PortfolioStore;

    use crate::auth::AuthGateway;
    use crate::session::CookieSettings;
    use crate::state::{init_templates, AppState};

    pub struct ScriptedLlm {
        prompts: Mutex<Vec<String>>,
        reply: Result<String, GenerationError>,
    }

    impl ScriptedLlm {
        pub fn calls(&self) -> usize {
            self.prompts.lock().expect("lock").len()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().expect("lock").push(prompt.to_string());
            self.reply.clone()
        }
    }

    pub struct TestHarness {
        pub state: AppState,
        pub llm: Arc<ScriptedLlm>,
        users: Arc<InMemoryUserRepository>,
    }

    impl TestHarness {
        pub fn new(reply: Result<String, GenerationError>) -> Self {
            let llm = Arc::new(ScriptedLlm { prompts: Mutex::new(Vec::new()), reply });
            let users = Arc::new(InMemoryUserRepository::default());
            let state = AppState {
                auth: AuthGateway::new(
                    users.clone(),
                    Arc::new(InMemorySessionRepository::default()),
                    24,
                ),
                store: PortfolioStore::new(Arc::new(InMemoryPortfolioRepository::default())),
                generator: PortfolioGenerator::new(llm.clone()),
                templates: init_templates().expect("templates"),
                cookies: CookieSettings {
                    name: "folio_session".to_string(),
                    secure: false,
                    max_age_secs: 3600,
                },
            };
            Self { state, llm, users }
        }

        pub fn router(&self) -> Router {
            crate::router(self.state.clone())
        }

        pub async fn register(&self, email: &str, password: &str) {
            self.state.auth.register(email, "Ada", password).await.expect("register");
        }

        /// Registers `email` and returns a `Cookie` header value for its session.
        pub async fn sign_in(&self, email: &str) -> String {
            self.register(email, "pw").await;
            let session = self.state.auth.login(email, "pw").await.expect("login");
            format!("folio_session={}", session.token.0)
        }

        pub async fn user_id(&self, email: &str) -> UserId {
            self.users
                .find_credentials_by_email(email)
                .await
                .expect("lookup")
                .expect("registered user")
                .user
                .id
        }
    }

    pub fn filled_form() -> PortfolioForm {
        PortfolioForm {
            name: "Ada Lovelace".to_string(),
            skills: "Mathematics and analysis".to_string(),
            experience: "Collaborator of Charles Babbage".to_string(),
            education: "Private tutoring in mathematics".to_string(),
            projects: "Notes on the Analytical Engine".to_string(),
            content: "Mention the first published algorithm".to_string(),
        }
    }
}
