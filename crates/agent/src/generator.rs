use std::sync::Arc;

use tracing::{info, warn};

use folio_core::domain::portfolio::PortfolioForm;
use folio_core::errors::GenerationError;
use folio_core::prompt::build_portfolio_prompt;

use crate::llm::LlmClient;

/// Turns a completed form into portfolio copy with exactly one model call.
#[derive(Clone)]
pub struct PortfolioGenerator {
    client: Arc<dyn LlmClient>,
}

impl PortfolioGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn generate(&self, form: &PortfolioForm) -> Result<String, GenerationError> {
        let prompt = build_portfolio_prompt(form);

        match self.client.complete(&prompt).await {
            Ok(text) => {
                info!(
                    event_name = "generation.portfolio.completed",
                    output_chars = text.len(),
                    "portfolio generated"
                );
                Ok(text)
            }
            Err(error) => {
                warn!(
                    event_name = "generation.portfolio.failed",
                    error = %error,
                    "portfolio generation failed"
                );
                Err(error)
            }
        }
    }
}
