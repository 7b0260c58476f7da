use async_trait::async_trait;

use folio_core::errors::GenerationError;

/// Single-shot text completion: prompt in, text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}
