//! Generation client for portfolio copy.
//!
//! [`llm::LlmClient`] is the seam between the application and a hosted model.
//! [`gemini::GeminiClient`] implements it over the Gemini REST API and
//! [`generator::PortfolioGenerator`] turns a validated form into one prompt
//! and one completion.

pub mod gemini;
pub mod generator;
pub mod llm;

pub use gemini::GeminiClient;
pub use generator::PortfolioGenerator;
pub use llm::LlmClient;
