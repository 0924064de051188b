//! Language model client.
//!
//! A trait-based abstraction over hosted chat models, with the Groq
//! OpenAI-compatible API as the primary implementation. The client is
//! stateless per call: the caller supplies the full prompt every time and
//! receives plain generated text back.

mod error;
mod groq;

pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use groq::GroqClient;

use async_trait::async_trait;

/// Trait for model completion clients.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a completion for a prompt.
    ///
    /// `stop` is an optional set of sequences at which generation halts;
    /// the stop sequence itself is not included in the returned text.
    /// No retry is performed on failure - the caller decides.
    async fn complete(&self, prompt: &str, stop: Option<&[String]>) -> Result<String, LlmError>;
}
