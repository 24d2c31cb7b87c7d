//! Language model access for metadata extraction.

use async_trait::async_trait;

pub mod openai;

pub use openai::OpenAiClient;

/// A chat-style completion endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends one system + user message pair and returns the first choice's content.
    ///
    /// Fails when the endpoint errors or answers without any choice.
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;
}
