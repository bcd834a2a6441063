//! The seam between `LlmClient` and an actual HTTP transport.
//!
//! spec.md keeps the wire format out of scope ("only request/response
//! shape is specified"); this is that boundary made concrete. Nothing in
//! this crate performs the HTTP call itself.

use serde::{Deserialize, Serialize};

use crate::error::AuraError;

/// `POST {base_uri}/chat/completions`-shaped request body, per spec 4.7.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub base_uri: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub content: String,
    pub tokens_used: Option<u64>,
}

/// Implemented by whatever actually speaks HTTP to a provider. The crate
/// ships only [`NullTransport`]; a host embedding Aura supplies a real one.
pub trait LlmTransport {
    fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, AuraError>;
}

/// The default transport: always fails. Calling `chat`/a generative cast
/// without configuring a real transport surfaces this as a `ProviderError`
/// rather than silently returning empty text.
pub struct NullTransport;

impl LlmTransport for NullTransport {
    fn complete(&self, _request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, AuraError> {
        Err(AuraError::Provider("no LLM transport configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_transport_always_errors() {
        let request = ChatCompletionRequest {
            base_uri: "https://example.test".to_string(),
            model: "m".to_string(),
            messages: vec![],
            temperature: 0.0,
            max_tokens: 1,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };
        assert!(NullTransport.complete(&request).is_err());
    }
}
