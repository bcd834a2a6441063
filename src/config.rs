//! Runtime configuration for LLM calls (spec section 6).

use serde::{Deserialize, Serialize};

/// The seven LLM-call fields plus `testing`, per spec section 6.
///
/// Loading this from a file or environment is out of scope (spec.md
/// section 1); the struct itself, and `Vm::new` taking one, is in scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub base_uri: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    /// When true, network calls are disabled; a cache miss is a hard
    /// `ProviderError` instead of reaching the transport, and cache
    /// lookups are traced at `debug` level.
    pub testing: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            base_uri: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            testing: false,
        }
    }
}
