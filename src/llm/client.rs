//! Ties configuration, cache and transport together behind `complete`.

use log::debug;
use serde_json::Value as Json;

use crate::clock::rfc3339_now;
use crate::config::Configuration;
use crate::error::AuraError;
use crate::llm::cache::{Cache, CacheEntry};
use crate::llm::transport::{ChatCompletionRequest, ChatMessage, LlmTransport, NullTransport};

pub struct LlmClient {
    config: Configuration,
    cache: Cache,
    transport: Box<dyn LlmTransport>,
}

impl LlmClient {
    pub fn new(config: Configuration, cache_path: impl AsRef<std::path::Path>) -> Self {
        LlmClient { config, cache: Cache::hydrate(cache_path), transport: Box::new(NullTransport) }
    }

    pub fn with_transport(
        config: Configuration,
        cache_path: impl AsRef<std::path::Path>,
        transport: Box<dyn LlmTransport>,
    ) -> Self {
        LlmClient { config, cache: Cache::hydrate(cache_path), transport }
    }

    /// Send `prompt` to the configured model, consulting the cache first.
    /// `testing=true` forbids the network path entirely: a cache miss is a
    /// `ProviderError` instead of reaching the transport.
    pub fn complete(&mut self, prompt: &str) -> Result<String, AuraError> {
        let params = self.generation_params();
        let key = Cache::key(prompt, &self.config.model, &self.config.base_uri, &params);

        if let Some(entry) = self.cache.get(&key) {
            debug!("cache hit for key {key}");
            return Ok(entry.message.clone());
        }
        debug!("cache miss for key {key}");

        if self.config.testing {
            return Err(AuraError::Provider(format!(
                "testing mode requires a cache hit, but no entry exists for key {key}"
            )));
        }

        let requested_at = rfc3339_now();
        let request = ChatCompletionRequest {
            base_uri: self.config.base_uri.clone(),
            model: self.config.model.clone(),
            messages: vec![ChatMessage { role: "user".to_string(), content: prompt.to_string() }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
        };
        let response = self.transport.complete(&request)?;
        let responded_at = rfc3339_now();

        let entry = CacheEntry {
            message: response.content.clone(),
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            tokens_used: response.tokens_used,
            parameters: params,
            requested_at,
            responded_at,
        };
        self.cache.insert(key, entry);
        Ok(response.content)
    }

    fn generation_params(&self) -> Json {
        serde_json::json!({
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "top_p": self.config.top_p,
            "frequency_penalty": self.config.frequency_penalty,
            "presence_penalty": self.config.presence_penalty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::transport::ChatCompletionResponse;
    use std::path::PathBuf;

    struct FakeTransport(String);
    impl LlmTransport for FakeTransport {
        fn complete(&self, _request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, AuraError> {
            Ok(ChatCompletionResponse { content: self.0.clone(), tokens_used: Some(7) })
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("aura-client-test-{name}-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&p);
        p
    }

    #[test]
    fn live_call_populates_cache_for_next_identical_prompt() {
        let path = temp_path("live");
        let mut client = LlmClient::with_transport(
            Configuration::default(),
            &path,
            Box::new(FakeTransport("answer".to_string())),
        );
        let first = client.complete("question").unwrap();
        assert_eq!(first, "answer");

        let mut rehydrated = LlmClient::with_transport(
            Configuration::default(),
            &path,
            Box::new(FakeTransport("different answer".to_string())),
        );
        let second = rehydrated.complete("question").unwrap();
        assert_eq!(second, "answer", "cache hit should win over the transport");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn testing_mode_requires_cache_hit() {
        let path = temp_path("testing-miss");
        let mut config = Configuration::default();
        config.testing = true;
        let mut client =
            LlmClient::with_transport(config, &path, Box::new(FakeTransport("unused".to_string())));
        assert!(client.complete("never cached").is_err());
    }
}
