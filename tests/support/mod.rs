//! Shared test doubles for the crate-level integration suite. Plays the
//! same role as the teacher's `test-utils` crate, minus the
//! shell-out-and-compile step: these helpers build an in-process `Vm`
//! with a host that records output instead of touching a real terminal.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use aura::llm::{ChatCompletionRequest, ChatCompletionResponse, LlmTransport};
use aura::vm::Host;
use aura::{AuraError, Configuration, Vm};

#[derive(Default)]
pub struct FakeHost {
    pub written: RefCell<Vec<String>>,
    pub input: RefCell<VecDeque<String>>,
    pub urls: HashMap<String, String>,
}

impl Host for FakeHost {
    fn write_line(&mut self, line: &str) {
        self.written.get_mut().push(line.to_string());
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        self.input.get_mut().pop_front().ok_or_else(|| anyhow::anyhow!("no more scripted input"))
    }

    fn fetch_url(&self, url: &str) -> anyhow::Result<String> {
        self.urls.get(url).cloned().ok_or_else(|| anyhow::anyhow!("no scripted response for {url}"))
    }
}

/// An `LlmTransport` that echoes back a single scripted reply, regardless
/// of the prompt. Good enough to exercise `chat`/generative casts without
/// a real network call.
pub struct ScriptedTransport(pub String);

impl LlmTransport for ScriptedTransport {
    fn complete(&self, _request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, AuraError> {
        Ok(ChatCompletionResponse { content: self.0.clone(), tokens_used: None })
    }
}

/// A fresh VM in `testing` mode, so a `chat`/generative cast with no
/// scripted transport fails fast instead of reaching for a network the
/// test suite doesn't have.
pub fn vm() -> Vm {
    let mut config = Configuration::default();
    config.testing = true;
    Vm::new(config)
}

pub fn vm_with_fake_host(host: FakeHost) -> Vm {
    let mut config = Configuration::default();
    config.testing = true;
    Vm::with_host(config, Box::new(host))
}

pub fn vm_with_transport(reply: &str) -> Vm {
    // `testing: true` would make the cache miss below a hard
    // `ProviderError` before ever reaching the scripted transport (see
    // `LlmClient::complete`), defeating the point of this helper.
    let config = Configuration::default();
    Vm::with_host_and_transport(
        config,
        Box::new(FakeHost::default()),
        Box::new(ScriptedTransport(reply.to_string())),
    )
}
