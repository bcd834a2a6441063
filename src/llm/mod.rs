//! LLM client: request/response shapes, the transport seam, the
//! content-addressed cache, and the client that ties them together.

mod cache;
mod client;
mod transport;

pub use cache::{Cache, CacheEntry};
pub use client::LlmClient;
pub use transport::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, LlmTransport, NullTransport};
