// OpenAI Model Client
//
// This crate provides an OpenAI-compatible model collaborator for frizz-core.
// It implements the ModelClient trait, turning the conversation history and
// the registered tool schemas into a chat completion request and the reply
// into a ToolCallDecision.
//
// Any endpoint that speaks the chat completions protocol (Azure OpenAI,
// local inference servers, proxies) works by changing the base URL.

mod client;
mod config;
mod types;

pub use client::{render_messages, render_tools, OpenAiModelClient};
pub use config::{OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::{
    ChatRequest, OpenAiChoice, OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiResponse,
    OpenAiTool, OpenAiToolCall, OpenAiUsage, ToolChoice,
};

// Re-export core types for convenience
pub use frizz_core::ModelClient;
