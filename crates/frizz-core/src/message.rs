// Message types
//
// Message represents a single entry in the conversation history.
// Messages are immutable once appended; the history is an append-only log.

use crate::tool_types::{ToolCall, ToolResultPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant response or tool call request
    Assistant,
    /// Tool execution result
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "tool" => Ok(MessageRole::Tool),
            other => Err(format!("Unknown message role: {}", other)),
        }
    }
}

/// Message content variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Text content (system, user and assistant messages)
    Text(String),

    /// Structured tool result (tool messages)
    ToolResult(ToolResultPayload),
}

impl MessageContent {
    /// Get text content if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(s) => Some(s),
            MessageContent::ToolResult(_) => None,
        }
    }

    /// Convert to text representation for the model
    pub fn to_model_string(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::ToolResult(payload) => payload.to_model_string(),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,

    /// Message role
    pub role: MessageRole,

    /// Message content
    pub content: MessageContent,

    /// Tool call metadata: the requested call on assistant messages,
    /// the answered call on tool messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: MessageRole, content: MessageContent, tool_call: Option<ToolCall>) -> Self {
        Self {
            id: Uuid::now_v7(),
            role,
            content,
            tool_call,
            created_at: Utc::now(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, MessageContent::Text(content.into()), None)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, MessageContent::Text(content.into()), None)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(
            MessageRole::Assistant,
            MessageContent::Text(content.into()),
            None,
        )
    }

    /// Create an assistant message requesting a tool call
    pub fn assistant_tool_call(tool_call: ToolCall) -> Self {
        Self::new(
            MessageRole::Assistant,
            MessageContent::Text(String::new()),
            Some(tool_call),
        )
    }

    /// Create a tool result message answering `tool_call`
    pub fn tool_result(tool_call: ToolCall, payload: ToolResultPayload) -> Self {
        Self::new(
            MessageRole::Tool,
            MessageContent::ToolResult(payload),
            Some(tool_call),
        )
    }

    /// Get text content if this is a text message
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }

    /// Get the tool result payload if this is a tool message
    pub fn tool_result_payload(&self) -> Option<&ToolResultPayload> {
        match &self.content {
            MessageContent::ToolResult(payload) => Some(payload),
            MessageContent::Text(_) => None,
        }
    }

    /// Check if this is an assistant message requesting a tool call
    pub fn is_tool_call(&self) -> bool {
        self.role == MessageRole::Assistant && self.tool_call.is_some()
    }

    /// ID of the tool call this message requests or answers
    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call.as_ref().map(|tc| tc.id.as_str())
    }
}
