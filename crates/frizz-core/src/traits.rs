// Core traits for pluggable collaborators
//
// These traits allow the decision loop to be used with different backends:
// - ModelClient: the component that decides what to do next (an LLM, a script)
// - EventEmitter: where loop lifecycle events go (nowhere, memory, a channel)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::events::LoopEvent;
use crate::message::Message;
use crate::tool_types::{ToolCall, ToolSchema};

// ============================================================================
// ModelClient - decides the next step of the conversation
// ============================================================================

/// What the model chose to do given the history so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCallDecision {
    /// Answer the user; ends the turn
    RespondDirectly { text: String },
    /// Ask for a tool to be run; the result is fed back to the model
    InvokeTool { call: ToolCall },
}

impl ToolCallDecision {
    /// Create a direct response decision
    pub fn respond(text: impl Into<String>) -> Self {
        ToolCallDecision::RespondDirectly { text: text.into() }
    }

    /// Create a tool call decision with a generated call ID
    pub fn invoke(name: impl Into<String>, arguments: Value) -> Self {
        ToolCallDecision::InvokeTool {
            call: ToolCall::generated(name, arguments),
        }
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self, ToolCallDecision::InvokeTool { .. })
    }
}

/// The external decision maker
///
/// Given the full history and the available tool schemas, decide whether to
/// answer directly or to call a tool. Implementations must not mutate
/// anything the loop owns; they only see borrowed snapshots.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> std::result::Result<ToolCallDecision, ModelError>;
}

// ============================================================================
// EventEmitter - For observing loop execution
// ============================================================================

/// Trait for emitting events during loop execution
///
/// Implementations can:
/// - Send events to a channel for streaming to a UI
/// - Collect events in memory for testing
/// - Do nothing (no-op implementation)
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Emit a single event
    async fn emit(&self, event: LoopEvent) -> Result<()>;

    /// Emit multiple events
    async fn emit_batch(&self, events: Vec<LoopEvent>) -> Result<()> {
        for event in events {
            self.emit(event).await?;
        }
        Ok(())
    }
}

/// Event emitter that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventEmitter;

#[async_trait]
impl EventEmitter for NoopEventEmitter {
    async fn emit(&self, _event: LoopEvent) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_serialization() {
        let decision = ToolCallDecision::InvokeTool {
            call: ToolCall::new("call_1", "add", json!({"a": 1})),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["type"], "invoke_tool");
        assert_eq!(json["call"]["name"], "add");

        let respond = serde_json::to_value(ToolCallDecision::respond("hi")).unwrap();
        assert_eq!(respond, json!({"type": "respond_directly", "text": "hi"}));
    }

    #[tokio::test]
    async fn test_noop_emitter() {
        let emitter = NoopEventEmitter;
        emitter
            .emit_batch(vec![LoopEvent::loop_started("s1")])
            .await
            .unwrap();
    }
}
