// Loop events
//
// LoopEvent tracks the decision loop lifecycle: model calls, decisions,
// tool invocations and how the turn ended. Events are observational only;
// the loop never reads them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted during loop execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoopEvent {
    /// Turn started
    LoopStarted {
        session_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Model was asked for a decision
    ModelCallStarted {
        session_id: String,
        iteration: usize,
        timestamp: DateTime<Utc>,
    },

    /// Model answered
    DecisionReceived {
        session_id: String,
        iteration: usize,
        is_tool_call: bool,
        timestamp: DateTime<Utc>,
    },

    /// Tool invocation started
    ToolInvocationStarted {
        session_id: String,
        tool_call_id: String,
        tool_name: String,
        timestamp: DateTime<Utc>,
    },

    /// Tool invocation completed (successfully or not)
    ToolInvocationCompleted {
        session_id: String,
        tool_call_id: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// Turn ended with a direct response
    LoopCompleted {
        session_id: String,
        round_trips: usize,
        timestamp: DateTime<Utc>,
    },

    /// Turn stopped by cancellation
    LoopCancelled {
        session_id: String,
        round_trips: usize,
        timestamp: DateTime<Utc>,
    },

    /// Turn failed with error
    LoopError {
        session_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl LoopEvent {
    /// Create a loop started event
    pub fn loop_started(session_id: impl Into<String>) -> Self {
        LoopEvent::LoopStarted {
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a model call started event
    pub fn model_call_started(session_id: impl Into<String>, iteration: usize) -> Self {
        LoopEvent::ModelCallStarted {
            session_id: session_id.into(),
            iteration,
            timestamp: Utc::now(),
        }
    }

    /// Create a decision received event
    pub fn decision_received(
        session_id: impl Into<String>,
        iteration: usize,
        is_tool_call: bool,
    ) -> Self {
        LoopEvent::DecisionReceived {
            session_id: session_id.into(),
            iteration,
            is_tool_call,
            timestamp: Utc::now(),
        }
    }

    /// Create a tool invocation started event
    pub fn tool_started(
        session_id: impl Into<String>,
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> Self {
        LoopEvent::ToolInvocationStarted {
            session_id: session_id.into(),
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a tool invocation completed event
    pub fn tool_completed(
        session_id: impl Into<String>,
        tool_call_id: impl Into<String>,
        success: bool,
    ) -> Self {
        LoopEvent::ToolInvocationCompleted {
            session_id: session_id.into(),
            tool_call_id: tool_call_id.into(),
            success,
            timestamp: Utc::now(),
        }
    }

    /// Create a loop completed event
    pub fn loop_completed(session_id: impl Into<String>, round_trips: usize) -> Self {
        LoopEvent::LoopCompleted {
            session_id: session_id.into(),
            round_trips,
            timestamp: Utc::now(),
        }
    }

    /// Create a loop cancelled event
    pub fn loop_cancelled(session_id: impl Into<String>, round_trips: usize) -> Self {
        LoopEvent::LoopCancelled {
            session_id: session_id.into(),
            round_trips,
            timestamp: Utc::now(),
        }
    }

    /// Create a loop error event
    pub fn loop_error(session_id: impl Into<String>, error: impl Into<String>) -> Self {
        LoopEvent::LoopError {
            session_id: session_id.into(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }

    /// Get the session ID for this event
    pub fn session_id(&self) -> &str {
        match self {
            LoopEvent::LoopStarted { session_id, .. }
            | LoopEvent::ModelCallStarted { session_id, .. }
            | LoopEvent::DecisionReceived { session_id, .. }
            | LoopEvent::ToolInvocationStarted { session_id, .. }
            | LoopEvent::ToolInvocationCompleted { session_id, .. }
            | LoopEvent::LoopCompleted { session_id, .. }
            | LoopEvent::LoopCancelled { session_id, .. }
            | LoopEvent::LoopError { session_id, .. } => session_id,
        }
    }

    /// Short event name, useful for assertions and logs
    pub fn name(&self) -> &'static str {
        match self {
            LoopEvent::LoopStarted { .. } => "loop_started",
            LoopEvent::ModelCallStarted { .. } => "model_call_started",
            LoopEvent::DecisionReceived { .. } => "decision_received",
            LoopEvent::ToolInvocationStarted { .. } => "tool_invocation_started",
            LoopEvent::ToolInvocationCompleted { .. } => "tool_invocation_completed",
            LoopEvent::LoopCompleted { .. } => "loop_completed",
            LoopEvent::LoopCancelled { .. } => "loop_cancelled",
            LoopEvent::LoopError { .. } => "loop_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_session_id() {
        let event = LoopEvent::tool_started("session-1", "call_1", "add");
        assert_eq!(event.session_id(), "session-1");
        assert_eq!(event.name(), "tool_invocation_started");
    }

    #[test]
    fn test_event_serialization() {
        let event = LoopEvent::loop_completed("session-1", 2);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("LoopCompleted"));
        assert!(json.contains("\"round_trips\":2"));
    }
}
