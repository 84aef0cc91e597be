// Loop state machine types
//
// A turn walks through three states:
//
//   AwaitingModel ──InvokeTool──▶ AwaitingToolResult ──result appended──▶ AwaitingModel
//         │
//         └──RespondDirectly──▶ Done
//
// Model failures, the iteration bound and cancellation also end the turn,
// but they leave the state machine from whichever state it is in.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::tool_types::ToolCall;

/// Where the decision loop is within a turn
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// Waiting for the model to decide
    AwaitingModel,
    /// A tool call was appended and must be answered
    AwaitingToolResult(ToolCall),
    /// The model responded directly
    Done,
}

impl LoopState {
    pub fn is_done(&self) -> bool {
        matches!(self, LoopState::Done)
    }
}

/// How a turn ended (errors are reported through `AgentError` instead)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The model produced a final response
    Completed,
    /// The turn was cancelled; the history is consistent but may end with
    /// an unanswered tool call
    Cancelled,
}

/// Summary of a finished turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub outcome: TurnOutcome,
    /// The final assistant text (None when cancelled)
    pub response: Option<String>,
    /// Number of tool calls the model requested during this turn
    pub round_trips: usize,
    /// History indices of the messages appended during this turn
    pub appended: Range<usize>,
}

impl TurnResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == TurnOutcome::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == TurnOutcome::Cancelled
    }
}
