// Conversation State
//
// One conversation: an append-only message history plus the application
// context that tools read and mutate. The state is owned by the caller and
// lent to the loop for the duration of a turn, so independent conversations
// never share anything.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, MessageRole};
use crate::tool_types::ToolCall;

/// A single conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState<C> {
    id: Uuid,
    history: Vec<Message>,
    context: C,
}

impl<C> ConversationState<C> {
    /// Create a conversation with an empty history
    pub fn new(context: C) -> Self {
        Self {
            id: Uuid::now_v7(),
            history: Vec::new(),
            context,
        }
    }

    /// Create a conversation from an existing history (e.g., a restored one)
    pub fn with_history(history: Vec<Message>, context: C) -> Self {
        Self {
            id: Uuid::now_v7(),
            history,
            context,
        }
    }

    /// Conversation ID, used to correlate logs and events
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Messages in append order
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Append a message.
    ///
    /// The history can only grow; there is no way to edit or remove a
    /// message once it is appended.
    pub fn append(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Tool call that was requested but never answered.
    ///
    /// A turn that was cancelled between appending a tool call and invoking
    /// the tool leaves such a call at the end of the history.
    pub fn pending_tool_call(&self) -> Option<&ToolCall> {
        match self.history.last() {
            Some(msg) if msg.is_tool_call() => msg.tool_call.as_ref(),
            _ => None,
        }
    }

    /// Text of the most recent assistant reply
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::Assistant && !m.is_tool_call())
            .find_map(|m| m.text())
    }

    /// Number of messages in the history
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
