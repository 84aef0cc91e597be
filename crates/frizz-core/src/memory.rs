// In-memory implementations for examples and testing
//
// These implementations keep all data in memory, making them perfect for:
// - Standalone examples that don't need a model provider
// - Unit and integration tests
// - Quick prototyping of tools before wiring up a real model

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{ModelError, Result};
use crate::events::LoopEvent;
use crate::message::Message;
use crate::tool_types::ToolSchema;
use crate::traits::{EventEmitter, ModelClient, ToolCallDecision};

// ============================================================================
// InMemoryEventEmitter - Collects events in memory
// ============================================================================

/// Event emitter that records every event
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventEmitter {
    events: Arc<RwLock<Vec<LoopEvent>>>,
}

impl InMemoryEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events emitted so far, in order
    pub async fn events(&self) -> Vec<LoopEvent> {
        self.events.read().await.clone()
    }

    /// Names of all events emitted so far, in order
    pub async fn event_names(&self) -> Vec<&'static str> {
        self.events.read().await.iter().map(|e| e.name()).collect()
    }

    /// Events belonging to one session
    pub async fn events_for(&self, session_id: &str) -> Vec<LoopEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.session_id() == session_id)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl EventEmitter for InMemoryEventEmitter {
    async fn emit(&self, event: LoopEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

// ============================================================================
// MockModelClient - Scripted model collaborator
// ============================================================================

/// Mock model client for testing
///
/// Returns predefined decisions in sequence and records what it was shown.
/// Once the script runs out, every call fails with `ModelError::Unavailable`.
#[derive(Debug, Default, Clone)]
pub struct MockModelClient {
    script: Arc<RwLock<VecDeque<std::result::Result<ToolCallDecision, ModelError>>>>,
    call_log: Arc<RwLock<Vec<Vec<Message>>>>,
    tools_log: Arc<RwLock<Vec<Vec<String>>>>,
    delay: Option<Duration>,
}

impl MockModelClient {
    /// Create a mock that returns `decisions` in order
    pub fn new(decisions: Vec<ToolCallDecision>) -> Self {
        Self::scripted(decisions.into_iter().map(Ok).collect())
    }

    /// Create a mock from a script that may include failures
    pub fn scripted(script: Vec<std::result::Result<ToolCallDecision, ModelError>>) -> Self {
        Self {
            script: Arc::new(RwLock::new(script.into())),
            ..Self::default()
        }
    }

    /// Wait this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a decision to the end of the script
    pub async fn push(&self, decision: ToolCallDecision) {
        self.script.write().await.push_back(Ok(decision));
    }

    /// History snapshots passed to each call
    pub async fn calls(&self) -> Vec<Vec<Message>> {
        self.call_log.read().await.clone()
    }

    /// Tool names offered on each call
    pub async fn offered_tools(&self) -> Vec<Vec<String>> {
        self.tools_log.read().await.clone()
    }

    /// Number of decisions left in the script
    pub async fn remaining(&self) -> usize {
        self.script.read().await.len()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> std::result::Result<ToolCallDecision, ModelError> {
        self.call_log.write().await.push(history.to_vec());
        self.tools_log
            .write()
            .await
            .push(tools.iter().map(|t| t.name.clone()).collect());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::unavailable("no more scripted decisions")))
    }
}
