// Agent facade
//
// The Agent is what applications hold on to: a read-only tool registry, a
// model collaborator, an event emitter and a configuration. It owns no
// conversation data. Every call borrows a ConversationState mutably, so one
// Agent can serve any number of conversations concurrently.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::executor::DecisionLoop;
use crate::message::Message;
use crate::state::ConversationState;
use crate::step::TurnResult;
use crate::tools::ToolRegistry;
use crate::traits::{EventEmitter, ModelClient, NoopEventEmitter};

/// A tool-using agent
///
/// # Example
///
/// ```ignore
/// let agent = Agent::new(registry, OpenAiModelClient::from_env()?, AgentConfig::default());
/// let mut state = agent.new_state(Cart::default());
/// let result = agent.run("Add two apples to my cart", &mut state).await?;
/// println!("{}", result.response.unwrap_or_default());
/// ```
pub struct Agent<C> {
    registry: Arc<ToolRegistry<C>>,
    model: Arc<dyn ModelClient>,
    emitter: Arc<dyn EventEmitter>,
    config: AgentConfig,
}

impl<C: Send + 'static> Agent<C> {
    /// Create an agent that emits no events
    pub fn new(
        registry: ToolRegistry<C>,
        model: impl ModelClient + 'static,
        config: AgentConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            model: Arc::new(model),
            emitter: Arc::new(NoopEventEmitter),
            config,
        }
    }

    /// Replace the event emitter
    pub fn with_event_emitter(mut self, emitter: impl EventEmitter + 'static) -> Self {
        self.emitter = Arc::new(emitter);
        self
    }
}

impl<C: Send> Agent<C> {
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry<C> {
        &self.registry
    }

    /// Start a new conversation around `context`.
    ///
    /// When a system prompt is configured it becomes the first message.
    pub fn new_state(&self, context: C) -> ConversationState<C> {
        let mut state = ConversationState::new(context);
        if let Some(prompt) = &self.config.system_prompt {
            state.append(Message::system(prompt.clone()));
        }
        state
    }

    /// Append `user_message` and drive the loop until the model responds
    pub async fn run(
        &self,
        user_message: impl Into<String>,
        state: &mut ConversationState<C>,
    ) -> Result<TurnResult> {
        self.run_with_cancellation(user_message, state, CancellationToken::new())
            .await
    }

    /// Like `run`, stopping early once `cancel` fires.
    ///
    /// A cancelled turn returns `TurnOutcome::Cancelled` and keeps every
    /// message appended so far.
    pub async fn run_with_cancellation(
        &self,
        user_message: impl Into<String>,
        state: &mut ConversationState<C>,
        cancel: CancellationToken,
    ) -> Result<TurnResult> {
        let user_message = user_message.into();
        let start = state.len();
        state.append(Message::user(user_message));

        let mut result = self.drive(state, &cancel).await?;
        // The user message belongs to this turn as well
        result.appended = start..result.appended.end;
        Ok(result)
    }

    /// Drive the loop on the existing history without a new user message.
    ///
    /// Used to retry after a model failure or to continue a cancelled turn;
    /// an unanswered tool call at the end of the history is executed first.
    pub async fn resume(&self, state: &mut ConversationState<C>) -> Result<TurnResult> {
        self.resume_with_cancellation(state, CancellationToken::new())
            .await
    }

    /// Like `resume`, stopping early once `cancel` fires
    pub async fn resume_with_cancellation(
        &self,
        state: &mut ConversationState<C>,
        cancel: CancellationToken,
    ) -> Result<TurnResult> {
        self.drive(state, &cancel).await
    }

    #[instrument(skip_all, fields(session_id = %state.id()))]
    async fn drive(
        &self,
        state: &mut ConversationState<C>,
        cancel: &CancellationToken,
    ) -> Result<TurnResult> {
        let decision_loop = DecisionLoop::new(
            self.registry.as_ref(),
            self.model.as_ref(),
            self.emitter.as_ref(),
            self.config.max_iterations,
        );

        let result = decision_loop.run(state, cancel).await?;
        info!(
            outcome = ?result.outcome,
            round_trips = result.round_trips,
            appended = result.appended.len(),
            "Turn finished"
        );
        Ok(result)
    }
}

impl<C> std::fmt::Debug for Agent<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
