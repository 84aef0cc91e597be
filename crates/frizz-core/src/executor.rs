// Decision Loop
//
// The orchestrator for a single turn. Coordinates:
// - Asking the ModelClient for a decision
// - Dispatching tool calls through the ToolRegistry and the invoker
// - Appending messages to the ConversationState in a fixed order
// - Emitting events via EventEmitter
//
// The loop is strictly sequential within one conversation. It suspends only
// while waiting for the model and while a tool handler runs. Cancellation is
// observed at every state transition: a model call or tool handler that
// already started runs to completion and its result is kept.
//
// Every message is appended before the event describing it is emitted. Once
// a tool has run or the final answer is in the history, a failing emitter is
// only logged, so a retry never repeats a handler or re-asks the model.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::events::LoopEvent;
use crate::invoker;
use crate::message::Message;
use crate::state::ConversationState;
use crate::step::{LoopState, TurnOutcome, TurnResult};
use crate::tools::ToolRegistry;
use crate::traits::{EventEmitter, ModelClient, ToolCallDecision};

/// Drives one turn of a conversation to completion
///
/// Borrowed collaborators keep the loop cheap to create per turn; the Agent
/// owns them and builds a loop for every call.
pub struct DecisionLoop<'a, C> {
    registry: &'a ToolRegistry<C>,
    model: &'a dyn ModelClient,
    emitter: &'a dyn EventEmitter,
    max_iterations: usize,
}

impl<'a, C: Send> DecisionLoop<'a, C> {
    /// Create a new decision loop
    pub fn new(
        registry: &'a ToolRegistry<C>,
        model: &'a dyn ModelClient,
        emitter: &'a dyn EventEmitter,
        max_iterations: usize,
    ) -> Self {
        Self {
            registry,
            model,
            emitter,
            max_iterations,
        }
    }

    /// Maximum number of tool round-trips per turn
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Run the loop on `state` until the model responds directly.
    ///
    /// Starts in `AwaitingToolResult` when the history ends with an
    /// unanswered tool call, otherwise in `AwaitingModel`. On error the
    /// history holds every message appended before the failure.
    pub async fn run(
        &self,
        state: &mut ConversationState<C>,
        cancel: &CancellationToken,
    ) -> Result<TurnResult> {
        let session_id = state.id().to_string();
        let start = state.len();

        info!(session_id = %session_id, history_len = start, "Starting decision loop");
        self.emitter
            .emit(LoopEvent::loop_started(session_id.clone()))
            .await?;

        let mut loop_state = match state.pending_tool_call() {
            Some(call) => {
                info!(
                    session_id = %session_id,
                    tool_call_id = %call.id,
                    "Resuming with unanswered tool call"
                );
                LoopState::AwaitingToolResult(call.clone())
            }
            None => LoopState::AwaitingModel,
        };

        let mut iteration = 0;
        let mut round_trips = 0;
        let mut response: Option<String> = None;

        loop {
            if !loop_state.is_done() && cancel.is_cancelled() {
                return self
                    .cancelled(&session_id, state, start, round_trips)
                    .await;
            }

            loop_state = match loop_state {
                LoopState::AwaitingModel => {
                    iteration += 1;
                    debug!(session_id = %session_id, iteration, "Requesting model decision");
                    self.emitter
                        .emit(LoopEvent::model_call_started(session_id.clone(), iteration))
                        .await?;

                    let decision = self
                        .model
                        .decide(state.history(), self.registry.list_schemas())
                        .await;

                    let decision = match decision {
                        Ok(decision) => decision,
                        Err(err) => {
                            warn!(session_id = %session_id, iteration, error = %err, "Model call failed");
                            self.emitter
                                .emit(LoopEvent::loop_error(session_id.clone(), err.to_string()))
                                .await?;
                            return Err(err.into());
                        }
                    };

                    self.emitter
                        .emit(LoopEvent::decision_received(
                            session_id.clone(),
                            iteration,
                            decision.is_tool_call(),
                        ))
                        .await?;

                    match decision {
                        ToolCallDecision::RespondDirectly { text } => {
                            state.append(Message::assistant(text.clone()));
                            response = Some(text);
                            LoopState::Done
                        }
                        ToolCallDecision::InvokeTool { call } => {
                            if round_trips >= self.max_iterations {
                                warn!(
                                    session_id = %session_id,
                                    max = self.max_iterations,
                                    tool_name = %call.name,
                                    "Max iterations reached"
                                );
                                let err = AgentError::MaxIterationsExceeded(self.max_iterations);
                                self.emitter
                                    .emit(LoopEvent::loop_error(session_id.clone(), err.to_string()))
                                    .await?;
                                return Err(err);
                            }

                            round_trips += 1;
                            info!(
                                session_id = %session_id,
                                iteration,
                                tool_name = %call.name,
                                tool_call_id = %call.id,
                                "Model requested tool call"
                            );
                            state.append(Message::assistant_tool_call(call.clone()));
                            LoopState::AwaitingToolResult(call)
                        }
                    }
                }

                LoopState::AwaitingToolResult(call) => {
                    self.emitter
                        .emit(LoopEvent::tool_started(
                            session_id.clone(),
                            call.id.clone(),
                            call.name.clone(),
                        ))
                        .await?;

                    let payload =
                        invoker::dispatch(self.registry, &call, state.context_mut()).await;
                    let success = payload.is_success();

                    debug!(
                        session_id = %session_id,
                        tool_name = %call.name,
                        tool_call_id = %call.id,
                        success,
                        "Tool call answered"
                    );
                    let event =
                        LoopEvent::tool_completed(session_id.clone(), call.id.clone(), success);
                    state.append(Message::tool_result(call, payload));
                    self.emit_committed(event).await;
                    LoopState::AwaitingModel
                }

                LoopState::Done => {
                    info!(session_id = %session_id, round_trips, "Decision loop completed");
                    self.emit_committed(LoopEvent::loop_completed(session_id.clone(), round_trips))
                        .await;

                    return Ok(TurnResult {
                        outcome: TurnOutcome::Completed,
                        response,
                        round_trips,
                        appended: start..state.len(),
                    });
                }
            };
        }
    }

    /// Emit an event for a change already recorded in the history
    async fn emit_committed(&self, event: LoopEvent) {
        let name = event.name();
        let session_id = event.session_id().to_string();
        if let Err(err) = self.emitter.emit(event).await {
            warn!(
                session_id = %session_id,
                event = name,
                error = %err,
                "Failed to emit event after state change"
            );
        }
    }

    async fn cancelled(
        &self,
        session_id: &str,
        state: &ConversationState<C>,
        start: usize,
        round_trips: usize,
    ) -> Result<TurnResult> {
        info!(session_id = %session_id, round_trips, "Decision loop cancelled");
        self.emitter
            .emit(LoopEvent::loop_cancelled(session_id, round_trips))
            .await?;

        Ok(TurnResult {
            outcome: TurnOutcome::Cancelled,
            response: None,
            round_trips,
            appended: start..state.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::memory::{InMemoryEventEmitter, MockModelClient};
    use crate::message::MessageRole;
    use crate::schema::{Field, ObjectSchema, ParameterSchema};
    use crate::tool_types::{FailureKind, ToolCall};
    use crate::tools::Tool;
    use crate::traits::NoopEventEmitter;
    use serde_json::json;

    fn add_registry() -> ToolRegistry<()> {
        ToolRegistry::builder()
            .tool(Tool::from_fn(
                "add",
                "Add two integers",
                ObjectSchema::new()
                    .field(Field::required("a", ParameterSchema::Integer))
                    .field(Field::required("b", ParameterSchema::Integer)),
                |_: &mut (), args| {
                    Box::pin(async move {
                        let a = args.get("a").and_then(|v| v.as_i64()).unwrap_or_default();
                        let b = args.get("b").and_then(|v| v.as_i64()).unwrap_or_default();
                        Ok(json!(a + b))
                    })
                },
            ))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_direct_response() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![ToolCallDecision::respond("Hello!")]);
        let loop_ = DecisionLoop::new(&registry, &model, &NoopEventEmitter, 5);

        let mut state = ConversationState::new(());
        state.append(Message::user("Hi"));

        let result = loop_.run(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.outcome, TurnOutcome::Completed);
        assert_eq!(result.response.as_deref(), Some("Hello!"));
        assert_eq!(result.round_trips, 0);
        assert_eq!(result.appended, 1..2);
    }

    #[tokio::test]
    async fn test_tool_round_trip_order() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![
            ToolCallDecision::invoke("add", json!({"a": 2, "b": 3})),
            ToolCallDecision::respond("5"),
        ]);
        let loop_ = DecisionLoop::new(&registry, &model, &NoopEventEmitter, 5);

        let mut state = ConversationState::new(());
        state.append(Message::user("What is 2 + 3?"));
        let result = loop_.run(&mut state, &CancellationToken::new()).await.unwrap();

        let roles: Vec<MessageRole> = state.history().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Assistant
            ]
        );
        assert_eq!(result.round_trips, 1);

        // Second model call saw the tool result
        let seen = model.calls().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].len(), 3);
        assert_eq!(seen[1][2].content.to_model_string(), "5");
    }

    #[tokio::test]
    async fn test_max_iterations_stops_before_append() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![
            ToolCallDecision::invoke("add", json!({"a": 1, "b": 1})),
            ToolCallDecision::invoke("add", json!({"a": 2, "b": 2})),
        ]);
        let loop_ = DecisionLoop::new(&registry, &model, &NoopEventEmitter, 1);

        let mut state = ConversationState::new(());
        state.append(Message::user("loop forever"));
        let err = loop_
            .run(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::MaxIterationsExceeded(1)));
        // user, tool call, tool result; the second call was never appended
        assert_eq!(state.len(), 3);
        assert!(state.pending_tool_call().is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_message() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![
            ToolCallDecision::invoke("subtract", json!({"a": 5, "b": 3})),
            ToolCallDecision::respond("I cannot subtract"),
        ]);
        let loop_ = DecisionLoop::new(&registry, &model, &NoopEventEmitter, 5);

        let mut state = ConversationState::new(());
        state.append(Message::user("5 - 3?"));
        let result = loop_.run(&mut state, &CancellationToken::new()).await.unwrap();

        assert!(result.is_completed());
        let payload = state.history()[2].tool_result_payload().unwrap();
        assert_eq!(payload.failure_kind(), Some(FailureKind::UnknownTool));
    }

    #[tokio::test]
    async fn test_model_error_is_fatal() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![]);
        let emitter = InMemoryEventEmitter::new();
        let loop_ = DecisionLoop::new(&registry, &model, &emitter, 5);

        let mut state = ConversationState::new(());
        state.append(Message::user("hello?"));
        let err = loop_
            .run(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Model(ModelError::Unavailable(_))));
        assert_eq!(state.len(), 1);
        let names = emitter.event_names().await;
        assert_eq!(names.last(), Some(&"loop_error"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![ToolCallDecision::respond("unused")]);
        let loop_ = DecisionLoop::new(&registry, &model, &NoopEventEmitter, 5);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut state = ConversationState::new(());
        state.append(Message::user("hi"));
        let result = loop_.run(&mut state, &cancel).await.unwrap();

        assert!(result.is_cancelled());
        assert!(result.appended.is_empty());
        assert!(model.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_resume_answers_pending_call() {
        let registry = add_registry();
        let model = MockModelClient::new(vec![ToolCallDecision::respond("7")]);
        let loop_ = DecisionLoop::new(&registry, &model, &NoopEventEmitter, 5);

        let mut state = ConversationState::new(());
        state.append(Message::user("3 + 4?"));
        state.append(Message::assistant_tool_call(ToolCall::new(
            "call_1",
            "add",
            json!({"a": 3, "b": 4}),
        )));

        let result = loop_.run(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(result.response.as_deref(), Some("7"));
        assert_eq!(result.round_trips, 0);
        assert_eq!(state.history()[2].tool_call_id(), Some("call_1"));
        assert_eq!(state.history()[2].content.to_model_string(), "7");
    }
}
