// Frizz Core
//
// A tool-dispatch and conversation-orchestration engine: an external model
// decides, turn by turn, whether to answer the user or to call one of a set
// of registered tools; tools run against an application context that lives
// for the whole conversation.
//
// Key design decisions:
// - Tools are values (schema + handler) dispatched by name through a ToolRegistry
// - Arguments are validated against a structural schema before any handler runs
// - The application context is threaded through handlers as `&mut C`, never global
// - Model output is parsed into the closed ToolCallDecision at the ModelClient boundary
// - Failures caused by model choices become tool-result messages; only
//   infrastructure failures end a turn
// - Uses traits (ModelClient, EventEmitter, ToolHandler) for pluggable backends

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod invoker;
pub mod message;
pub mod schema;
pub mod state;
pub mod step;
pub mod tool_types;
pub mod tools;
pub mod traits;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use agent::Agent;
pub use config::{AgentConfig, AgentConfigBuilder};
pub use error::{AgentError, ModelError, RegistryError, Result, ToolError};
pub use events::LoopEvent;
pub use executor::DecisionLoop;
pub use invoker::{invoke, ToolInvocationResult};
pub use message::{Message, MessageContent, MessageRole};
pub use schema::{Field, ObjectSchema, ParameterSchema, ValidationError};
pub use state::ConversationState;
pub use step::{LoopState, TurnOutcome, TurnResult};
pub use tool_types::{FailureKind, ToolCall, ToolResultPayload, ToolSchema};
pub use tools::{
    handler_fn, Tool, ToolArguments, ToolFuture, ToolHandler, ToolRegistry, ToolRegistryBuilder,
};
pub use traits::{EventEmitter, ModelClient, NoopEventEmitter, ToolCallDecision};

// Re-exported so callers can cancel turns without a direct tokio-util dependency
pub use tokio_util::sync::CancellationToken;
