// Error types for the agent engine
//
// Errors are layered:
// - RegistryError: tool registration and lookup
// - ValidationError (see schema.rs): arguments that do not match a tool schema
// - ToolError: failures raised by tool handlers
// - ModelError: failures of the model collaborator
// - AgentError: everything that terminates a turn
//
// Only AgentError ever reaches the caller of Agent::run. Registry lookups,
// validation and handler failures that stem from a model decision are turned
// into tool-result messages by the loop instead.

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors raised by the tool registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tool with this name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// No tool with this name is registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Errors returned by tool handlers
///
/// The variants decide what the model gets to see:
/// - `Message`: an expected failure that is safe to show to the model
///   (e.g., "Cannot divide by zero", "Item not in cart")
/// - `Internal`: an unexpected failure whose details are logged but replaced
///   with a generic message before reaching the model
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool-level error, shown to the model verbatim
    #[error("{0}")]
    Message(String),

    /// Internal error, hidden from the model
    #[error("Internal tool error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    /// Create a tool-level error (safe to show to the model)
    pub fn message(msg: impl Into<String>) -> Self {
        ToolError::Message(msg.into())
    }

    /// Create an internal error from a string message
    pub fn internal(msg: impl Into<String>) -> Self {
        ToolError::Internal(anyhow::anyhow!(msg.into()))
    }

    /// Check if this error should be hidden from the model
    pub fn is_internal(&self) -> bool {
        matches!(self, ToolError::Internal(_))
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Internal(err.into())
    }
}

/// Errors raised by the model collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The model could not be reached or failed to answer
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// The model provider rejected the request due to rate limits
    #[error("Model rate limit exceeded: {0}")]
    RateLimited(String),

    /// The model did not answer within the collaborator's deadline
    #[error("Model request timed out: {0}")]
    Timeout(String),

    /// The model answered with no usable choice
    #[error("Model returned no response")]
    NoResponse,

    /// The model answered with something that is not a valid decision
    #[error("Malformed model decision: {0}")]
    MalformedDecision(String),
}

impl ModelError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        ModelError::Unavailable(msg.into())
    }

    /// Create a malformed decision error
    pub fn malformed(msg: impl Into<String>) -> Self {
        ModelError::MalformedDecision(msg.into())
    }
}

/// Errors that terminate an agent turn
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model collaborator error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Loop terminated because the model kept requesting tools
    #[error("Max iterations ({0}) exceeded")]
    MaxIterationsExceeded(usize),

    /// Registry error (construction time)
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Event emission error
    #[error("Event emission error: {0}")]
    EventEmission(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Create an event emission error
    pub fn event(msg: impl Into<String>) -> Self {
        AgentError::EventEmission(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }

    /// Check whether this error came from the model collaborator
    pub fn is_model_error(&self) -> bool {
        matches!(self, AgentError::Model(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_messages() {
        assert_eq!(
            RegistryError::DuplicateTool("add".into()).to_string(),
            "Tool already registered: add"
        );
        assert_eq!(
            RegistryError::UnknownTool("subtract".into()).to_string(),
            "Unknown tool: subtract"
        );
    }

    #[test]
    fn test_tool_error_kinds() {
        assert!(!ToolError::message("bad input").is_internal());
        assert!(ToolError::internal("db down").is_internal());

        let err: ToolError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.is_internal());
    }

    #[test]
    fn test_model_error_converts_to_agent_error() {
        let err: AgentError = ModelError::unavailable("connection refused").into();
        assert!(err.is_model_error());
        assert_eq!(err.to_string(), "Model unavailable: connection refused");
    }
}
