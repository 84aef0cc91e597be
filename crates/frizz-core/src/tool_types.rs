// Tool types shared by the registry, the invoker and the model collaborator
//
// Design Decision: Tools are identified by name (string). The model sees
// a ToolSchema per tool, asks for a ToolCall, and gets a ToolResultPayload
// back in the conversation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::ObjectSchema;

/// What the model sees of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    /// Tool name (used by the model and for registry lookup)
    pub name: String,
    /// Tool description for the model
    pub description: String,
    /// Parameter schema (serialized as JSON Schema)
    pub parameters: ObjectSchema,
}

impl ToolSchema {
    /// JSON Schema of the parameters
    pub fn parameters_json_schema(&self) -> Value {
        self.parameters.to_json_schema()
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name to execute
    pub name: String,
    /// Raw (unvalidated) arguments as JSON
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call with an explicit ID
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a generated ID
    pub fn generated(name: impl Into<String>, arguments: Value) -> Self {
        Self::new(format!("call_{}", Uuid::now_v7().simple()), name, arguments)
    }
}

/// Why a tool call did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The model asked for a tool that is not registered
    UnknownTool,
    /// The arguments did not match the tool's schema
    ValidationFailure,
    /// The handler ran and failed
    ExecutionFailure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::UnknownTool => write!(f, "unknown_tool"),
            FailureKind::ValidationFailure => write!(f, "validation_failure"),
            FailureKind::ExecutionFailure => write!(f, "execution_failure"),
        }
    }
}

/// Content of a tool-result message
///
/// Success values are stored as JSON. When rendered for the model, a string
/// value is passed verbatim and any other value as compact JSON (object keys
/// sorted, so the encoding is deterministic and lossless).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResultPayload {
    /// Tool returned a value
    Success { value: Value },
    /// Tool call failed; the model may correct itself and retry
    Failure { kind: FailureKind, reason: String },
}

impl ToolResultPayload {
    pub fn success(value: impl Into<Value>) -> Self {
        ToolResultPayload::Success {
            value: value.into(),
        }
    }

    pub fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        ToolResultPayload::Failure {
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResultPayload::Success { .. })
    }

    /// Failure kind, if this is a failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ToolResultPayload::Failure { kind, .. } => Some(*kind),
            ToolResultPayload::Success { .. } => None,
        }
    }

    /// Render as message content for the model
    pub fn to_model_string(&self) -> String {
        match self {
            ToolResultPayload::Success {
                value: Value::String(s),
            } => s.clone(),
            ToolResultPayload::Success { value } => {
                serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
            }
            ToolResultPayload::Failure { kind, reason } => format!("Error ({}): {}", kind, reason),
        }
    }
}
