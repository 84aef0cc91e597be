// Tool Invoker
//
// Runs a single tool call: validate the raw arguments against the tool's
// schema, then execute the handler against the conversation context.
//
// Every outcome is a value. Validation errors, handler errors and handler
// panics are reported back to the loop as ToolInvocationResult, so one bad
// tool call never takes the loop down.

use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, warn};

use crate::error::{RegistryError, ToolError};
use crate::schema::ValidationError;
use crate::tool_types::{FailureKind, ToolCall, ToolResultPayload};
use crate::tools::{Tool, ToolArguments, ToolRegistry};

/// Reason shown to the model when a handler fails internally
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred while executing the tool";

/// Outcome of a single tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocationResult {
    /// Handler returned a value
    Success(Value),
    /// Arguments did not match the schema; the handler was not called
    ValidationFailure(ValidationError),
    /// Handler failed or panicked
    ExecutionFailure(String),
}

impl ToolInvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolInvocationResult::Success(_))
    }

    /// Convert to the payload recorded in the conversation
    pub fn into_payload(self) -> ToolResultPayload {
        match self {
            ToolInvocationResult::Success(value) => ToolResultPayload::success(value),
            ToolInvocationResult::ValidationFailure(err) => {
                ToolResultPayload::failure(FailureKind::ValidationFailure, err.to_string())
            }
            ToolInvocationResult::ExecutionFailure(reason) => {
                ToolResultPayload::failure(FailureKind::ExecutionFailure, reason)
            }
        }
    }
}

/// Validate `raw_arguments` and run the tool's handler against `context`.
///
/// The handler is only called with validated arguments. If the handler
/// panics, the panic is caught and reported as an execution failure; any
/// mutations it made to the context before panicking are kept.
pub async fn invoke<C: Send>(
    tool: &Tool<C>,
    raw_arguments: &Value,
    context: &mut C,
) -> ToolInvocationResult {
    let arguments = match tool.parameters().validate(raw_arguments) {
        Ok(validated) => ToolArguments::new(validated),
        Err(err) => {
            debug!(tool = %tool.name(), error = %err, "Tool arguments failed validation");
            return ToolInvocationResult::ValidationFailure(err);
        }
    };

    let outcome = AssertUnwindSafe(tool.handler().call(context, arguments))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(value)) => ToolInvocationResult::Success(value),
        Ok(Err(ToolError::Message(reason))) => {
            debug!(tool = %tool.name(), reason = %reason, "Tool returned an error");
            ToolInvocationResult::ExecutionFailure(reason)
        }
        Ok(Err(ToolError::Internal(err))) => {
            error!(tool = %tool.name(), error = %err, "Tool failed with an internal error");
            ToolInvocationResult::ExecutionFailure(INTERNAL_ERROR_MESSAGE.to_string())
        }
        Err(panic) => {
            error!(
                tool = %tool.name(),
                panic = %panic_message(panic.as_ref()),
                "Tool handler panicked"
            );
            ToolInvocationResult::ExecutionFailure(INTERNAL_ERROR_MESSAGE.to_string())
        }
    }
}

/// Dispatch a model-requested call through the registry.
///
/// Unknown tools become an `unknown_tool` failure payload instead of an
/// error, so the model can recover on its next decision.
pub async fn dispatch<C: Send>(
    registry: &ToolRegistry<C>,
    call: &ToolCall,
    context: &mut C,
) -> ToolResultPayload {
    match registry.get(&call.name) {
        Ok(tool) => invoke(tool, &call.arguments, context).await.into_payload(),
        Err(err @ RegistryError::UnknownTool(_)) => {
            warn!(tool = %call.name, tool_call_id = %call.id, "Model requested an unknown tool");
            ToolResultPayload::failure(FailureKind::UnknownTool, err.to_string())
        }
        Err(err) => ToolResultPayload::failure(FailureKind::ExecutionFailure, err.to_string()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
