// OpenAI Model Client
//
// Implements the ModelClient trait from frizz-core over the OpenAI chat
// completions API. The response is parsed into a ToolCallDecision right here;
// anything that does not fit is rejected as MalformedDecision and never
// reaches the decision loop.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use frizz_core::{
    AgentError, Message, MessageRole, ModelClient, ModelError, ToolCall, ToolCallDecision,
    ToolSchema,
};

use crate::config::OpenAiConfig;
use crate::types::{
    ChatRequest, OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiResponse, OpenAiTool,
    OpenAiToolCall, ToolChoice,
};

/// Model collaborator backed by an OpenAI-compatible endpoint
///
/// # Example
///
/// ```ignore
/// use frizz_openai::OpenAiModelClient;
///
/// let client = OpenAiModelClient::from_env()?;
/// // or
/// let client = OpenAiModelClient::new(OpenAiConfig::new("your-api-key").with_model("gpt-4o"))?;
/// ```
#[derive(Clone)]
pub struct OpenAiModelClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiModelClient {
    /// Create a client; fails if the HTTP client cannot be built
    pub fn new(config: OpenAiConfig) -> frizz_core::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create a client from OPENAI_API_KEY, OPENAI_BASE_URL and FRIZZ_MODEL
    pub fn from_env() -> frizz_core::Result<Self> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Build the request body for a decision
    pub fn build_request(&self, history: &[Message], tools: &[ToolSchema]) -> ChatRequest {
        let (tools, tool_choice) = if tools.is_empty() {
            (None, None)
        } else {
            (Some(render_tools(tools)), Some(self.config.tool_choice))
        };

        ChatRequest {
            model: self.config.model.clone(),
            messages: render_messages(history),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
            tools,
            tool_choice,
        }
    }

    fn parse_decision(
        &self,
        response: OpenAiResponse,
        tools_offered: bool,
    ) -> Result<ToolCallDecision, ModelError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::NoResponse)?;

        let mut tool_calls = choice.message.tool_calls.unwrap_or_default();
        if tool_calls.len() > 1 {
            warn!(
                count = tool_calls.len(),
                "Model returned several tool calls; only the first is used"
            );
        }

        if !tool_calls.is_empty() {
            let call = tool_calls.swap_remove(0);
            let arguments = parse_arguments(&call.function.name, &call.function.arguments)?;
            return Ok(ToolCallDecision::InvokeTool {
                call: ToolCall::new(call.id, call.function.name, arguments),
            });
        }

        if tools_offered && self.config.tool_choice == ToolChoice::Required {
            return Err(ModelError::malformed(
                "tool_choice is 'required' but the model did not call a tool",
            ));
        }

        match choice.message.content {
            Some(text) => Ok(ToolCallDecision::RespondDirectly { text }),
            None => Err(ModelError::NoResponse),
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    async fn decide(
        &self,
        history: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ToolCallDecision, ModelError> {
        let request = self.build_request(history, tools);
        let url = self.config.completions_url();

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = tools.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "OpenAI API request failed");
            return Err(map_status_error(status, error_text));
        }

        let body: OpenAiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(e.to_string())
            } else {
                ModelError::malformed(format!("Failed to parse OpenAI response: {}", e))
            }
        })?;

        if let Some(usage) = &body.usage {
            debug!(
                model = %body.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion received"
            );
        }

        self.parse_decision(body, !tools.is_empty())
    }
}

impl std::fmt::Debug for OpenAiModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiModelClient")
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Convert conversation history to OpenAI messages
pub fn render_messages(history: &[Message]) -> Vec<OpenAiMessage> {
    history
        .iter()
        .map(|message| match (message.role, &message.tool_call) {
            (MessageRole::Assistant, Some(call)) => OpenAiMessage {
                role: "assistant".to_string(),
                content: message.text().filter(|t| !t.is_empty()).map(str::to_string),
                tool_calls: Some(vec![OpenAiToolCall {
                    id: call.id.clone(),
                    r#type: "function".to_string(),
                    function: OpenAiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                }]),
                tool_call_id: None,
            },
            (MessageRole::Tool, call) => OpenAiMessage {
                role: "tool".to_string(),
                content: Some(message.content.to_model_string()),
                tool_calls: None,
                tool_call_id: call.as_ref().map(|c| c.id.clone()),
            },
            (role, _) => OpenAiMessage {
                role: role.to_string(),
                content: Some(message.content.to_model_string()),
                tool_calls: None,
                tool_call_id: None,
            },
        })
        .collect()
}

/// Convert tool schemas to OpenAI function tools
pub fn render_tools(tools: &[ToolSchema]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|tool| OpenAiTool {
            r#type: "function".to_string(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters_json_schema(),
            },
        })
        .collect()
}

// ============================================================================
// Error mapping
// ============================================================================

fn parse_arguments(tool_name: &str, raw: &str) -> Result<Value, ModelError> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|e| {
        ModelError::malformed(format!(
            "Arguments for tool '{}' are not valid JSON: {}",
            tool_name, e
        ))
    })
}

fn map_transport_error(err: reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout(err.to_string())
    } else {
        ModelError::unavailable(format!("Failed to send OpenAI request: {}", err))
    }
}

fn map_status_error(status: StatusCode, body: String) -> ModelError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ModelError::RateLimited(body)
    } else {
        ModelError::unavailable(format!(
            "OpenAI API request failed with status {}: {}",
            status, body
        ))
    }
}
