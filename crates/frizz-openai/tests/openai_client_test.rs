// Integration tests for the OpenAI model client
//
// A wiremock server stands in for the chat completions endpoint, so these
// tests check the request we send and how each kind of reply is mapped.

use frizz_core::{
    memory::InMemoryEventEmitter, Agent, AgentConfig, AgentError, Field, Message, ModelClient,
    ModelError, ObjectSchema, ParameterSchema, Tool, ToolCallDecision, ToolRegistry, ToolSchema,
};
use frizz_openai::{OpenAiConfig, OpenAiModelClient, ToolChoice};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiModelClient {
    client_with(server, |config| config)
}

fn client_with(
    server: &MockServer,
    configure: impl FnOnce(OpenAiConfig) -> OpenAiConfig,
) -> OpenAiModelClient {
    let config = OpenAiConfig::new("sk-test")
        .with_base_url(format!("{}/v1", server.uri()))
        .with_model("gpt-test");
    OpenAiModelClient::new(configure(config)).unwrap()
}

fn add_schema() -> ToolSchema {
    ToolSchema {
        name: "add".to_string(),
        description: "Add two integers".to_string(),
        parameters: ObjectSchema::new()
            .field(Field::required("a", ParameterSchema::Integer))
            .field(Field::required("b", ParameterSchema::Integer)),
    }
}

fn text_reply(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

fn tool_reply(calls: Value) -> Value {
    json!({
        "id": "chatcmpl-2",
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": null, "tool_calls": calls},
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 8, "total_tokens": 28}
    })
}

// =============================================================================
// Request rendering
// =============================================================================

#[tokio::test]
async fn test_request_carries_history_and_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "stream": false,
            "tool_choice": "auto",
            "messages": [
                {"role": "system", "content": "You add numbers"},
                {"role": "user", "content": "2 + 3?"}
            ],
            "tools": [{"type": "function", "function": {"name": "add"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let history = vec![Message::system("You add numbers"), Message::user("2 + 3?")];

    let decision = client.decide(&history, &[add_schema()]).await.unwrap();
    assert_eq!(decision, ToolCallDecision::respond("ok"));
}

// =============================================================================
// Response mapping
// =============================================================================

#[tokio::test]
async fn test_first_tool_call_becomes_decision() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_reply(json!([
            {"id": "call_a", "type": "function",
             "function": {"name": "add", "arguments": "{\"a\":2,\"b\":3}"}},
            {"id": "call_b", "type": "function",
             "function": {"name": "add", "arguments": "{\"a\":4,\"b\":5}"}}
        ]))))
        .mount(&server)
        .await;

    let decision = client_for(&server)
        .decide(&[Message::user("2 + 3?")], &[add_schema()])
        .await
        .unwrap();

    match decision {
        ToolCallDecision::InvokeTool { call } => {
            assert_eq!(call.id, "call_a");
            assert_eq!(call.name, "add");
            assert_eq!(call.arguments, json!({"a": 2, "b": 3}));
        }
        other => panic!("expected a tool call, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_arguments_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_reply(json!([
            {"id": "call_a", "type": "function",
             "function": {"name": "add", "arguments": "{\"a\": 2, "}}
        ]))))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .decide(&[Message::user("2 + 3?")], &[add_schema()])
        .await
        .unwrap_err();

    assert!(matches!(err, ModelError::MalformedDecision(_)));
}

#[tokio::test]
async fn test_required_tool_choice_without_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"tool_choice": "required"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("just text")))
        .mount(&server)
        .await;

    let client = client_with(&server, |c| c.with_tool_choice(ToolChoice::Required));
    let err = client
        .decide(&[Message::user("2 + 3?")], &[add_schema()])
        .await
        .unwrap_err();

    assert!(matches!(err, ModelError::MalformedDecision(_)));
}

#[tokio::test]
async fn test_empty_choices_is_no_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"model": "gpt-test", "choices": []})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .decide(&[Message::user("hi")], &[])
        .await
        .unwrap_err();

    assert_eq!(err, ModelError::NoResponse);
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit reached"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .decide(&[Message::user("hi")], &[])
        .await
        .unwrap_err();

    assert_eq!(err, ModelError::RateLimited("Rate limit reached".to_string()));
}

#[tokio::test]
async fn test_server_error_maps_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .decide(&[Message::user("hi")], &[])
        .await
        .unwrap_err();

    match err {
        ModelError::Unavailable(msg) => assert!(msg.contains("503")),
        other => panic!("expected unavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_server_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_reply("too late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_with(&server, |c| c.with_timeout(Duration::from_millis(100)));
    let err = client
        .decide(&[Message::user("hi")], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ModelError::Timeout(_)));
}

#[tokio::test]
async fn test_unreachable_server_maps_to_unavailable() {
    // Nothing listens on port 1
    let client = OpenAiModelClient::new(
        OpenAiConfig::new("sk-test").with_base_url("http://127.0.0.1:1/v1"),
    )
    .unwrap();

    let err = client
        .decide(&[Message::user("hi")], &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ModelError::Unavailable(_)));
}

// =============================================================================
// Full agent turn over HTTP
// =============================================================================

#[tokio::test]
async fn test_agent_turn_against_mock_server() {
    let server = MockServer::start().await;

    // Second request: the tool result is in the history
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user"},
                {"role": "assistant", "tool_calls": [{"id": "call_a"}]},
                {"role": "tool", "tool_call_id": "call_a", "content": "5"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("2 + 3 = 5")))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;

    // First request: ask for the tool
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tool_reply(json!([
            {"id": "call_a", "type": "function",
             "function": {"name": "add", "arguments": "{\"a\":2,\"b\":3}"}}
        ]))))
        .expect(1)
        .with_priority(2)
        .mount(&server)
        .await;

    let registry = ToolRegistry::builder()
        .tool(Tool::from_fn(
            "add",
            "Add two integers",
            add_schema().parameters,
            |_: &mut (), args| {
                Box::pin(async move {
                    let a = args.get("a").and_then(Value::as_i64).unwrap_or_default();
                    let b = args.get("b").and_then(Value::as_i64).unwrap_or_default();
                    Ok(json!(a + b))
                })
            },
        ))
        .build()
        .unwrap();

    let emitter = InMemoryEventEmitter::new();
    let agent = Agent::new(registry, client_for(&server), AgentConfig::default())
        .with_event_emitter(emitter.clone());
    let mut state = agent.new_state(());

    let result = agent.run("What is 2 + 3?", &mut state).await.unwrap();

    assert_eq!(result.response.as_deref(), Some("2 + 3 = 5"));
    assert_eq!(state.len(), 4);
    assert_eq!(emitter.event_names().await.last(), Some(&"loop_completed"));
}

#[tokio::test]
async fn test_agent_surfaces_model_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let agent: Agent<()> = Agent::new(
        ToolRegistry::new(),
        client_for(&server),
        AgentConfig::default(),
    );
    let mut state = agent.new_state(());

    let err = agent.run("hello", &mut state).await.unwrap_err();
    assert!(matches!(err, AgentError::Model(ModelError::Unavailable(_))));
    assert_eq!(state.len(), 1);
}
