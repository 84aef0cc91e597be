//! Basic Assistant Example - Calculator tools with a scripted model
//!
//! Shows the full decision loop without any network access:
//! 1. Registering tools with parameter schemas
//! 2. A model asking for a tool that does not exist, then recovering
//! 3. A model sending invalid arguments, then correcting itself
//! 4. A tool refusing a request with a user-visible error
//!
//! Run with: cargo run -p frizz-core --example basic_assistant
//! Set RUST_LOG=frizz_core=debug to see the loop's tracing output.

use frizz_core::{
    memory::{InMemoryEventEmitter, MockModelClient},
    Agent, AgentConfig, Field, Message, MessageRole, ObjectSchema, ParameterSchema, Tool,
    ToolCallDecision, ToolError, ToolRegistry,
};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct BinaryParams {
    a: f64,
    b: f64,
}

fn binary_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(Field::required("a", ParameterSchema::Number).description("Left operand"))
        .field(Field::required("b", ParameterSchema::Number).description("Right operand"))
}

fn calculator() -> Result<ToolRegistry<()>, frizz_core::RegistryError> {
    ToolRegistry::builder()
        .tool(Tool::from_fn(
            "add",
            "Add two numbers",
            binary_schema(),
            |_: &mut (), args| {
                Box::pin(async move {
                    let p: BinaryParams = args.parse()?;
                    Ok(json!(p.a + p.b))
                })
            },
        ))
        .tool(Tool::from_fn(
            "multiply",
            "Multiply two numbers",
            binary_schema(),
            |_: &mut (), args| {
                Box::pin(async move {
                    let p: BinaryParams = args.parse()?;
                    Ok(json!(p.a * p.b))
                })
            },
        ))
        .tool(Tool::from_fn(
            "divide",
            "Divide a by b",
            binary_schema(),
            |_: &mut (), args| {
                Box::pin(async move {
                    let p: BinaryParams = args.parse()?;
                    if p.b == 0.0 {
                        return Err(ToolError::message("Cannot divide by zero"));
                    }
                    Ok(json!(p.a / p.b))
                })
            },
        ))
        .build()
}

fn print_history(history: &[Message]) {
    for message in history {
        match (&message.role, &message.tool_call) {
            (MessageRole::Assistant, Some(call)) => {
                println!("  assistant -> {}({})", call.name, call.arguments)
            }
            (MessageRole::Tool, _) => println!("  tool      <- {}", message.content.to_model_string()),
            (role, _) => println!(
                "  {:<9} {}",
                role.to_string(),
                message.content.to_model_string()
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Basic Assistant (frizz-core) ===\n");

    let model = MockModelClient::new(vec![
        // Turn 1: unknown tool, then the right one
        ToolCallDecision::invoke("subtract", json!({"a": 10, "b": 4})),
        ToolCallDecision::invoke("add", json!({"a": 10, "b": -4})),
        ToolCallDecision::respond("10 - 4 = 6"),
        // Turn 2: invalid arguments, then corrected
        ToolCallDecision::invoke("multiply", json!({"a": "six", "b": 7})),
        ToolCallDecision::invoke("multiply", json!({"a": 6, "b": 7})),
        ToolCallDecision::respond("6 x 7 = 42"),
        // Turn 3: the tool refuses
        ToolCallDecision::invoke("divide", json!({"a": 1, "b": 0})),
        ToolCallDecision::respond("Dividing by zero is undefined."),
    ]);

    let emitter = InMemoryEventEmitter::new();
    let agent = Agent::new(
        calculator()?,
        model,
        AgentConfig::new()
            .with_system_prompt("You are a calculator. Use the tools for arithmetic.")
            .with_max_iterations(4),
    )
    .with_event_emitter(emitter.clone());

    let mut state = agent.new_state(());

    for question in ["What is 10 - 4?", "And 6 times 7?", "What is 1 / 0?"] {
        println!("User: {}", question);
        let result = agent.run(question, &mut state).await?;
        print_history(&state.history()[result.appended.clone()]);
        println!(
            "Assistant: {} (tool calls: {})\n",
            result.response.unwrap_or_default(),
            result.round_trips
        );
    }

    println!("Events emitted: {}", emitter.events().await.len());
    println!("Messages in history: {}", state.len());

    Ok(())
}
