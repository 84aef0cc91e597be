//! OpenAI Assistant Example - Multi-tool decisions with a real model
//!
//! The model chooses between two tools (a fact lookup and a unit converter)
//! or answers directly. The context records which facts were looked up.
//!
//! Prerequisites:
//! - Set OPENAI_API_KEY (a `.env` file is picked up)
//! - Optionally OPENAI_BASE_URL and FRIZZ_MODEL
//!
//! Run with: cargo run -p frizz-openai --example openai_assistant

use frizz_core::{
    Agent, AgentConfig, Field, ObjectSchema, ParameterSchema, Tool, ToolError, ToolRegistry,
};
use frizz_openai::OpenAiModelClient;
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Research {
    looked_up: Vec<String>,
}

const FACTS: [(&str, &str); 3] = [
    ("mars", "Mars has a mean radius of 3389.5 km."),
    ("everest", "Mount Everest is 8849 m tall."),
    ("marathon", "A marathon is 42.195 km long."),
];

#[derive(Deserialize)]
struct LookupParams {
    topic: String,
}

#[derive(Deserialize)]
struct ConvertParams {
    value: f64,
    from: String,
    to: String,
}

fn registry() -> Result<ToolRegistry<Research>, frizz_core::RegistryError> {
    let units = ["km", "mi", "m", "ft"];

    ToolRegistry::builder()
        .tool(Tool::from_fn(
            "lookup_fact",
            "Look up a fact about a topic",
            ObjectSchema::new().field(Field::required(
                "topic",
                ParameterSchema::enumeration(FACTS.iter().map(|(topic, _)| *topic)),
            )),
            |research: &mut Research, args| {
                Box::pin(async move {
                    let params: LookupParams = args.parse()?;
                    research.looked_up.push(params.topic.clone());
                    FACTS
                        .iter()
                        .find(|(topic, _)| *topic == params.topic)
                        .map(|(_, fact)| json!(fact))
                        .ok_or_else(|| ToolError::message("No fact for that topic"))
                })
            },
        ))
        .tool(Tool::from_fn(
            "convert_length",
            "Convert a length between units",
            ObjectSchema::new()
                .field(Field::required("value", ParameterSchema::Number))
                .field(Field::required("from", ParameterSchema::enumeration(units)))
                .field(Field::required("to", ParameterSchema::enumeration(units))),
            |_: &mut Research, args| {
                Box::pin(async move {
                    let p: ConvertParams = args.parse()?;
                    let metres = p.value * metres_per(&p.from)?;
                    let converted = metres / metres_per(&p.to)?;
                    Ok(json!({ "value": converted, "unit": p.to }))
                })
            },
        ))
        .build()
}

fn metres_per(unit: &str) -> Result<f64, ToolError> {
    match unit {
        "km" => Ok(1000.0),
        "mi" => Ok(1609.344),
        "m" => Ok(1.0),
        "ft" => Ok(0.3048),
        other => Err(ToolError::message(format!("Unsupported unit: {}", other))),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("frizz_core=info,frizz_openai=info")),
        )
        .init();

    let model = match OpenAiModelClient::from_env() {
        Ok(model) => model,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!("  export OPENAI_API_KEY=your-key");
            std::process::exit(1);
        }
    };

    println!("=== OpenAI Assistant (frizz-openai) ===\n");
    println!("Model: {}\n", model.config().model);

    let config = AgentConfig::from_env()?.with_system_prompt(
        "You are a research assistant. Use lookup_fact for facts and \
         convert_length for unit conversions. Answer in one sentence.",
    );
    let agent = Agent::new(registry()?, model, config);
    let mut state = agent.new_state(Research::default());

    for question in [
        "How tall is Everest in feet?",
        "How long is a marathon in miles?",
        "Thanks! What did we talk about?",
    ] {
        println!("User: {}", question);
        let result = agent.run(question, &mut state).await?;
        println!(
            "Assistant: {}\n  (tool calls: {})\n",
            result.response.unwrap_or_default(),
            result.round_trips
        );
    }

    println!("Topics looked up: {:?}", state.context().looked_up);
    Ok(())
}
