//! Shopping Cart Example - Tools mutating a per-conversation context
//!
//! Each conversation owns its own cart. Tools receive the cart as `&mut Cart`
//! and every change is visible to later tool calls and to the caller.
//!
//! The example shows:
//! 1. Implementing ToolHandler on a struct, and closures via Tool::from_fn
//! 2. Enum and defaulted parameters
//! 3. Two independent conversations served by one Agent
//! 4. Serializing a conversation (history + context) to JSON
//!
//! Run with: cargo run -p frizz-core --example shopping_cart

use async_trait::async_trait;
use frizz_core::{
    memory::MockModelClient, Agent, AgentConfig, Field, ObjectSchema, ParameterSchema, Tool,
    ToolArguments, ToolCallDecision, ToolError, ToolHandler, ToolRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

const CATALOG: [(&str, u32); 4] = [("apple", 50), ("bread", 250), ("milk", 120), ("tea", 400)];

#[derive(Debug, Default, Serialize, Deserialize)]
struct Cart {
    /// sku -> quantity
    lines: BTreeMap<String, u32>,
    checked_out: bool,
}

impl Cart {
    fn total_cents(&self) -> u32 {
        self.lines
            .iter()
            .map(|(sku, qty)| price_of(sku).unwrap_or(0) * qty)
            .sum()
    }
}

fn price_of(sku: &str) -> Option<u32> {
    CATALOG.iter().find(|(s, _)| *s == sku).map(|(_, p)| *p)
}

#[derive(Deserialize)]
struct ItemParams {
    sku: String,
    quantity: u32,
}

struct AddItem;

#[async_trait]
impl ToolHandler<Cart> for AddItem {
    async fn call(&self, cart: &mut Cart, args: ToolArguments) -> Result<Value, ToolError> {
        if cart.checked_out {
            return Err(ToolError::message("The cart is already checked out"));
        }
        let params: ItemParams = args.parse()?;
        *cart.lines.entry(params.sku.clone()).or_insert(0) += params.quantity;
        Ok(json!({ "sku": params.sku, "quantity": cart.lines[&params.sku] }))
    }
}

struct RemoveItem;

#[async_trait]
impl ToolHandler<Cart> for RemoveItem {
    async fn call(&self, cart: &mut Cart, args: ToolArguments) -> Result<Value, ToolError> {
        let params: ItemParams = args.parse()?;
        let Some(current) = cart.lines.get_mut(&params.sku) else {
            return Err(ToolError::message(format!("{} is not in the cart", params.sku)));
        };
        *current = current.saturating_sub(params.quantity);
        if *current == 0 {
            cart.lines.remove(&params.sku);
        }
        Ok(json!({ "removed": params.sku }))
    }
}

fn item_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(Field::required(
            "sku",
            ParameterSchema::enumeration(CATALOG.iter().map(|(sku, _)| *sku)),
        ))
        .field(
            Field::optional("quantity", ParameterSchema::Integer)
                .default(1)
                .description("How many units"),
        )
}

fn registry() -> Result<ToolRegistry<Cart>, frizz_core::RegistryError> {
    ToolRegistry::builder()
        .tool(Tool::new("add_item", "Add units of a product", item_schema(), AddItem))
        .tool(Tool::new(
            "remove_item",
            "Remove units of a product",
            item_schema(),
            RemoveItem,
        ))
        .tool(Tool::from_fn(
            "view_cart",
            "Show cart contents and total",
            ObjectSchema::new(),
            |cart: &mut Cart, _| {
                Box::pin(async move {
                    Ok(json!({ "lines": cart.lines, "total_cents": cart.total_cents() }))
                })
            },
        ))
        .tool(Tool::from_fn(
            "checkout",
            "Check out the cart",
            ObjectSchema::new(),
            |cart: &mut Cart, _| {
                Box::pin(async move {
                    if cart.lines.is_empty() {
                        return Err(ToolError::message("Cannot check out an empty cart"));
                    }
                    cart.checked_out = true;
                    Ok(json!(format!("Charged {} cents", cart.total_cents())))
                })
            },
        ))
        .build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Shopping Cart (frizz-core) ===\n");

    let model = MockModelClient::new(vec![
        // Alice
        ToolCallDecision::invoke("add_item", json!({"sku": "apple", "quantity": 3})),
        ToolCallDecision::invoke("add_item", json!({"sku": "tea"})),
        ToolCallDecision::respond("Added 3 apples and a tea."),
        // Bob
        ToolCallDecision::invoke("remove_item", json!({"sku": "milk"})),
        ToolCallDecision::invoke("add_item", json!({"sku": "bananas"})),
        ToolCallDecision::invoke("add_item", json!({"sku": "bread", "quantity": 2})),
        ToolCallDecision::respond("No bananas, but I added two breads."),
        // Alice again
        ToolCallDecision::invoke("view_cart", json!(null)),
        ToolCallDecision::invoke("checkout", json!({})),
        ToolCallDecision::respond("Done! You paid 5.50."),
    ]);

    let agent = Agent::new(
        registry()?,
        model,
        AgentConfig::new().with_system_prompt("You run a small grocery shop."),
    );

    let mut alice = agent.new_state(Cart::default());
    let mut bob = agent.new_state(Cart::default());

    let turns = [
        ("alice", "Three apples and some tea, please"),
        ("bob", "Take out the milk and add bananas or bread"),
        ("alice", "What do I owe? Check me out."),
    ];

    for (who, text) in turns {
        let state = if who == "alice" { &mut alice } else { &mut bob };
        let result = agent.run(text, state).await?;

        println!("{}: {}", who, text);
        for message in &state.history()[result.appended.clone()] {
            if let Some(payload) = message.tool_result_payload() {
                println!("    [tool] {}", payload.to_model_string());
            }
        }
        println!("assistant: {}\n", result.response.unwrap_or_default());
    }

    println!("Alice's cart: {:?}", alice.context());
    println!("Bob's cart:   {:?}\n", bob.context());

    println!("Bob's conversation as JSON:");
    println!("{}", serde_json::to_string_pretty(&bob)?);

    Ok(())
}
