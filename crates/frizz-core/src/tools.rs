// Tool Abstraction
//
// A Tool is a value: a ToolSchema (name, description, parameter schema) plus
// a handler. Tools are registered with a ToolRegistry and dispatched by name.
//
// Design decisions:
// - Handlers have one fixed signature: (&mut context, validated arguments)
// - The context type `C` is chosen by the application (e.g., a shopping cart)
//   and owned by the ConversationState, never global
// - Handlers are defined via the ToolHandler trait, or from closures via handler_fn
// - The registry keeps registration order so that model prompts are reproducible
// - Duplicate names are rejected instead of silently replacing a tool

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RegistryError, ToolError};
use crate::schema::ObjectSchema;
use crate::tool_types::ToolSchema;

/// Future returned by closure-based handlers
pub type ToolFuture<'a> = BoxFuture<'a, Result<Value, ToolError>>;

// ============================================================================
// ToolArguments - validated arguments
// ============================================================================

/// Arguments that passed schema validation
///
/// Defaults are already filled in. Use `parse` to deserialize them into a
/// typed parameter struct.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments(Value);

impl ToolArguments {
    /// Wrap an already validated value
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Deserialize into a typed parameter struct
    ///
    /// A failure here means the struct and the schema disagree, which is a
    /// bug in the tool, so it is reported as an internal error.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        Ok(serde_json::from_value(self.0.clone())?)
    }

    /// Get a single argument
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

// ============================================================================
// ToolHandler - the executable part of a tool
// ============================================================================

/// Trait for implementing tool handlers.
///
/// # Example
///
/// ```ignore
/// struct AddToCart;
///
/// #[async_trait]
/// impl ToolHandler<Cart> for AddToCart {
///     async fn call(&self, cart: &mut Cart, args: ToolArguments) -> Result<Value, ToolError> {
///         let params: AddParams = args.parse()?;
///         cart.items.push(params.sku.clone());
///         Ok(json!({ "items": cart.items.len() }))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolHandler<C>: Send + Sync {
    /// Execute the tool.
    ///
    /// The context may be mutated freely; mutations are visible to every
    /// later tool call in the same conversation.
    async fn call(&self, context: &mut C, arguments: ToolArguments) -> Result<Value, ToolError>;
}

/// Handler backed by a closure, see [`handler_fn`]
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Create a handler from a closure returning a boxed future
///
/// ```ignore
/// let handler = handler_fn(|ctx: &mut Cart, args| {
///     Box::pin(async move {
///         ctx.items.clear();
///         Ok(json!("cleared"))
///     })
/// });
/// ```
pub fn handler_fn<C, F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut C, ToolArguments) -> ToolFuture<'a> + Send + Sync,
{
    HandlerFn { f }
}

#[async_trait]
impl<C, F> ToolHandler<C> for HandlerFn<F>
where
    C: Send,
    F: for<'a> Fn(&'a mut C, ToolArguments) -> ToolFuture<'a> + Send + Sync,
{
    async fn call(&self, context: &mut C, arguments: ToolArguments) -> Result<Value, ToolError> {
        (self.f)(context, arguments).await
    }
}

// ============================================================================
// Tool
// ============================================================================

/// A named, schema-validated function the model may invoke
pub struct Tool<C> {
    schema: ToolSchema,
    handler: Arc<dyn ToolHandler<C>>,
}

impl<C: Send + 'static> Tool<C> {
    /// Create a tool from a handler
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ObjectSchema,
        handler: impl ToolHandler<C> + 'static,
    ) -> Self {
        Self {
            schema: ToolSchema {
                name: name.into(),
                description: description.into(),
                parameters,
            },
            handler: Arc::new(handler),
        }
    }

    /// Create a tool from a closure (see [`handler_fn`])
    ///
    /// Annotate the context parameter (`|cart: &mut Cart, args| ...`); the
    /// closure is checked before `C` is known.
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ObjectSchema,
        f: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a mut C, ToolArguments) -> ToolFuture<'a> + Send + Sync + 'static,
    {
        Self::new(name, description, parameters, handler_fn(f))
    }
}

impl<C> Tool<C> {
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn description(&self) -> &str {
        &self.schema.description
    }

    pub fn parameters(&self) -> &ObjectSchema {
        &self.schema.parameters
    }

    /// What the model sees of this tool
    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler<C>> {
        &self.handler
    }
}

impl<C> Clone for Tool<C> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C> std::fmt::Debug for Tool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.schema.name)
            .field("description", &self.schema.description)
            .finish()
    }
}

// ============================================================================
// ToolRegistry - Collection of Tools
// ============================================================================

/// Registry of tools keyed by unique name.
///
/// Lookups are O(1); `list_schemas` returns tools in registration order.
/// Once handed to an Agent the registry is shared read-only.
///
/// # Example
///
/// ```ignore
/// let registry = ToolRegistry::builder()
///     .tool(add_tool)
///     .tool(lookup_fact_tool)
///     .build()?;
/// ```
pub struct ToolRegistry<C> {
    tools: Vec<Tool<C>>,
    index: HashMap<String, usize>,
    schemas: Vec<ToolSchema>,
}

impl<C> ToolRegistry<C> {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            schemas: Vec::new(),
        }
    }

    /// Register a tool.
    ///
    /// Fails with `DuplicateTool` if the name is taken; the registry is left
    /// unchanged in that case.
    pub fn register(&mut self, tool: Tool<C>) -> Result<(), RegistryError> {
        if self.index.contains_key(tool.name()) {
            return Err(RegistryError::DuplicateTool(tool.name().to_string()));
        }

        self.index.insert(tool.name().to_string(), self.tools.len());
        self.schemas.push(tool.schema().clone());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Result<&Tool<C>, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// Schemas of all tools, in registration order
    pub fn list_schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Iterate over tools in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Tool<C>> {
        self.tools.iter()
    }

    /// Create a builder for fluent tool registration
    pub fn builder() -> ToolRegistryBuilder<C> {
        ToolRegistryBuilder::new()
    }
}

impl<C> Default for ToolRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for ToolRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            tools: self.tools.clone(),
            index: self.index.clone(),
            schemas: self.schemas.clone(),
        }
    }
}

impl<C> std::fmt::Debug for ToolRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

// ============================================================================
// ToolRegistryBuilder - Fluent API for Building Registry
// ============================================================================

/// Builder for creating a ToolRegistry with a fluent API.
///
/// The first duplicate registration is remembered and reported by `build`.
pub struct ToolRegistryBuilder<C> {
    registry: ToolRegistry<C>,
    error: Option<RegistryError>,
}

impl<C> ToolRegistryBuilder<C> {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
            error: None,
        }
    }

    /// Add a tool to the registry
    pub fn tool(mut self, tool: Tool<C>) -> Self {
        if let Err(err) = self.registry.register(tool) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Add several tools, in order
    pub fn tools(mut self, tools: impl IntoIterator<Item = Tool<C>>) -> Self {
        for tool in tools {
            self = self.tool(tool);
        }
        self
    }

    /// Build the registry
    pub fn build(self) -> Result<ToolRegistry<C>, RegistryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.registry),
        }
    }
}

impl<C> Default for ToolRegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, ParameterSchema};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Default)]
    struct Counter {
        calls: usize,
    }

    fn named(name: &str) -> Tool<Counter> {
        Tool::from_fn(
            name,
            format!("{} tool", name),
            ObjectSchema::new(),
            |ctx: &mut Counter, _args| {
                Box::pin(async move {
                    ctx.calls += 1;
                    Ok(json!(ctx.calls))
                })
            },
        )
    }

    struct Echo;

    #[async_trait]
    impl ToolHandler<Counter> for Echo {
        async fn call(
            &self,
            _context: &mut Counter,
            arguments: ToolArguments,
        ) -> Result<Value, ToolError> {
            Ok(arguments.into_value())
        }
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = ToolRegistry::builder()
            .tool(named("zeta"))
            .tool(named("alpha"))
            .tool(named("mid"))
            .build()
            .unwrap();

        let schemas = registry.list_schemas();
        assert_eq!(schemas.len(), 3);
        for (i, schema) in schemas.iter().enumerate() {
            let tool = registry.get(&schema.name).unwrap();
            assert_eq!(tool.schema(), &schemas[i]);
        }
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = ToolRegistry::new();
        registry.register(named("add")).unwrap();

        let duplicate = Tool::new("add", "a different add", ObjectSchema::new(), Echo);
        let err = registry.register(duplicate).unwrap_err();

        assert_eq!(err, RegistryError::DuplicateTool("add".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("add").unwrap().description(), "add tool");
    }

    #[test]
    fn test_builder_reports_duplicates() {
        let err = ToolRegistry::builder()
            .tool(named("a"))
            .tool(named("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("a".to_string()));
    }

    #[test]
    fn test_builder_adds_many_in_order() {
        let registry = ToolRegistry::builder()
            .tool(named("first"))
            .tools(["second", "third"].into_iter().map(named))
            .build()
            .unwrap();
        assert_eq!(registry.names(), vec!["first", "second", "third"]);

        let err = ToolRegistry::builder()
            .tools(vec![named("x"), named("y"), named("x")])
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("x".to_string()));
    }

    #[test]
    fn test_unknown_tool_lookup() {
        let registry: ToolRegistry<Counter> = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains("subtract"));
        assert_eq!(
            registry.get("subtract").unwrap_err(),
            RegistryError::UnknownTool("subtract".to_string())
        );
    }

    #[tokio::test]
    async fn test_closure_handler_mutates_context() {
        let tool = named("count");
        let mut ctx = Counter::default();

        let first = tool
            .handler()
            .call(&mut ctx, ToolArguments::new(json!({})))
            .await
            .unwrap();
        let second = tool
            .handler()
            .call(&mut ctx, ToolArguments::new(json!({})))
            .await
            .unwrap();

        assert_eq!(first, json!(1));
        assert_eq!(second, json!(2));
        assert_eq!(ctx.calls, 2);
    }

    #[tokio::test]
    async fn test_trait_handler() {
        let tool = Tool::new("echo", "Echo arguments", ObjectSchema::new(), Echo);
        let mut ctx = Counter::default();

        let result = tool
            .handler()
            .call(&mut ctx, ToolArguments::new(json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(result, json!({"message": "hi"}));
    }

    #[test]
    fn test_arguments_parse() {
        #[derive(Debug, Deserialize)]
        struct AddParams {
            a: i64,
            b: i64,
        }

        let args = ToolArguments::new(json!({"a": 2, "b": 3}));
        let params: AddParams = args.parse().unwrap();
        assert_eq!(params.a + params.b, 5);
        assert_eq!(args.get("a"), Some(&json!(2)));

        let bad = ToolArguments::new(json!({"a": "x"}));
        assert!(bad.parse::<AddParams>().unwrap_err().is_internal());
    }

    #[test]
    fn test_tool_exposes_schema() {
        let tool = Tool::new(
            "add",
            "Add two integers",
            ObjectSchema::new()
                .field(Field::required("a", ParameterSchema::Integer))
                .field(Field::required("b", ParameterSchema::Integer)),
            Echo,
        );

        assert_eq!(tool.name(), "add");
        assert_eq!(tool.parameters().fields().len(), 2);
        assert_eq!(
            tool.schema().parameters_json_schema()["required"],
            json!(["a", "b"])
        );
    }
}
