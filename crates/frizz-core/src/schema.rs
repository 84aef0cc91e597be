// Parameter schemas for tools
//
// A tool declares its parameters with a structural descriptor instead of a
// raw JSON Schema blob. The descriptor serves two purposes:
// - It is rendered to JSON Schema for the model (`to_json_schema`)
// - It validates the raw arguments chosen by the model (`validate`)
//
// Validation returns a *validated* value: defaults for missing optional
// fields are filled in, integral floats are normalized to integers, and
// explicit nulls on optional fields are dropped. Handlers only ever see
// validated values.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Path of the root value in validation errors
pub const ROOT_PATH: &str = "$";

/// Argument validation failure
///
/// Carries enough detail for the model to correct its call: where the
/// problem is, what was expected and what was actually sent.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Invalid argument at `{path}`: expected {expected}, got {actual}")]
pub struct ValidationError {
    /// Field path (`$` for the root, `a`, `items[2].name`, ...)
    pub path: String,
    /// Human-readable description of the expected shape
    pub expected: String,
    /// Human-readable description of what was found
    pub actual: String,
}

impl ValidationError {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Structural type descriptor for a single value
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSchema {
    /// Any JSON string
    String,
    /// A whole number (integral floats such as `2.0` are accepted and normalized)
    Integer,
    /// Any JSON number
    Number,
    /// `true` or `false`
    Boolean,
    /// One of a fixed set of strings
    Enum(Vec<String>),
    /// Array whose items all match the inner schema
    Array(Box<ParameterSchema>),
    /// Nested object
    Object(ObjectSchema),
    /// Any JSON value, passed through unchecked
    Any,
}

impl ParameterSchema {
    /// Array of `item`
    pub fn array(item: ParameterSchema) -> Self {
        ParameterSchema::Array(Box::new(item))
    }

    /// String restricted to the given values
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParameterSchema::Enum(values.into_iter().map(Into::into).collect())
    }

    /// Nested object
    pub fn object(schema: ObjectSchema) -> Self {
        ParameterSchema::Object(schema)
    }

    /// Short name of the expected type, used in validation errors
    fn expected(&self) -> String {
        match self {
            ParameterSchema::String => "string".to_string(),
            ParameterSchema::Integer => "integer".to_string(),
            ParameterSchema::Number => "number".to_string(),
            ParameterSchema::Boolean => "boolean".to_string(),
            ParameterSchema::Enum(values) => format!("one of {:?}", values),
            ParameterSchema::Array(item) => format!("array of {}", item.expected()),
            ParameterSchema::Object(_) => "object".to_string(),
            ParameterSchema::Any => "any value".to_string(),
        }
    }

    /// Render to JSON Schema
    pub fn to_json_schema(&self) -> Value {
        match self {
            ParameterSchema::String => json!({ "type": "string" }),
            ParameterSchema::Integer => json!({ "type": "integer" }),
            ParameterSchema::Number => json!({ "type": "number" }),
            ParameterSchema::Boolean => json!({ "type": "boolean" }),
            ParameterSchema::Enum(values) => json!({ "type": "string", "enum": values }),
            ParameterSchema::Array(item) => json!({
                "type": "array",
                "items": item.to_json_schema()
            }),
            ParameterSchema::Object(object) => object.to_json_schema(),
            ParameterSchema::Any => json!({}),
        }
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<Value, ValidationError> {
        let mismatch = || ValidationError::new(path, self.expected(), kind_of(value));

        match self {
            ParameterSchema::String => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(mismatch()),
            },
            ParameterSchema::Integer => {
                if value.is_i64() || value.is_u64() {
                    return Ok(value.clone());
                }
                match value.as_f64() {
                    // i64::MAX as f64 rounds up to 2^63, which is already out of range
                    Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                        Ok(Value::from(f as i64))
                    }
                    _ => Err(mismatch()),
                }
            }
            ParameterSchema::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                _ => Err(mismatch()),
            },
            ParameterSchema::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err(mismatch()),
            },
            ParameterSchema::Enum(values) => match value.as_str() {
                Some(s) if values.iter().any(|v| v == s) => Ok(value.clone()),
                Some(s) => Err(ValidationError::new(
                    path,
                    self.expected(),
                    format!("{:?}", s),
                )),
                None => Err(mismatch()),
            },
            ParameterSchema::Array(item) => match value {
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| item.validate_at(v, &index_path(path, i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                _ => Err(mismatch()),
            },
            ParameterSchema::Object(object) => match value {
                Value::Object(map) => object.validate_map(map, path).map(Value::Object),
                _ => Err(mismatch()),
            },
            ParameterSchema::Any => Ok(value.clone()),
        }
    }
}

/// A named field of an object schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    schema: ParameterSchema,
    description: Option<String>,
    required: bool,
    default: Option<Value>,
}

impl Field {
    /// A field the model must always provide
    pub fn required(name: impl Into<String>, schema: ParameterSchema) -> Self {
        Self {
            name: name.into(),
            schema,
            description: None,
            required: true,
            default: None,
        }
    }

    /// A field the model may omit
    pub fn optional(name: impl Into<String>, schema: ParameterSchema) -> Self {
        Self {
            required: false,
            ..Self::required(name, schema)
        }
    }

    /// Describe the field for the model
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Value used when the field is omitted (makes the field optional)
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = self.schema.to_json_schema();
        if let Value::Object(map) = &mut schema {
            if let Some(description) = &self.description {
                map.insert("description".to_string(), json!(description));
            }
            if let Some(default) = &self.default {
                map.insert("default".to_string(), default.clone());
            }
        }
        schema
    }
}

/// Schema of a JSON object with named fields
///
/// Tool parameters are always an object schema. Fields keep their declaration
/// order. Undeclared fields are rejected unless `allow_additional_properties`
/// is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    fields: Vec<Field>,
    allow_additional: bool,
}

impl ObjectSchema {
    /// Create an object schema without fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; a field with the same name is replaced in place
    pub fn field(mut self, field: Field) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Accept (and pass through) fields that are not declared
    pub fn allow_additional_properties(mut self) -> Self {
        self.allow_additional = true;
        self
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a declared field
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render to JSON Schema (`{"type": "object", "properties": ...}`)
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.allow_additional
        })
    }

    /// Validate raw tool arguments
    ///
    /// `null` is accepted as "no arguments" and validated as `{}`.
    pub fn validate(&self, raw: &Value) -> Result<Value, ValidationError> {
        match raw {
            Value::Null => self.validate_map(&Map::new(), ROOT_PATH).map(Value::Object),
            Value::Object(map) => self.validate_map(map, ROOT_PATH).map(Value::Object),
            other => Err(ValidationError::new(ROOT_PATH, "object", kind_of(other))),
        }
    }

    fn validate_map(
        &self,
        map: &Map<String, Value>,
        path: &str,
    ) -> Result<Map<String, Value>, ValidationError> {
        let mut validated = Map::new();

        for field in &self.fields {
            let field_path = field_path(path, &field.name);
            match map.get(&field.name) {
                None | Some(Value::Null) if !field.required => {
                    if let Some(default) = &field.default {
                        validated.insert(field.name.clone(), default.clone());
                    }
                }
                None => {
                    return Err(ValidationError::new(
                        field_path,
                        field.schema.expected(),
                        "missing",
                    ))
                }
                Some(value) => {
                    let value = field.schema.validate_at(value, &field_path)?;
                    validated.insert(field.name.clone(), value);
                }
            }
        }

        for (key, value) in map {
            if self.get_field(key).is_some() {
                continue;
            }
            if !self.allow_additional {
                let declared: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
                return Err(ValidationError::new(
                    field_path(path, key),
                    format!("one of the declared fields {:?}", declared),
                    "unexpected field",
                ));
            }
            validated.insert(key.clone(), value.clone());
        }

        Ok(validated)
    }
}

impl Serialize for ObjectSchema {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_schema().serialize(serializer)
    }
}

/// JSON type name of a value, as reported in validation errors
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn field_path(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
