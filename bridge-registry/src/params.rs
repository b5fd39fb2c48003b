//! Parameter specifications and pre-invocation validation.

use std::fmt;

use serde_json::{Map, Number, Value, json};
use thiserror::Error;

/// Caller-supplied parameters for a single tool call.
pub type ParameterBag = Map<String, Value>;

/// Expected kind of a tool parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Accepts any JSON value.
    Any,
    /// `true`/`false`, also `"true"`/`"false"` and `0`/`1`.
    Boolean,
    /// Integral numbers in the `i64` range; whole floats and numeric strings are coerced.
    Integer,
    /// Any finite number; numeric strings are coerced.
    Number,
    /// Strings only.
    String,
    /// Arrays whose elements all match the inner kind.
    Array(Box<ParamKind>),
    /// JSON objects.
    Object,
}

impl ParamKind {
    /// Shorthand for an array of the supplied element kind.
    #[must_use]
    pub fn array_of(item: ParamKind) -> Self {
        Self::Array(Box::new(item))
    }

    /// Returns a JSON-Schema fragment describing this kind.
    #[must_use]
    pub fn schema(&self) -> Value {
        match self {
            Self::Any => json!({}),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Number => json!({ "type": "number" }),
            Self::String => json!({ "type": "string" }),
            Self::Array(item) => json!({ "type": "array", "items": item.schema() }),
            Self::Object => json!({ "type": "object" }),
        }
    }

    /// Coerces `value` into this kind, returning a description of the
    /// offending value on mismatch.
    fn coerce(&self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (Self::Any, value) => Ok(value),
            (Self::Boolean, Value::Bool(flag)) => Ok(Value::Bool(flag)),
            (Self::Boolean, Value::String(text)) => match text.trim().to_ascii_lowercase().as_str()
            {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("string {text:?}")),
            },
            (Self::Boolean, Value::Number(number)) => match number.as_u64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(format!("number {number}")),
            },
            (Self::Integer, Value::Number(number)) => {
                integral(&number).ok_or_else(|| format!("number {number}"))
            }
            (Self::Integer, Value::String(text)) => text
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("string {text:?}")),
            (Self::Number, Value::Number(number)) => Ok(Value::Number(number)),
            (Self::Number, Value::String(text)) => {
                parse_number(text.trim()).ok_or_else(|| format!("string {text:?}"))
            }
            (Self::String, Value::String(text)) => Ok(Value::String(text)),
            (Self::Object, Value::Object(map)) => Ok(Value::Object(map)),
            (Self::Array(item), Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, element)| {
                    item.coerce(element)
                        .map_err(|found| format!("array with {found} at index {index}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (_, other) => Err(describe(&other).to_owned()),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Array(item) => write!(f, "array of {item}"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// Exclusive upper bound of the `i64` range as a float (2^63).
const I64_UPPER_BOUND: f64 = 9.223_372_036_854_775_808e18;

/// Accepts numbers representable as `i64`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn integral(number: &Number) -> Option<Value> {
    if let Some(integer) = number.as_i64() {
        return Some(Value::from(integer));
    }
    if number.is_u64() {
        return None;
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float < I64_UPPER_BOUND {
        return Some(Value::from(float as i64));
    }
    None
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Value::from(integer));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Declared parameter of a tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    required: bool,
    kind: ParamKind,
    description: Option<String>,
}

impl ParamSpec {
    /// Declares a parameter that must be supplied.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            required: true,
            kind,
            description: None,
        }
    }

    /// Declares a parameter that may be omitted or passed as `null`.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Attaches a human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the parameter must be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the expected kind.
    #[must_use]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Reasons a parameter bag is rejected before invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    /// A required parameter was absent.
    #[error("missing required parameter '{name}'")]
    Missing {
        /// Name of the missing parameter.
        name: String,
    },

    /// The bag carried a parameter the tool does not declare.
    #[error("unexpected parameter '{name}'")]
    Unexpected {
        /// Name of the undeclared parameter.
        name: String,
    },

    /// A value could not be coerced to the declared kind.
    #[error("parameter '{name}' expected {expected}, got {found}")]
    Mismatch {
        /// Name of the offending parameter.
        name: String,
        /// Declared kind.
        expected: String,
        /// Description of the supplied value.
        found: String,
    },
}

/// Validates `bag` against `specs`, returning the coerced bag.
///
/// Optional parameters given as `null` are dropped so handlers observe them as
/// absent.
///
/// # Errors
///
/// Returns the first [`ParamError`] encountered; undeclared keys are reported
/// before missing or mistyped ones.
pub fn validate(specs: &[ParamSpec], mut bag: ParameterBag) -> Result<ParameterBag, ParamError> {
    if let Some(name) = bag
        .keys()
        .find(|key| !specs.iter().any(|spec| spec.name == **key))
    {
        return Err(ParamError::Unexpected { name: name.clone() });
    }

    let mut coerced = ParameterBag::new();
    for spec in specs {
        match bag.remove(&spec.name) {
            None => {
                if spec.required {
                    return Err(ParamError::Missing {
                        name: spec.name.clone(),
                    });
                }
            }
            Some(Value::Null) if !spec.required => {}
            Some(value) => {
                let value = spec.kind.coerce(value).map_err(|found| ParamError::Mismatch {
                    name: spec.name.clone(),
                    expected: spec.kind.to_string(),
                    found,
                })?;
                coerced.insert(spec.name.clone(), value);
            }
        }
    }

    Ok(coerced)
}

/// Builds a JSON-Schema object for a parameter list.
#[must_use]
pub fn input_schema(specs: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for spec in specs {
        let mut schema = spec.kind.schema();
        if let (Some(description), Value::Object(fields)) = (&spec.description, &mut schema) {
            fields.insert("description".into(), Value::String(description.clone()));
        }
        properties.insert(spec.name.clone(), schema);
        if spec.required {
            required.push(Value::String(spec.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
