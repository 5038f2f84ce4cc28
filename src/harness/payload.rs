//! Structured test payload
//!
//! In wrapped mode the request's stdin carries
//! `{"method": "...", "tests": [{"args": [...]}, ...]}`. It is decoded here,
//! in the service, so the generated program never has to parse JSON.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Decoded test payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestPayload {
    pub method: String,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// One test case; its 1-based position in `tests` is its identity
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub args: Vec<Value>,
}

impl TestPayload {
    /// Parse a raw payload. Blank input yields `Ok(None)`.
    pub fn parse(raw: &str) -> Result<Option<Self>, PayloadError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let payload: TestPayload = serde_json::from_str(raw)?;
        if payload.method.trim().is_empty() {
            return Err(PayloadError::MissingMethod);
        }
        Ok(Some(payload))
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("\"method\" must name a method of Solution")]
    MissingMethod,
}

/// A payload value classified the way the harness sees it
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    /// Integer that fits in 32 bits
    Int(i32),
    /// Integer that needs 64 bits
    Long(i64),
    /// Anything with a fraction or exponent, or an integer beyond 64 bits
    Double(f64),
    Str(String),
    List(Vec<ArgValue>),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("objects are not supported as test arguments")]
pub struct ObjectArgument;

impl TryFrom<&Value> for ArgValue {
    type Error = ObjectArgument;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(*b),
            Value::Number(n) => classify_number(n),
            Value::String(s) => ArgValue::Str(s.clone()),
            Value::Array(items) => ArgValue::List(
                items
                    .iter()
                    .map(ArgValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(_) => return Err(ObjectArgument),
        })
    }
}

fn classify_number(n: &serde_json::Number) -> ArgValue {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => ArgValue::Int(small),
            Err(_) => ArgValue::Long(i),
        }
    } else {
        // u64 beyond i64::MAX, or a float
        ArgValue::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl ArgValue {
    /// Name used in conversion error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Bool(_) => "Boolean",
            ArgValue::Int(_) => "Integer",
            ArgValue::Long(_) => "Long",
            ArgValue::Double(_) => "Double",
            ArgValue::Str(_) => "String",
            ArgValue::List(_) => "array",
        }
    }
}
