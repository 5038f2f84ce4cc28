//! Static type marshaler
//!
//! Converts payload values into Java expressions of the declared parameter
//! type, e.g. `[[1,2],[3]]` against `int[][]` becomes
//! `new int[][] {new int[] {1, 2}, new int[] {3}}`.
//!
//! Integer overflow policy, shared with `SolutionHarness.convert`: an integer
//! going into a 32-bit target keeps its low 32 bits; a floating value going
//! into an integer target truncates toward zero and saturates. Both are
//! Java's own narrowing conversions.

use thiserror::Error;

use super::java;
use super::payload::ArgValue;
use super::signature::{JavaType, Primitive};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    #[error("expected {expected} but got {found}")]
    Mismatch {
        expected: String,
        found: &'static str,
    },
    #[error("null cannot be passed as {0}")]
    NullPrimitive(&'static str),
    #[error("cannot parse \"{text}\" as {expected}")]
    BadNumber { expected: &'static str, text: String },
    #[error("expected a single character but got \"{0}\"")]
    BadChar(String),
    #[error("unsupported array component type {0}")]
    UnsupportedComponent(String),
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        source: Box<MarshalError>,
    },
}

/// Render `value` as a Java expression assignable to `ty`
pub fn marshal(value: &ArgValue, ty: &JavaType) -> Result<String, MarshalError> {
    match ty {
        JavaType::Primitive(p) => {
            if *value == ArgValue::Null {
                return Err(MarshalError::NullPrimitive(p.java_name()));
            }
            scalar(value, *p)
        }
        JavaType::Boxed(p) => match value {
            ArgValue::Null => Ok("null".to_string()),
            _ => scalar(value, *p),
        },
        JavaType::String => match value {
            ArgValue::Null => Ok("null".to_string()),
            ArgValue::Str(s) => Ok(java::string_literal(s)),
            ArgValue::Int(v) => Ok(java::string_literal(&v.to_string())),
            ArgValue::Long(v) => Ok(java::string_literal(&v.to_string())),
            ArgValue::Bool(b) => Ok(java::string_literal(&b.to_string())),
            // Java's own double formatting, e.g. 1.0E20
            ArgValue::Double(d) => Ok(format!("String.valueOf({})", double_literal(*d))),
            other => Err(mismatch(ty, other)),
        },
        JavaType::Array(component) => array(value, ty, component),
        JavaType::Object(_) => Ok(untyped(value)),
    }
}

/// Render `value` without a target type; the runtime marshaler converts it
pub fn untyped(value: &ArgValue) -> String {
    match value {
        ArgValue::Null => "null".to_string(),
        ArgValue::Bool(b) => b.to_string(),
        ArgValue::Int(v) => v.to_string(),
        ArgValue::Long(v) => format!("{}L", v),
        ArgValue::Double(d) => double_literal(*d),
        ArgValue::Str(s) => java::string_literal(s),
        ArgValue::List(items) => {
            let elements: Vec<String> = items.iter().map(untyped).collect();
            format!("new Object[] {{{}}}", elements.join(", "))
        }
    }
}

fn array(value: &ArgValue, ty: &JavaType, component: &JavaType) -> Result<String, MarshalError> {
    if !supported_component(component) {
        return Err(MarshalError::UnsupportedComponent(component.java_name()));
    }

    let items = match value {
        ArgValue::Null => return Ok("null".to_string()),
        ArgValue::List(items) => items,
        other => return Err(mismatch(ty, other)),
    };

    let elements = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            marshal(item, component).map_err(|e| MarshalError::Element {
                index,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("new {} {{{}}}", ty.java_name(), elements.join(", ")))
}

pub(super) fn supported_component(component: &JavaType) -> bool {
    match component {
        JavaType::Primitive(_) | JavaType::Boxed(_) | JavaType::String => true,
        JavaType::Array(inner) => supported_component(inner),
        JavaType::Object(name) => name == "Object",
    }
}

/// A payload value converted to a Java primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Scalar {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Char(char),
}

impl Scalar {
    fn literal(self) -> String {
        match self {
            Scalar::Int(v) => v.to_string(),
            Scalar::Long(v) => format!("{}L", v),
            Scalar::Double(d) => double_literal(d),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Char(c) => {
                java::char_literal(c).unwrap_or_else(|| format!("(char) {}", u32::from(c)))
            }
        }
    }
}

fn scalar(value: &ArgValue, target: Primitive) -> Result<String, MarshalError> {
    coerce(value, target).map(Scalar::literal)
}

/// Convert a non-null payload value to `target`
pub(super) fn coerce(value: &ArgValue, target: Primitive) -> Result<Scalar, MarshalError> {
    match target {
        Primitive::Int => to_i32(value).map(Scalar::Int),
        Primitive::Long => to_i64(value, target).map(Scalar::Long),
        Primitive::Double => to_f64(value, target).map(Scalar::Double),
        Primitive::Boolean => match value {
            ArgValue::Bool(b) => Ok(Scalar::Bool(*b)),
            ArgValue::Str(s) if s.eq_ignore_ascii_case("true") => Ok(Scalar::Bool(true)),
            ArgValue::Str(s) if s.eq_ignore_ascii_case("false") => Ok(Scalar::Bool(false)),
            ArgValue::Str(s) => Err(MarshalError::BadNumber {
                expected: "boolean",
                text: s.clone(),
            }),
            other => Err(mismatch(&JavaType::Primitive(target), other)),
        },
        Primitive::Char => match value {
            ArgValue::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.len_utf16() == 1 => Ok(Scalar::Char(c)),
                    _ => Err(MarshalError::BadChar(s.clone())),
                }
            }
            other => Err(mismatch(&JavaType::Primitive(target), other)),
        },
    }
}

/// Java `(int)` narrowing: doubles saturate, longs keep their low 32 bits
fn to_i32(value: &ArgValue) -> Result<i32, MarshalError> {
    match value {
        ArgValue::Double(d) => Ok(*d as i32),
        ArgValue::Str(s) => to_i32(&parse_numeric_string(s, Primitive::Int)?),
        other => Ok(to_i64(other, Primitive::Int)? as i32),
    }
}

fn to_i64(value: &ArgValue, target: Primitive) -> Result<i64, MarshalError> {
    match value {
        ArgValue::Int(v) => Ok(i64::from(*v)),
        ArgValue::Long(v) => Ok(*v),
        // Rust float-to-int `as` truncates and saturates, like Java
        ArgValue::Double(d) => Ok(*d as i64),
        ArgValue::Str(s) => to_i64(&parse_numeric_string(s, target)?, target),
        other => Err(mismatch(&JavaType::Primitive(target), other)),
    }
}

fn to_f64(value: &ArgValue, target: Primitive) -> Result<f64, MarshalError> {
    match value {
        ArgValue::Int(v) => Ok(f64::from(*v)),
        ArgValue::Long(v) => Ok(*v as f64),
        ArgValue::Double(d) => Ok(*d),
        ArgValue::Str(s) => to_f64(&parse_numeric_string(s, target)?, target),
        other => Err(mismatch(&JavaType::Primitive(target), other)),
    }
}

/// `"42"` is a 64-bit integer, `"4.2"` / `"4e2"` a double
fn parse_numeric_string(text: &str, target: Primitive) -> Result<ArgValue, MarshalError> {
    let trimmed = text.trim();
    let bad = || MarshalError::BadNumber {
        expected: target.java_name(),
        text: text.to_string(),
    };

    if trimmed.contains(['.', 'e', 'E']) {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(ArgValue::Double)
            .ok_or_else(bad)
    } else {
        trimmed.parse::<i64>().map(ArgValue::Long).map_err(|_| bad())
    }
}

pub(super) fn double_literal(d: f64) -> String {
    if d.is_nan() {
        "Double.NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 {
            "Double.POSITIVE_INFINITY".to_string()
        } else {
            "Double.NEGATIVE_INFINITY".to_string()
        }
    } else {
        format!("{:?}d", d)
    }
}

pub(super) fn mismatch(expected: &JavaType, found: &ArgValue) -> MarshalError {
    MarshalError::Mismatch {
        expected: expected.java_name(),
        found: found.kind(),
    }
}
