//! Packed argument encoding
//!
//! Large arrays are not emitted as Java array initializers: each element
//! costs several bytes of bytecode and a method may not exceed 64 KB. They
//! are written as string constants instead and rebuilt at run time by
//! `SolutionHarness.unpack`.
//!
//! Every token is self-delimiting:
//!
//! ```text
//! n;                 null
//! i<int>;            int          l<long>;  long
//! d<double>;         double       z0; z1;   boolean
//! c<utf-16 unit>;    char
//! s<len>;<chars>     String, len in UTF-16 code units
//! a<count>;<items>   array of count items
//! ```

use super::java;
use super::marshal::{coerce, mismatch, supported_component, MarshalError, Scalar};
use super::payload::ArgValue;
use super::signature::JavaType;

/// Arguments with more values than this are packed
pub const PACK_THRESHOLD: usize = 256;

/// Characters per string constant. A constant is capped at 65535 bytes of
/// modified UTF-8 and one character takes at most 6.
const CHUNK_CHARS: usize = 8192;

/// Number of values (arrays included) in `value`
pub fn value_count(value: &ArgValue) -> usize {
    match value {
        ArgValue::List(items) => 1 + items.iter().map(value_count).sum::<usize>(),
        _ => 1,
    }
}

/// Java expression that rebuilds `value` as the declared parameter type.
/// Untyped and opaque targets are rebuilt as `Object` graphs and converted
/// by the runtime marshaler, like untyped literals.
pub fn packed_argument(value: &ArgValue, ty: Option<&JavaType>) -> Result<String, MarshalError> {
    let mut text = String::new();
    let class_name = match ty {
        Some(ty) => {
            pack_typed(value, ty, &mut text)?;
            match ty {
                JavaType::Array(_) => ty.java_name(),
                _ => "Object".to_string(),
            }
        }
        None => {
            pack_untyped(value, &mut text);
            "Object".to_string()
        }
    };
    Ok(unpack_expression(&class_name, &text))
}

fn unpack_expression(class_name: &str, text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(CHUNK_CHARS)
        .map(|chunk| java::string_literal(&chunk.iter().collect::<String>()))
        .collect();
    format!("SolutionHarness.unpack({}.class, {})", class_name, chunks.join(", "))
}

fn pack_typed(value: &ArgValue, ty: &JavaType, out: &mut String) -> Result<(), MarshalError> {
    match (ty, value) {
        (JavaType::Primitive(p), ArgValue::Null) => {
            return Err(MarshalError::NullPrimitive(p.java_name()));
        }
        (JavaType::Array(component), _) if !supported_component(component) => {
            return Err(MarshalError::UnsupportedComponent(component.java_name()));
        }
        (JavaType::Boxed(_) | JavaType::Array(_), ArgValue::Null) => out.push_str("n;"),
        (JavaType::Primitive(p) | JavaType::Boxed(p), _) => push_scalar(coerce(value, *p)?, out),
        (JavaType::String, ArgValue::List(_)) => return Err(mismatch(ty, value)),
        // Non-string scalars are turned into their Java display form on unpack
        (JavaType::String, _) => pack_untyped(value, out),
        (JavaType::Array(component), ArgValue::List(items)) => {
            out.push_str(&format!("a{};", items.len()));
            for (index, item) in items.iter().enumerate() {
                pack_typed(item, component, out).map_err(|e| MarshalError::Element {
                    index,
                    source: Box::new(e),
                })?;
            }
        }
        (JavaType::Array(_), _) => return Err(mismatch(ty, value)),
        (JavaType::Object(_), _) => pack_untyped(value, out),
    }
    Ok(())
}

fn pack_untyped(value: &ArgValue, out: &mut String) {
    match value {
        ArgValue::Null => out.push_str("n;"),
        ArgValue::Bool(b) => push_scalar(Scalar::Bool(*b), out),
        ArgValue::Int(v) => push_scalar(Scalar::Int(*v), out),
        ArgValue::Long(v) => push_scalar(Scalar::Long(*v), out),
        ArgValue::Double(d) => push_scalar(Scalar::Double(*d), out),
        ArgValue::Str(s) => {
            out.push_str(&format!("s{};", s.encode_utf16().count()));
            out.push_str(s);
        }
        ArgValue::List(items) => {
            out.push_str(&format!("a{};", items.len()));
            for item in items {
                pack_untyped(item, out);
            }
        }
    }
}

fn push_scalar(scalar: Scalar, out: &mut String) {
    let token = match scalar {
        Scalar::Int(v) => format!("i{};", v),
        Scalar::Long(v) => format!("l{};", v),
        Scalar::Double(d) => format!("d{};", double_text(d)),
        Scalar::Bool(b) => format!("z{};", u8::from(b)),
        Scalar::Char(c) => format!("c{};", u32::from(c)),
    };
    out.push_str(&token);
}

/// Text accepted by `Double.parseDouble`
fn double_text(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d == f64::INFINITY {
        "Infinity".to_string()
    } else if d == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{:?}", d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn arg(value: Value) -> ArgValue {
        ArgValue::try_from(&value).unwrap()
    }

    fn packed(value: Value, ty: &str) -> Result<String, MarshalError> {
        packed_argument(&arg(value), Some(&JavaType::parse(ty)))
    }

    #[test]
    fn test_value_count() {
        assert_eq!(value_count(&arg(json!(5))), 1);
        assert_eq!(value_count(&arg(json!([1, 2, 3]))), 4);
        assert_eq!(value_count(&arg(json!([[1, 2], [3]]))), 6);
    }

    #[test]
    fn test_typed_arrays() {
        assert_eq!(
            packed(json!([2, 7, -11]), "int[]").unwrap(),
            r#"SolutionHarness.unpack(int[].class, "a3;i2;i7;i-11;")"#
        );
        assert_eq!(
            packed(json!([[1, "2"], null]), "long[][]").unwrap(),
            r#"SolutionHarness.unpack(long[][].class, "a2;a2;l1;l2;n;")"#
        );
        assert_eq!(
            packed(json!([0.5, 3]), "double[]").unwrap(),
            r#"SolutionHarness.unpack(double[].class, "a2;d0.5;d3.0;")"#
        );
        assert_eq!(
            packed(json!([["#", "."]]), "char[][]").unwrap(),
            r#"SolutionHarness.unpack(char[][].class, "a1;a2;c35;c46;")"#
        );
        assert_eq!(
            packed(json!([true, "FALSE"]), "boolean[]").unwrap(),
            r#"SolutionHarness.unpack(boolean[].class, "a2;z1;z0;")"#
        );
    }

    #[test]
    fn test_strings_are_length_prefixed() {
        assert_eq!(
            packed(json!(["a;b", "\"é😀", null, 4]), "String[]").unwrap(),
            "SolutionHarness.unpack(String[].class, \"a4;s3;a;bs4;\\\"é😀n;i4;\")"
        );
    }

    #[test]
    fn test_overflow_follows_the_literal_rules() {
        assert_eq!(
            packed(json!([4294967297i64, 1e20]), "int[]").unwrap(),
            r#"SolutionHarness.unpack(int[].class, "a2;i1;i2147483647;")"#
        );
    }

    #[test]
    fn test_untyped_and_opaque_targets() {
        let expected = r#"SolutionHarness.unpack(Object.class, "a3;i1;l3000000000;a1;d1.5;")"#;
        assert_eq!(
            packed_argument(&arg(json!([1, 3000000000i64, [1.5]])), None).unwrap(),
            expected
        );
        assert_eq!(packed(json!([1, 3000000000i64, [1.5]]), "List<Object>").unwrap(), expected);
    }

    #[test]
    fn test_errors_match_the_literal_marshaler() {
        assert_eq!(
            packed(json!([1, "x"]), "int[]").unwrap_err().to_string(),
            "element 1: cannot parse \"x\" as int"
        );
        assert_eq!(
            packed(json!([1, null]), "int[]").unwrap_err().to_string(),
            "element 1: null cannot be passed as int"
        );
        assert_eq!(
            packed(json!([1]), "int").unwrap_err().to_string(),
            "expected int but got array"
        );
        assert_eq!(
            packed(json!([1]), "Point[]").unwrap_err(),
            MarshalError::UnsupportedComponent("Point".to_string())
        );
    }

    #[test]
    fn test_long_text_is_split_into_constants() {
        let value = ArgValue::List(vec![ArgValue::Int(1_000_000); 5_000]);
        let expression = packed_argument(&value, Some(&JavaType::parse("int[]"))).unwrap();

        // "a5000;" + 5000 * "i1000000;" = 45006 characters
        let constants = expression.matches('"').count() / 2;
        assert_eq!(constants, 45_006usize.div_ceil(CHUNK_CHARS));
        assert!(expression.starts_with("SolutionHarness.unpack(int[].class, \"a5000;i1000000;"));
    }
}
