//! Lightweight scan of the `Solution` class
//!
//! This is not a Java parser. It blanks comments and literals, finds the
//! body of `class Solution`, and reads the headers of its direct member
//! methods. That is enough to pick parameter types for the static marshaler
//! and a method name for the usage hint; the runtime harness still resolves
//! the method by reflection.

use regex::Regex;
use std::sync::LazyLock;

static SOLUTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bclass\s+Solution\b").unwrap());
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\s*[\w$.]+(?:\s*\([^()]*\))?").unwrap());
static METHOD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<mods>(?:(?:public|protected|private|static|final|abstract|synchronized|native|strictfp|default)\s+)*)(?:<.*?>\s*)?(?P<ret>[\w$.]+(?:\s*<.*>)?(?:\s*\[\s*\])*)\s+(?P<name>[A-Za-z_$][\w$]*)\s*\((?P<params>.*)\)(?:\s*\[\s*\])*\s*(?:throws\s+[\w$.,\s<>]+)?$",
    )
    .unwrap()
});

/// Words that can never be a method's return type or name
const RESERVED: &[&str] = &[
    "public", "protected", "private", "static", "final", "abstract", "synchronized", "native",
    "strictfp", "default", "class", "interface", "enum", "record", "new", "return", "if", "else",
    "for", "while", "do", "switch", "case", "try", "catch", "finally", "throw", "throws", "import",
    "package",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Long,
    Double,
    Boolean,
    Char,
}

impl Primitive {
    pub fn java_name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Double => "double",
            Primitive::Boolean => "boolean",
            Primitive::Char => "char",
        }
    }

    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Double => "Double",
            Primitive::Boolean => "Boolean",
            Primitive::Char => "Character",
        }
    }
}

/// Declared parameter type, as far as the marshaler cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaType {
    Primitive(Primitive),
    Boxed(Primitive),
    String,
    Array(Box<JavaType>),
    /// Anything else, kept as written (`List<Integer>`, `Object`, user types)
    Object(String),
}

impl JavaType {
    /// Parse a type as written in a parameter list
    pub fn parse(text: &str) -> JavaType {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

        if let Some(inner) = compact.strip_suffix("...") {
            return JavaType::Array(Box::new(JavaType::parse(inner)));
        }
        if let Some(inner) = compact.strip_suffix("[]") {
            return JavaType::Array(Box::new(JavaType::parse(inner)));
        }

        let base = compact.strip_prefix("java.lang.").unwrap_or(&compact);
        match base {
            "int" => JavaType::Primitive(Primitive::Int),
            "long" => JavaType::Primitive(Primitive::Long),
            "double" => JavaType::Primitive(Primitive::Double),
            "boolean" => JavaType::Primitive(Primitive::Boolean),
            "char" => JavaType::Primitive(Primitive::Char),
            "Integer" => JavaType::Boxed(Primitive::Int),
            "Long" => JavaType::Boxed(Primitive::Long),
            "Double" => JavaType::Boxed(Primitive::Double),
            "Boolean" => JavaType::Boxed(Primitive::Boolean),
            "Character" => JavaType::Boxed(Primitive::Char),
            "String" => JavaType::String,
            _ => JavaType::Object(compact),
        }
    }

    /// Java source spelling, used for array creation expressions
    pub fn java_name(&self) -> String {
        match self {
            JavaType::Primitive(p) => p.java_name().to_string(),
            JavaType::Boxed(p) => p.boxed_name().to_string(),
            JavaType::String => "String".to_string(),
            JavaType::Array(inner) => format!("{}[]", inner.java_name()),
            JavaType::Object(name) => name.clone(),
        }
    }
}

/// A method declared directly in `Solution`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<JavaType>,
    pub is_public: bool,
}

/// Methods declared directly in `class Solution`, in declaration order
pub fn scan_solution_methods(source: &str) -> Vec<MethodSignature> {
    let blanked = blank_comments_and_literals(source);
    match solution_body(&blanked) {
        Some(body) => member_headers(body)
            .iter()
            .filter_map(|header| parse_method_header(header))
            .collect(),
        None => Vec::new(),
    }
}

/// Overloads of `name` taking exactly `arity` parameters
pub fn overloads<'a>(
    methods: &'a [MethodSignature],
    name: &str,
    arity: usize,
) -> Vec<&'a MethodSignature> {
    methods
        .iter()
        .filter(|m| m.name == name && m.params.len() == arity)
        .collect()
}

/// Replace comments and string/char literals with spaces, keeping newlines
fn blank_comments_and_literals(source: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str,
        TextBlock,
        Char,
    }

    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut i = 0;

    let blank = |c: char| if c == '\n' { '\n' } else { ' ' };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            State::Code => match (c, next) {
                ('/', Some('/')) => {
                    state = State::LineComment;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                ('/', Some('*')) => {
                    state = State::BlockComment;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                ('"', _) if next == Some('"') && chars.get(i + 2) == Some(&'"') => {
                    state = State::TextBlock;
                    out.push_str("\"\"\"");
                    i += 3;
                    continue;
                }
                ('"', _) => {
                    state = State::Str;
                    out.push('"');
                }
                ('\'', _) => {
                    state = State::Char;
                    out.push('\'');
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
                out.push(blank(c));
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = State::Code;
                    out.push_str("  ");
                    i += 2;
                    continue;
                }
                out.push(blank(c));
            }
            State::Str | State::Char | State::TextBlock => {
                if c == '\\' {
                    out.push(' ');
                    if let Some(n) = next {
                        out.push(blank(n));
                    }
                    i += 2;
                    continue;
                }
                let closes = match state {
                    State::Str => c == '"' || c == '\n',
                    State::Char => c == '\'' || c == '\n',
                    _ => c == '"' && next == Some('"') && chars.get(i + 2) == Some(&'"'),
                };
                if closes {
                    if state == State::TextBlock {
                        out.push_str("\"\"\"");
                        i += 3;
                        state = State::Code;
                        continue;
                    }
                    state = State::Code;
                    out.push(c);
                } else {
                    out.push(blank(c));
                }
            }
        }
        i += 1;
    }
    out
}

/// Text between the braces of `class Solution`
fn solution_body(blanked: &str) -> Option<&str> {
    let class_match = SOLUTION_CLASS.find(blanked)?;
    let open = class_match.end() + blanked[class_match.end()..].find('{')?;

    let mut depth = 0usize;
    for (offset, c) in blanked[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&blanked[open + 1..open + offset]);
                }
            }
            _ => {}
        }
    }
    // Unbalanced braces: scan whatever is there
    Some(&blanked[open + 1..])
}

/// Text preceding each depth-0 `{` in a class body
fn member_headers(body: &str) -> Vec<String> {
    let mut headers = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in body.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    headers.push(std::mem::take(&mut current));
                }
                depth += 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    current.clear();
                }
            }
            ';' if depth == 0 => current.clear(),
            c if depth == 0 => current.push(c),
            _ => {}
        }
    }
    headers
}

fn parse_method_header(header: &str) -> Option<MethodSignature> {
    let without_annotations = ANNOTATION.replace_all(header, " ");
    let normalized = without_annotations
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let caps = METHOD_HEADER.captures(&normalized)?;
    let ret = caps.name("ret")?.as_str();
    let name = caps.name("name")?.as_str();

    if RESERVED.contains(&ret) || RESERVED.contains(&name) {
        return None;
    }

    let modifiers: Vec<&str> = caps
        .name("mods")
        .map(|m| m.as_str().split_whitespace().collect())
        .unwrap_or_default();

    let params = split_top_level(caps.name("params")?.as_str())
        .iter()
        .map(|param| parse_param(param))
        .collect::<Option<Vec<_>>>()?;

    Some(MethodSignature {
        name: name.to_string(),
        params,
        is_public: modifiers.contains(&"public"),
    })
}

/// Split a parameter list on commas outside generic brackets
fn split_top_level(params: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut angle = 0usize;

    for c in params.chars() {
        match c {
            '<' => {
                angle += 1;
                current.push(c);
            }
            '>' => {
                angle = angle.saturating_sub(1);
                current.push(c);
            }
            ',' if angle == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// `final int[] nums`, `int grid[][]`, `String... words`
fn parse_param(param: &str) -> Option<JavaType> {
    let mut text = param.trim();
    while let Some(rest) = text.strip_prefix("final ") {
        text = rest.trim_start();
    }

    // Trailing dimensions after the name: `int grid[][]`
    let mut name_dims = 0;
    let mut trimmed = text.trim_end();
    while let Some(rest) = trimmed.strip_suffix(']') {
        trimmed = rest.trim_end().strip_suffix('[')?.trim_end();
        name_dims += 1;
    }

    let split = trimmed.rfind(|c: char| c.is_whitespace() || c == '>' || c == ']' || c == '.')?;
    let (type_text, name) = trimmed.split_at(split + 1);
    if name.is_empty() || type_text.trim().is_empty() {
        return None;
    }

    let mut ty = JavaType::parse(type_text);
    for _ in 0..name_dims {
        ty = JavaType::Array(Box::new(ty));
    }
    Some(ty)
}
