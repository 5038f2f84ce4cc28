//! Java literal rendering

/// Render `value` as a Java string literal, quotes included
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        push_escaped(&mut out, c, '"');
    }
    out.push('"');
    out
}

/// Render `c` as a Java char literal. Returns None for characters outside
/// the Basic Multilingual Plane, which do not fit in a Java `char`.
pub fn char_literal(c: char) -> Option<String> {
    if c.len_utf16() != 1 {
        return None;
    }
    let mut out = String::with_capacity(4);
    out.push('\'');
    push_escaped(&mut out, c, '\'');
    out.push('\'');
    Some(out)
}

// `\u` escapes are translated before lexing, so control characters use octal.
fn push_escaped(out: &mut String, c: char, quote: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if (c as u32) < 0x20 || c == '\u{7f}' => {
            out.push_str(&format!("\\{:03o}", c as u32));
        }
        c => out.push(c),
    }
}
