//! A small hand-written JSON scanner.
//!
//! Grounded in `parser.c`'s `PARSER_Parse(JSON)`, which leans on `json-c`'s
//! tokener to find a JSON object/array anchored at an offset and report
//! exactly how many bytes it consumed (including trailing whitespace,
//! which `json-c` treats as part of the token — preserved here so the
//! `json` and `cee-syslog` parser kinds match the original's offsets).
//! `json-c` itself isn't a Rust crate, so this reimplements just enough of
//! a JSON scanner to serve both match-time parsing (`parsers::structured`)
//! and the compiler's `%{...}%` JSON-form field reference configuration —
//! dependency-free, matching how the teacher hand-writes its own lexers
//! rather than reaching for an external grammar crate.

use crate::value::{Fields, Value};

/// Parse one JSON value starting at `input[offset..]`, then consume any
/// ASCII whitespace immediately following it. Returns `(consumed, value)`.
pub fn scan(input: &[u8], offset: usize) -> Option<(usize, Value)> {
    let mut i = offset;
    skip_ws(input, &mut i);
    let value = scan_value(input, &mut i)?;
    skip_ws(input, &mut i);
    Some((i - offset, value))
}

/// As [`scan`], but only accepts an object or array at the top (used by the
/// `json` parser kind, which per spec.md §4.A must see "a full JSON object
/// or array").
pub fn scan_container(input: &[u8], offset: usize) -> Option<(usize, Value)> {
    let mut i = offset;
    skip_ws(input, &mut i);
    match input.get(i) {
        Some(b'{') | Some(b'[') => {}
        _ => return None,
    }
    let value = scan_value(input, &mut i)?;
    skip_ws(input, &mut i);
    Some((i - offset, value))
}

fn skip_ws(input: &[u8], i: &mut usize) {
    while *i < input.len() && input[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn scan_value(input: &[u8], i: &mut usize) -> Option<Value> {
    skip_ws(input, i);
    match *input.get(*i)? {
        b'{' => scan_object(input, i),
        b'[' => scan_array(input, i),
        b'"' => scan_string(input, i).map(Value::String),
        b't' => scan_literal(input, i, b"true").then(|| Value::Bool(true)),
        b'f' => scan_literal(input, i, b"false").then(|| Value::Bool(false)),
        b'n' => scan_literal(input, i, b"null").then(|| Value::Null),
        b'-' | b'0'..=b'9' => scan_number(input, i),
        _ => None,
    }
}

fn scan_literal(input: &[u8], i: &mut usize, lit: &[u8]) -> bool {
    if input[*i..].starts_with(lit) {
        *i += lit.len();
        true
    } else {
        false
    }
}

fn scan_object(input: &[u8], i: &mut usize) -> Option<Value> {
    debug_assert_eq!(input.get(*i), Some(&b'{'));
    *i += 1;
    let mut fields = Fields::new();
    skip_ws(input, i);
    if input.get(*i) == Some(&b'}') {
        *i += 1;
        return Some(Value::Object(fields));
    }
    loop {
        skip_ws(input, i);
        if input.get(*i) != Some(&b'"') {
            return None;
        }
        let key = scan_string(input, i)?;
        skip_ws(input, i);
        if input.get(*i) != Some(&b':') {
            return None;
        }
        *i += 1;
        let value = scan_value(input, i)?;
        fields.insert(key, value);
        skip_ws(input, i);
        match input.get(*i) {
            Some(b',') => {
                *i += 1;
            }
            Some(b'}') => {
                *i += 1;
                break;
            }
            _ => return None,
        }
    }
    Some(Value::Object(fields))
}

fn scan_array(input: &[u8], i: &mut usize) -> Option<Value> {
    debug_assert_eq!(input.get(*i), Some(&b'['));
    *i += 1;
    let mut items = Vec::new();
    skip_ws(input, i);
    if input.get(*i) == Some(&b']') {
        *i += 1;
        return Some(Value::Array(items));
    }
    loop {
        let value = scan_value(input, i)?;
        items.push(value);
        skip_ws(input, i);
        match input.get(*i) {
            Some(b',') => {
                *i += 1;
            }
            Some(b']') => {
                *i += 1;
                break;
            }
            _ => return None,
        }
    }
    Some(Value::Array(items))
}

fn scan_string(input: &[u8], i: &mut usize) -> Option<String> {
    debug_assert_eq!(input.get(*i), Some(&b'"'));
    *i += 1;
    let mut out = String::new();
    loop {
        match *input.get(*i)? {
            b'"' => {
                *i += 1;
                break;
            }
            b'\\' => {
                *i += 1;
                match *input.get(*i)? {
                    b'"' => out.push('"'),
                    b'\\' => out.push('\\'),
                    b'/' => out.push('/'),
                    b'b' => out.push('\u{8}'),
                    b'f' => out.push('\u{c}'),
                    b'n' => out.push('\n'),
                    b'r' => out.push('\r'),
                    b't' => out.push('\t'),
                    b'u' => {
                        let hex = input.get(*i + 1..*i + 5)?;
                        let code = u32::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?;
                        out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                        *i += 4;
                    }
                    _ => return None,
                }
                *i += 1;
            }
            c => {
                // Advance by the full UTF-8 sequence, not just one byte.
                let start = *i;
                let width = utf8_width(c);
                *i += width;
                out.push_str(std::str::from_utf8(input.get(start..*i)?).ok()?);
            }
        }
    }
    Some(out)
}

fn utf8_width(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

fn scan_number(input: &[u8], i: &mut usize) -> Option<Value> {
    let start = *i;
    if input.get(*i) == Some(&b'-') {
        *i += 1;
    }
    while matches!(input.get(*i), Some(b'0'..=b'9')) {
        *i += 1;
    }
    let mut is_float = false;
    if input.get(*i) == Some(&b'.') {
        is_float = true;
        *i += 1;
        while matches!(input.get(*i), Some(b'0'..=b'9')) {
            *i += 1;
        }
    }
    if matches!(input.get(*i), Some(b'e') | Some(b'E')) {
        is_float = true;
        *i += 1;
        if matches!(input.get(*i), Some(b'+') | Some(b'-')) {
            *i += 1;
        }
        while matches!(input.get(*i), Some(b'0'..=b'9')) {
            *i += 1;
        }
    }
    if *i == start {
        return None;
    }
    let text = std::str::from_utf8(&input[start..*i]).ok()?;
    if is_float {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_nested_object() {
        let input = br#"{"a":1,"b":[true,false,null,"x"]} trailing"#;
        let (consumed, value) = scan_container(input, 0).unwrap();
        assert_eq!(&input[..consumed], br#"{"a":1,"b":[true,false,null,"x"]}"#);
        match value {
            Value::Object(fields) => {
                assert_eq!(fields.get("a"), Some(&Value::Int(1)));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn consumes_trailing_whitespace_like_json_c() {
        let input = b"{}   next";
        let (consumed, _) = scan_container(input, 0).unwrap();
        assert_eq!(consumed, 6);
    }

    #[test]
    fn rejects_bare_scalar_as_container() {
        assert!(scan_container(b"42", 0).is_none());
    }
}
