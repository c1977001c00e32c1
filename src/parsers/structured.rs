//! Parsers that decompose into nested structure: `json`, `cee-syslog` and
//! `cef`. Grounded in `parser.c`'s `PARSER_Parse(JSON)`/`(CeeSyslog)` (which
//! lean on `json-c`'s tokener — reimplemented in [`crate::json_scan`]) and
//! the `cefGetHdrField`/`cefParseExtensions`/`PARSER_Parse(CEF)` family.

use super::{ParseOutcome, Parsed};
use crate::error::WrongParser;
use crate::json_scan;
use crate::value::{Fields, Value};

/// A full JSON object or array, per spec.md §4.A "must see a full JSON
/// object or array, not a bare scalar".
pub fn json(input: &[u8], offset: usize) -> ParseOutcome {
    let (consumed, value) = json_scan::scan_container(input, offset).ok_or(WrongParser)?;
    Ok(Parsed::new(consumed, value))
}

/// CEE-enhanced syslog: a literal `@cee:` cookie, optional whitespace, then
/// a JSON **object** whose serialisation must extend exactly to the end of
/// the input (spec.md §4.A "cee-syslog") — unlike the bare `json` parser
/// kind, a trailing unconsumed byte after the object is a non-match here
/// rather than something left for a sibling edge to pick up.
pub fn cee_syslog(input: &[u8], offset: usize) -> ParseOutcome {
    if !input[offset..].starts_with(b"@cee:") {
        return Err(WrongParser);
    }
    let json_start = offset + 5;
    match json_scan::scan_container(input, json_start) {
        Some((consumed, value @ Value::Object(_))) if json_start + consumed == input.len() => {
            Ok(Parsed::new(input.len() - offset, value))
        }
        _ => Err(WrongParser),
    }
}

/// ArcSight Common Event Format: `CEF:Version|Device Vendor|Device
/// Product|Device Version|Signature ID|Name|Severity|[Extension]`.
/// Grounded in `cefGetHdrField`/`cefParseExtensions`/`PARSER_Parse(CEF)`:
/// the original calls `cefGetHdrField` six times (vendor, product, device
/// version, signature ID, name, severity) after the literal `CEF:` version
/// marker — the version number itself is consumed as a delimiter, not kept
/// as its own field — so this produces exactly those six header fields
/// (`DeviceVendor`, `DeviceProduct`, `DeviceVersion`, `SignatureID`,
/// `Name`, `Severity`) plus an `Extensions` sub-object, per SPEC_FULL.md §3
/// "Supplemented features". Header fields support `\|`/`\\` escapes; the
/// trailing whitespace-separated `key=value` extension section's values may
/// themselves contain escaped `=`, `\`, and — per the original — literal
/// `\n`/`\r` escapes that decode to actual CR/LF bytes rather than staying
/// as a two-character escape sequence.
pub fn cef(input: &[u8], offset: usize) -> ParseOutcome {
    if !input[offset..].starts_with(b"CEF:") {
        return Err(WrongParser);
    }
    let mut i = offset + 4;
    let mut fields = Fields::new();

    // The leading version number (`CEF:0|...`) is scanned and discarded
    // like any other header field, matching `cefGetHdrField` being called
    // only for the six fields that follow it.
    let (_version, next) = cef_hdr_field(input, i)?;
    i = next;
    if input.get(i) != Some(&b'|') {
        return Err(WrongParser);
    }
    i += 1;

    const HEADER_NAMES: [&str; 6] =
        ["DeviceVendor", "DeviceProduct", "DeviceVersion", "SignatureID", "Name", "Severity"];

    for (idx, field_name) in HEADER_NAMES.iter().enumerate() {
        let (value, next) = cef_hdr_field(input, i)?;
        fields.insert(*field_name, Value::String(value));
        i = next;
        let is_last_header = idx == HEADER_NAMES.len() - 1;
        if is_last_header {
            // the severity field is followed by a space, not a pipe
            if input.get(i) == Some(&b' ') {
                i += 1;
            }
        } else {
            if input.get(i) != Some(&b'|') {
                return Err(WrongParser);
            }
            i += 1;
        }
    }

    if i < input.len() {
        let (extensions, next) = cef_parse_extensions(input, i);
        i = next;
        if !extensions.is_empty() {
            fields.insert("Extensions", Value::Object(extensions));
        }
    }

    Ok(Parsed::new(i - offset, Value::Object(fields)))
}

fn cef_hdr_field(input: &[u8], offset: usize) -> Result<(String, usize), WrongParser> {
    let mut i = offset;
    let mut out = String::new();
    loop {
        match input.get(i) {
            None | Some(b'|') => break,
            Some(b'\\') => {
                match input.get(i + 1) {
                    Some(b'|') => out.push('|'),
                    Some(b'\\') => out.push('\\'),
                    Some(&c) => out.push(c as char),
                    None => return Err(WrongParser),
                }
                i += 2;
            }
            Some(&c) => {
                out.push(c as char);
                i += 1;
            }
        }
    }
    Ok((out, i))
}

fn cef_parse_extensions(input: &[u8], offset: usize) -> (Fields, usize) {
    let mut i = offset;
    let mut fields = Fields::new();
    loop {
        while input.get(i) == Some(&b' ') {
            i += 1;
        }
        let key_start = i;
        while matches!(input.get(i), Some(c) if *c != b'=' && *c != b' ') {
            i += 1;
        }
        if i == key_start || input.get(i) != Some(&b'=') {
            break;
        }
        let key = String::from_utf8_lossy(&input[key_start..i]).into_owned();
        i += 1;
        let (value, next) = cef_parse_extension_value(input, i);
        fields.insert(key, Value::String(value));
        i = next;
    }
    (fields, i)
}

/// Scans an extension value, which ends at the next unescaped
/// `<space>key=` boundary rather than at a plain space — extension values
/// may contain unescaped spaces of their own (`cefParseExtensionValue`'s
/// lookahead). `\=`, `\\`, `\n` and `\r` are unescaped; per the original,
/// the latter two decode to actual CR/LF bytes rather than staying
/// two-character sequences.
fn cef_parse_extension_value(input: &[u8], offset: usize) -> (String, usize) {
    let mut i = offset;
    let mut out = String::new();
    loop {
        match input.get(i) {
            None => break,
            Some(b'\\') => {
                match input.get(i + 1) {
                    Some(b'=') => out.push('='),
                    Some(b'\\') => out.push('\\'),
                    Some(b'n') => out.push('\n'),
                    Some(b'r') => out.push('\r'),
                    Some(&c) => out.push(c as char),
                    None => break,
                }
                i += 2;
            }
            Some(&b' ') => {
                if is_next_key_boundary(input, i + 1) {
                    break;
                }
                out.push(' ');
                i += 1;
            }
            Some(&c) => {
                out.push(c as char);
                i += 1;
            }
        }
    }
    (out, i)
}

fn is_next_key_boundary(input: &[u8], offset: usize) -> bool {
    let mut i = offset;
    let key_start = i;
    while matches!(input.get(i), Some(c) if *c != b'=' && *c != b' ') {
        i += 1;
    }
    i > key_start && input.get(i) == Some(&b'=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cee_syslog_accepts_cookie_and_object() {
        let input = br#"@cee:{"a":1}"#;
        let parsed = cee_syslog(input, 0).unwrap();
        assert_eq!(parsed.consumed, input.len());
    }

    #[test]
    fn cee_syslog_rejects_trailing_bytes_after_the_object() {
        let input = br#"@cee:{"a":1} trailing junk"#;
        assert!(cee_syslog(input, 0).is_err());
    }

    #[test]
    fn cee_syslog_requires_the_cookie() {
        assert!(cee_syslog(br#"{"a":1}"#, 0).is_err());
    }

    #[test]
    fn cef_parses_header_and_extensions() {
        let input =
            b"CEF:0|Security|threatmanager|1.0|100|worm successfully stopped|10|src=10.0.0.1 dst=2.1.2.2 spt=1232";
        let parsed = cef(input, 0).unwrap();
        match parsed.value {
            Value::Object(fields) => {
                assert_eq!(fields.get("SignatureID"), Some(&Value::String("100".into())));
                assert!(fields.get("cefVersion").is_none());
                match fields.get("Extensions") {
                    Some(Value::Object(ext)) => {
                        assert_eq!(ext.get("src"), Some(&Value::String("10.0.0.1".into())));
                    }
                    _ => panic!("expected Extensions object"),
                }
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn cef_extension_value_tolerates_embedded_space() {
        let input = b"CEF:0|V|P|1.0|1|n|1|msg=hello world foo=bar";
        let parsed = cef(input, 0).unwrap();
        if let Value::Object(fields) = parsed.value {
            if let Some(Value::Object(ext)) = fields.get("Extensions") {
                assert_eq!(ext.get("msg"), Some(&Value::String("hello world".into())));
                assert_eq!(ext.get("foo"), Some(&Value::String("bar".into())));
                return;
            }
        }
        panic!("expected Extensions with embedded-space value");
    }
}
