//! Byte-oriented text parsers: literal matching, whitespace, delimited
//! words, quoted strings and the various "scan until X" primitives.
//! Grounded in `parser.c`'s `PARSER_Parse` implementations for `Literal`,
//! `Whitespace`, `Word`, `Alpha`, `Rest`, `(Op)QuotedString`, `StringTo`,
//! `CharTo` and `CharSeparated`.

use super::{ParseOutcome, Parsed};
use crate::error::WrongParser;
use crate::value::{Fields, Value};

#[derive(Clone)]
pub struct LiteralConfig {
    pub text: String,
}

pub fn literal(cfg: &LiteralConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let needle = cfg.text.as_bytes();
    if input[offset..].starts_with(needle) {
        Ok(Parsed::slice(input, offset, needle.len()))
    } else {
        Err(WrongParser)
    }
}

pub fn whitespace(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    while matches!(input.get(i), Some(b' ') | Some(b'\t')) {
        i += 1;
    }
    if i == offset {
        return Err(WrongParser);
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

/// Consumes up to (not including) the next literal space, requiring at
/// least one byte (`parser.c PARSER_Parse(Word)`: splits only on `' '`, not
/// general whitespace).
pub fn word(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    while i < input.len() && input[i] != b' ' {
        i += 1;
    }
    if i == offset {
        return Err(WrongParser);
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

pub fn alpha(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    while matches!(input.get(i), Some(c) if c.is_ascii_alphabetic()) {
        i += 1;
    }
    if i == offset {
        return Err(WrongParser);
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

/// Consumes everything remaining; never fails, even on an empty remainder
/// (`parser.c PARSER_Parse(Rest)` always succeeds).
pub fn rest(input: &[u8], offset: usize) -> ParseOutcome {
    Ok(Parsed::slice(input, offset, input.len() - offset))
}

/// A double-quoted string that may itself contain escaped quotes
/// (`\"`), unescaped on capture. Fails if the string isn't terminated.
pub fn quoted_string(input: &[u8], offset: usize) -> ParseOutcome {
    scan_quoted(input, offset, true)
}

/// As [`quoted_string`], but backslash has no escaping meaning — `\"`
/// still ends the string (`parser.c PARSER_Parse(OpQuotedString)`, used
/// where the source never escapes embedded quotes).
pub fn op_quoted_string(input: &[u8], offset: usize) -> ParseOutcome {
    scan_quoted(input, offset, false)
}

fn scan_quoted(input: &[u8], offset: usize, honor_escapes: bool) -> ParseOutcome {
    if input.get(offset) != Some(&b'"') {
        return Err(WrongParser);
    }
    let mut i = offset + 1;
    let mut out = String::new();
    loop {
        match input.get(i) {
            None => return Err(WrongParser),
            Some(b'"') => {
                i += 1;
                break;
            }
            Some(b'\\') if honor_escapes && input.get(i + 1) == Some(&b'"') => {
                out.push('"');
                i += 2;
            }
            Some(&c) => {
                out.push(c as char);
                i += 1;
            }
        }
    }
    Ok(Parsed::new(i - offset, Value::String(out)))
}

#[derive(Clone)]
pub struct StringToConfig {
    pub needle: String,
}

/// Scans forward for `needle`, consuming everything up to (not including)
/// its first occurrence.
///
/// `parser.c PARSER_Parse(StringTo)` advances its cursor *before* testing
/// for a match at each position, so an occurrence of `needle` starting
/// exactly at `offset` is never recognized — the scan always consumes at
/// least one byte before the first possible match point. Preserved here
/// rather than "fixed" since rulebases written against the original rely
/// on it (an empty match at the current position would otherwise loop the
/// matcher in place).
pub fn string_to(cfg: &StringToConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let needle = cfg.needle.as_bytes();
    if needle.is_empty() {
        return Err(WrongParser);
    }
    let mut i = offset + 1;
    while i <= input.len() {
        if input[i..].starts_with(needle) {
            return Ok(Parsed::slice(input, offset, i - offset));
        }
        i += 1;
    }
    Err(WrongParser)
}

#[derive(Clone)]
pub struct CharToConfig {
    pub terminators: Vec<u8>,
}

/// As [`string_to`] but the needle is a set of terminator bytes rather than
/// a literal string; any one of them ends the scan. Requires at least one
/// consumed byte.
pub fn char_to(cfg: &CharToConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    while i < input.len() && !cfg.terminators.contains(&input[i]) {
        i += 1;
    }
    if i == offset {
        return Err(WrongParser);
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

#[derive(Clone)]
pub struct CharSepConfig {
    pub separator: u8,
}

/// Like [`word`] but the delimiter is a configured byte rather than a
/// hardcoded space (`parser.c PARSER_Parse(CharSeparated)`).
pub fn char_sep(cfg: &CharSepConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    while i < input.len() && input[i] != cfg.separator {
        i += 1;
    }
    if i == offset {
        return Err(WrongParser);
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

#[derive(Clone)]
pub struct NameValueListConfig {
    pub kv_sep: u8,
}

/// True for `isValidNameChar`'s alphabet (`parser.c`): alnum, `.`, `_`, `-`.
fn is_valid_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-'
}

/// `name=value name=value ...`: pairs separated by whitespace (never a
/// configurable byte), names restricted to `[A-Za-z0-9._-]`
/// (`parser.c isValidNameChar`/`parseNameValue`). Any trailing content past
/// the last well-formed pair fails the whole parse rather than being
/// silently dropped from `consumed` — `parseNameValue` propagates `FAIL`
/// the instant one candidate pair doesn't conform, it never stops early and
/// reports only what it managed to decompose so far.
pub fn name_value_list(cfg: &NameValueListConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    let mut fields = Fields::new();
    let mut pairs = 0usize;
    loop {
        if i >= input.len() {
            break;
        }
        let name_start = i;
        while matches!(input.get(i), Some(&c) if is_valid_name_char(c)) {
            i += 1;
        }
        if i == name_start || input.get(i) != Some(&cfg.kv_sep) {
            // No valid name at this position, or it isn't followed by the
            // separator: whether this is the very first pair (no match at
            // all) or a malformed remainder after earlier pairs, the whole
            // parse fails rather than reporting a truncated match
            // (`parseNameValue`'s `goto done` on `i == iName || str[i] !=
            // '='`, propagated by the caller's `CHKR`).
            return Err(WrongParser);
        }
        let name = String::from_utf8_lossy(&input[name_start..i]).into_owned();
        i += 1;
        let value_start = i;
        while matches!(input.get(i), Some(c) if !c.is_ascii_whitespace()) {
            i += 1;
        }
        let value = String::from_utf8_lossy(&input[value_start..i]).into_owned();
        fields.insert(name, Value::String(value));
        pairs += 1;
        // Whitespace between pairs is consumed here, between calls to the
        // per-pair scan above, not before it — a leading space on the very
        // first pair is not tolerated, matching `PARSER_Parse(NameValue)`'s
        // stage-one loop.
        while matches!(input.get(i), Some(c) if c.is_ascii_whitespace()) {
            i += 1;
        }
    }
    if pairs == 0 {
        return Err(WrongParser);
    }
    Ok(Parsed::new(i - offset, Value::Object(fields)))
}

/// `key: value;key: value;...` pairs as used by Check Point's LEA log
/// export format (`parser.c parseCheckpointLEA`). Leading spaces before a
/// key (and between `:` and the value) are skipped; a key not terminated by
/// `:` or a value not terminated by `;` fails the entire parse rather than
/// stopping early and reporting the unterminated remainder as consumed
/// (`FAIL(LN_WRONGPARSER)` in the original, once at least one field has
/// already been captured there is nothing left to retreat to).
pub fn checkpoint_lea(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    let mut fields = Fields::new();
    let mut pairs = 0usize;
    loop {
        while input.get(i) == Some(&b' ') {
            i += 1;
        }
        if i >= input.len() {
            break;
        }
        let key_start = i;
        while i < input.len() && input[i] != b':' {
            i += 1;
        }
        if i == key_start || i >= input.len() {
            return Err(WrongParser);
        }
        let key = String::from_utf8_lossy(&input[key_start..i]).into_owned();
        i += 1;
        while input.get(i) == Some(&b' ') {
            i += 1;
        }
        let value_start = i;
        while i < input.len() && input[i] != b';' {
            i += 1;
        }
        if i >= input.len() {
            return Err(WrongParser);
        }
        let value = String::from_utf8_lossy(&input[value_start..i]).into_owned();
        fields.insert(key, Value::String(value));
        pairs += 1;
        i += 1; // skip ';'
    }
    if pairs == 0 {
        return Err(WrongParser);
    }
    Ok(Parsed::new(i - offset, Value::Object(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_stops_at_space_only() {
        let input = b"foo\tbar baz";
        let parsed = word(input, 0).unwrap();
        assert_eq!(parsed.consumed, 7);
    }

    #[test]
    fn string_to_never_matches_at_offset_zero_advance() {
        let input = b"::rest";
        assert!(string_to(&StringToConfig { needle: "::".into() }, input, 0).is_err());
    }

    #[test]
    fn string_to_finds_first_occurrence_after_offset() {
        let input = b"a::rest";
        let parsed = string_to(&StringToConfig { needle: "::".into() }, input, 0).unwrap();
        assert_eq!(parsed.consumed, 1);
    }

    #[test]
    fn name_value_list_builds_object() {
        let input = b"a.b=1 c_d-e=2";
        let cfg = NameValueListConfig { kv_sep: b'=' };
        let parsed = name_value_list(&cfg, input, 0).unwrap();
        assert_eq!(parsed.consumed, input.len());
        match parsed.value {
            Value::Object(fields) => {
                assert_eq!(fields.get("a.b"), Some(&Value::String("1".into())));
                assert_eq!(fields.get("c_d-e"), Some(&Value::String("2".into())));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn name_value_list_rejects_a_name_outside_the_charset() {
        let cfg = NameValueListConfig { kv_sep: b'=' };
        assert!(name_value_list(&cfg, b"a!b=1", 0).is_err());
    }

    #[test]
    fn name_value_list_fails_whole_parse_on_malformed_tail() {
        let cfg = NameValueListConfig { kv_sep: b'=' };
        // "JUNK" has no '=' after it, so it can't terminate a valid pair;
        // the original fails the entire parse rather than reporting only
        // the first pair as matched.
        assert!(name_value_list(&cfg, b"a=1 JUNK", 0).is_err());
    }

    #[test]
    fn checkpoint_lea_fails_whole_parse_on_malformed_tail() {
        assert!(checkpoint_lea(b"key: value;JUNKNOCOLON", 0).is_err());
    }
}
