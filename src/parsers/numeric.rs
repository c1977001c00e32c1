//! Number parsers: `number`, `float`, `hexnumber`. Grounded in
//! `parser.c`'s `PARSER_Parse(Number)`/`(Float)`/`(HexNumber)`.

use super::{ParseOutcome, Parsed};
use crate::error::WrongParser;
use crate::value::Value;

/// Longest run of decimal digits, length >= 1 (`parser.c PARSER_Parse(Number)`
/// has no sign handling; a leading `-` is left for the surrounding literal
/// or the `float` parser kind to deal with).
pub fn number(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    while matches!(input.get(i), Some(c) if c.is_ascii_digit()) {
        i += 1;
    }
    if i == offset {
        return Err(WrongParser);
    }
    let text = std::str::from_utf8(&input[offset..i]).unwrap();
    let n: i64 = text.parse().map_err(|_| WrongParser)?;
    Ok(Parsed::new(i - offset, Value::Int(n)))
}

/// `[-]digits[.digits]`; a bare integer is rejected — `parser.c`'s Float
/// parser requires a decimal point, otherwise the `number` parser kind is
/// the one that should have matched.
pub fn float(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    if input.get(i) == Some(&b'-') {
        i += 1;
    }
    let int_start = i;
    while matches!(input.get(i), Some(c) if c.is_ascii_digit()) {
        i += 1;
    }
    if i == int_start || input.get(i) != Some(&b'.') {
        return Err(WrongParser);
    }
    i += 1;
    let frac_start = i;
    while matches!(input.get(i), Some(c) if c.is_ascii_digit()) {
        i += 1;
    }
    if i == frac_start {
        return Err(WrongParser);
    }
    let text = std::str::from_utf8(&input[offset..i]).unwrap();
    let n: f64 = text.parse().map_err(|_| WrongParser)?;
    Ok(Parsed::new(i - offset, Value::Float(n)))
}

#[derive(Clone)]
pub struct HexNumberConfig {
    pub maxval: Option<u64>,
}

/// `0x` (or `0X`) followed by hex digits, terminated by whitespace or end
/// of input (`parser.c PARSER_Parse(HexNumber)`). The optional `maxval`
/// rejects a value that decodes larger than the configured bound.
pub fn hexnumber(cfg: &HexNumberConfig, input: &[u8], offset: usize) -> ParseOutcome {
    if !input[offset..].starts_with(b"0x") && !input[offset..].starts_with(b"0X") {
        return Err(WrongParser);
    }
    let mut i = offset + 2;
    let digits_start = i;
    while matches!(input.get(i), Some(c) if c.is_ascii_hexdigit()) {
        i += 1;
    }
    if i == digits_start {
        return Err(WrongParser);
    }
    match input.get(i) {
        None | Some(b' ') | Some(b'\t') => {}
        _ => return Err(WrongParser),
    }
    let text = std::str::from_utf8(&input[digits_start..i]).unwrap();
    let value = u64::from_str_radix(text, 16).map_err(|_| WrongParser)?;
    if let Some(max) = cfg.maxval {
        if value > max {
            return Err(WrongParser);
        }
    }
    Ok(Parsed::new(i - offset, Value::String(format!("0x{}", text))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_stops_before_decimal_point() {
        let parsed = number(b"12.5", 0).unwrap();
        assert_eq!(parsed.consumed, 2);
    }

    #[test]
    fn number_does_not_consume_leading_minus() {
        assert!(number(b"-42rest", 0).is_err());
        let parsed = number(b"42rest", 0).unwrap();
        assert_eq!(parsed.value, Value::Int(42));
        assert_eq!(parsed.consumed, 2);
    }

    #[test]
    fn float_requires_fractional_digits() {
        assert!(float(b"12.", 0).is_err());
        assert!(float(b"12.5", 0).is_ok());
    }

    #[test]
    fn hexnumber_respects_maxval() {
        let cfg = HexNumberConfig { maxval: Some(0xff) };
        assert!(hexnumber(&cfg, b"0xff ", 0).is_ok());
        assert!(hexnumber(&cfg, b"0x100 ", 0).is_err());
    }
}
