//! Date and time parsers. Grounded in `parser.c`'s `PARSER_Parse` functions
//! for `RFC3164Date`, `RFC5424Date`, `KernelTimestamp`, `ISODate`,
//! `Time24hr`, `Time12hr` and `Duration` — each hand-rolls its own
//! fixed-width scan rather than reaching for a format string, since the
//! input widths and separators are exact (e.g. RFC3164's day-of-month is
//! always two columns, space-padded, never zero-padded).

use super::{ParseOutcome, Parsed};
use crate::error::WrongParser;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn match_month_ci(input: &[u8], offset: usize) -> Option<usize> {
    let candidate = input.get(offset..offset + 3)?;
    MONTHS
        .iter()
        .position(|m| m.as_bytes().eq_ignore_ascii_case(candidate))
}

fn take_digits(input: &[u8], offset: usize, n: usize) -> Option<usize> {
    let slice = input.get(offset..offset + n)?;
    if slice.iter().all(u8::is_ascii_digit) {
        std::str::from_utf8(slice).ok()?.parse().ok()
    } else {
        None
    }
}

/// `Mmm dd [YYYY ]hh:mm:ss[:]`, where `dd` is space-padded for single-digit
/// days (`" 1"` not `"01"`) and the month name is matched case-insensitively
/// against the fixed English three-letter abbreviation table — no
/// localized names (spec.md §4.A Non-goal). Also tolerates an embedded
/// four-digit year between the day and the time, and one trailing `:`
/// (spec.md §4.A "date-rfc3164" edge-case policies).
pub fn date_rfc3164(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    if match_month_ci(input, i).is_none() {
        return Err(WrongParser);
    }
    i += 3;
    if input.get(i) != Some(&b' ') {
        return Err(WrongParser);
    }
    i += 1;
    let day_digits = input.get(i..i + 2).ok_or(WrongParser)?;
    let first_ok = day_digits[0] == b' ' || day_digits[0].is_ascii_digit();
    if !first_ok || !day_digits[1].is_ascii_digit() {
        return Err(WrongParser);
    }
    i += 2;
    if input.get(i) != Some(&b' ') {
        return Err(WrongParser);
    }
    i += 1;
    if let Some(year_end) = take_digits(input, i, 4).and(Some(i + 4)) {
        if input.get(year_end) == Some(&b' ') {
            i = year_end + 1;
        }
    }
    i = expect_hms(input, i)?;
    if input.get(i) == Some(&b':') {
        i += 1;
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

/// `YYYY-MM-DDTHH:MM:SS[.frac](Z|+HH:MM|-HH:MM)`.
pub fn date_rfc5424(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    take_digits(input, i, 4).ok_or(WrongParser)?;
    i += 4;
    if input.get(i) != Some(&b'-') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 1, 12)?;
    if input.get(i) != Some(&b'-') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 1, 31)?;
    if input.get(i) != Some(&b'T') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_hms(input, i)?;
    if input.get(i) == Some(&b'.') {
        i += 1;
        let frac_start = i;
        while matches!(input.get(i), Some(c) if c.is_ascii_digit()) {
            i += 1;
        }
        if i == frac_start {
            return Err(WrongParser);
        }
    }
    match input.get(i) {
        Some(b'Z') => i += 1,
        Some(b'+') | Some(b'-') => {
            i += 1;
            i = expect_two_digit_range(input, i, 0, 23)?;
            if input.get(i) != Some(&b':') {
                return Err(WrongParser);
            }
            i += 1;
            i = expect_two_digit_range(input, i, 0, 59)?;
        }
        _ => return Err(WrongParser),
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

fn expect_hms(input: &[u8], offset: usize) -> Result<usize, WrongParser> {
    let mut i = expect_two_digit_range(input, offset, 0, 23)?;
    if input.get(i) != Some(&b':') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 0, 59)?;
    if input.get(i) != Some(&b':') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 0, 60)?; // 60 for leap seconds
    Ok(i)
}

fn expect_two_digit_range(
    input: &[u8],
    offset: usize,
    min: u32,
    max: u32,
) -> Result<usize, WrongParser> {
    let value = take_digits(input, offset, 2).ok_or(WrongParser)?;
    if value < min || value > max {
        return Err(WrongParser);
    }
    Ok(offset + 2)
}

/// `[SSSSS.UUUUUU]`: a bracketed kernel boot-relative timestamp, exactly
/// five integer digits, a dot, and exactly six fractional digits
/// (`parser.c PARSER_Parse(KernelTimestamp)`).
pub fn kernel_timestamp(input: &[u8], offset: usize) -> ParseOutcome {
    if input.get(offset) != Some(&b'[') {
        return Err(WrongParser);
    }
    let mut i = offset + 1;
    let secs_start = i;
    while matches!(input.get(i), Some(c) if c.is_ascii_digit()) {
        i += 1;
    }
    if i - secs_start != 5 {
        return Err(WrongParser);
    }
    if input.get(i) != Some(&b'.') {
        return Err(WrongParser);
    }
    i += 1;
    let frac = input.get(i..i + 6).ok_or(WrongParser)?;
    if !frac.iter().all(u8::is_ascii_digit) {
        return Err(WrongParser);
    }
    i += 6;
    if input.get(i) != Some(&b']') {
        return Err(WrongParser);
    }
    i += 1;
    Ok(Parsed::slice(input, offset, i - offset))
}

/// `YYYY-MM-DD`, with per-field range validation mirroring
/// `parser.c PARSER_Parse(ISODate)`'s explicit tens/units digit checks
/// rather than a generic "two digits" scan.
pub fn date_iso(input: &[u8], offset: usize) -> ParseOutcome {
    if input.len() - offset < 10 {
        return Err(WrongParser);
    }
    let mut i = offset;
    take_digits(input, i, 4).ok_or(WrongParser)?;
    i += 4;
    if input.get(i) != Some(&b'-') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 1, 12)?;
    if input.get(i) != Some(&b'-') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 1, 31)?;
    Ok(Parsed::slice(input, offset, i - offset))
}

/// `HH:MM:SS`, 24-hour range.
pub fn time_24hr(input: &[u8], offset: usize) -> ParseOutcome {
    let end = expect_hms(input, offset)?;
    Ok(Parsed::slice(input, offset, end - offset))
}

/// `HH:MM:SS` in 1-12 range, optionally followed by `AM`/`PM`
/// (`parser.c PARSER_Parse(Time12hr)`).
pub fn time_12hr(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = expect_two_digit_range(input, offset, 1, 12)?;
    if input.get(i) != Some(&b':') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 0, 59)?;
    if input.get(i) != Some(&b':') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 0, 60)?;
    if input[i..].starts_with(b"AM") || input[i..].starts_with(b"PM") {
        i += 2;
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

/// `[-]HH:MM:SS`, a signed elapsed duration (`parser.c PARSER_Parse(Duration)`).
pub fn duration(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    if input.get(i) == Some(&b'-') {
        i += 1;
    }
    let hours_start = i;
    while matches!(input.get(i), Some(c) if c.is_ascii_digit()) {
        i += 1;
    }
    if i == hours_start {
        return Err(WrongParser);
    }
    if input.get(i) != Some(&b':') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 0, 59)?;
    if input.get(i) != Some(&b':') {
        return Err(WrongParser);
    }
    i += 1;
    i = expect_two_digit_range(input, i, 0, 59)?;
    Ok(Parsed::slice(input, offset, i - offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3164_accepts_space_padded_day() {
        let parsed = date_rfc3164(b"Jul  1 08:09:10 rest", 0).unwrap();
        assert_eq!(parsed.consumed, 15);
    }

    #[test]
    fn rfc3164_is_case_insensitive_on_month() {
        assert!(date_rfc3164(b"JUL  1 08:09:10", 0).is_ok());
        assert!(date_rfc3164(b"jul  1 08:09:10", 0).is_ok());
    }

    #[test]
    fn rfc3164_tolerates_embedded_year_and_trailing_colon() {
        let parsed = date_rfc3164(b"Jul 28 2026 08:09:10: rest", 0).unwrap();
        assert_eq!(&input_slice(b"Jul 28 2026 08:09:10: rest", parsed.consumed), "Jul 28 2026 08:09:10:");
    }

    fn input_slice(input: &[u8], n: usize) -> String {
        String::from_utf8(input[..n].to_vec()).unwrap()
    }

    #[test]
    fn rfc5424_with_offset() {
        let parsed = date_rfc5424(b"2026-07-28T10:20:30.123+05:30 rest", 0).unwrap();
        assert_eq!(parsed.consumed, 30);
    }

    #[test]
    fn rfc5424_with_z() {
        let parsed = date_rfc5424(b"2026-07-28T10:20:30Z rest", 0).unwrap();
        assert_eq!(parsed.consumed, 20);
    }

    #[test]
    fn kernel_timestamp_requires_exact_digit_counts() {
        assert!(kernel_timestamp(b"[12345.678901]", 0).is_ok());
        assert!(kernel_timestamp(b"[1234.678901]", 0).is_err());
        assert!(kernel_timestamp(b"[12345.67890]", 0).is_err());
    }

    #[test]
    fn iso_date_rejects_month_13() {
        assert!(date_iso(b"2026-13-01", 0).is_err());
        assert!(date_iso(b"2026-12-01", 0).is_ok());
    }
}
