//! Network-address and related structured parsers: `ipv4`, `ipv6`,
//! `mac48`, `cisco-interface-spec`, `v2-iptables`. Grounded in
//! `parser.c`'s `chkIPv4AddrByte`/`PARSER_Parse(IPv4)`, `PARSER_Parse(IPv6)`,
//! `PARSER_Parse(MAC48)`, `PARSER_Parse(CiscoInterfaceSpec)` and
//! `parseIPTablesNameValue`/`PARSER_Parse(v2IPTables)`.

use super::{ParseOutcome, Parsed};
use crate::error::WrongParser;
use crate::value::{Fields, Value};

/// Consumes 1-3 digits forming a byte value 0-255, never accepting a
/// leading zero on a multi-digit group (`chkIPv4AddrByte`).
fn chk_ipv4_byte(input: &[u8], offset: usize) -> Option<usize> {
    let mut i = offset;
    while matches!(input.get(i), Some(c) if c.is_ascii_digit()) && i - offset < 3 {
        i += 1;
    }
    if i == offset {
        return None;
    }
    if input[offset] == b'0' && i - offset > 1 {
        return None;
    }
    let value: u32 = std::str::from_utf8(&input[offset..i]).unwrap().parse().ok()?;
    if value > 255 { None } else { Some(i) }
}

pub fn ipv4(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    for octet in 0..4 {
        i = chk_ipv4_byte(input, i).ok_or(WrongParser)?;
        if octet < 3 {
            if input.get(i) != Some(&b'.') {
                return Err(WrongParser);
            }
            i += 1;
        }
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

/// Scans colon-separated hex blocks allowing one `::` abbreviation and an
/// optional trailing embedded IPv4 dotted-quad, mirroring the block-scan in
/// `parser.c PARSER_Parse(IPv6)` rather than delegating to `std::net`
/// (which rejects several forms the original accepts, like a bare `::`).
/// Per spec.md §4.A: the match must be followed by whitespace or
/// end-of-input, and a bare `::` (zero explicit blocks either side of the
/// abbreviation) is itself a valid address, not an empty non-match.
pub fn ipv6(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    let mut blocks = 0usize;
    let mut seen_abbrev = false;

    if input[i..].starts_with(b"::") {
        seen_abbrev = true;
        i += 2;
    }

    loop {
        if let Ok(ipv4_parsed) = ipv4(input, i) {
            i += ipv4_parsed.consumed;
            blocks += 2;
            break;
        }
        let block_start = i;
        while matches!(input.get(i), Some(c) if c.is_ascii_hexdigit()) && i - block_start < 4 {
            i += 1;
        }
        if i == block_start {
            break;
        }
        blocks += 1;
        if input[i..].starts_with(b"::") {
            if seen_abbrev {
                return Err(WrongParser);
            }
            seen_abbrev = true;
            i += 2;
            continue;
        }
        if input.get(i) == Some(&b':') {
            i += 1;
            continue;
        }
        break;
    }

    if i == offset {
        // Neither a `::` abbreviation nor a single hex block was found.
        return Err(WrongParser);
    }
    if !seen_abbrev && blocks != 8 {
        return Err(WrongParser);
    }
    if seen_abbrev && blocks >= 8 {
        return Err(WrongParser);
    }
    match input.get(i) {
        None => {}
        Some(c) if c.is_ascii_whitespace() => {}
        _ => return Err(WrongParser),
    }
    Ok(Parsed::slice(input, offset, i - offset))
}

/// `XX:XX:XX:XX:XX:XX`, exactly 17 characters, hex pairs separated by a
/// single consistent delimiter (`:` or `-`) — `parser.c PARSER_Parse(MAC48)`.
pub fn mac48(input: &[u8], offset: usize) -> ParseOutcome {
    let candidate = input.get(offset..offset + 17).ok_or(WrongParser)?;
    let sep = candidate[2];
    if sep != b':' && sep != b'-' {
        return Err(WrongParser);
    }
    for (idx, &b) in candidate.iter().enumerate() {
        match idx % 3 {
            2 => {
                if b != sep {
                    return Err(WrongParser);
                }
            }
            _ => {
                if !b.is_ascii_hexdigit() {
                    return Err(WrongParser);
                }
            }
        }
    }
    Ok(Parsed::slice(input, offset, 17))
}

/// Cisco `interface-spec`: `[iface:]ip/port [(ip2/port2)] [[SP](user)]`
/// (spec.md §4.A), tracked with the same have-interface/have-ip2/have-user
/// optional-component logic as `parser.c PARSER_Parse(CiscoInterfaceSpec)`.
/// Produces an object with `interface` (if present), `ip`, `port`, and
/// optional `ip2`/`port2`/`user`.
pub fn cisco_interface_spec(input: &[u8], offset: usize) -> ParseOutcome {
    if matches!(input.get(offset), None | Some(b':') | Some(b' ') | Some(b'\t')) {
        return Err(WrongParser);
    }

    let mut i = offset;
    let mut fields = Fields::new();

    // Decide interface-vs-ip by trying an IPv4 parse first; if that fails,
    // scan for a colon-delimited interface name instead.
    let (idx_ip_start, has_interface) = if let Ok(parsed) = ipv4(input, i) {
        i += parsed.consumed;
        (i - parsed.consumed, false)
    } else {
        let iface_start = i;
        while i < input.len() && input[i] != b':' {
            if input[i].is_ascii_whitespace() {
                return Err(WrongParser);
            }
            i += 1;
        }
        if i >= input.len() {
            return Err(WrongParser);
        }
        fields.insert(
            "interface",
            Value::String(String::from_utf8_lossy(&input[iface_start..i]).into_owned()),
        );
        i += 1; // skip ':'
        let ip_start = i;
        let parsed = ipv4(input, i)?;
        i += parsed.consumed;
        (ip_start, true)
    };
    let _ = has_interface;
    fields.insert(
        "ip",
        Value::String(String::from_utf8_lossy(&input[idx_ip_start..i]).into_owned()),
    );

    if input.get(i) != Some(&b'/') {
        return Err(WrongParser);
    }
    i += 1;
    let port_start = i;
    let port = super::numeric::number(input, i)?;
    i += port.consumed;
    fields.insert("port", Value::String(String::from_utf8_lossy(&input[port_start..i]).into_owned()));

    // Optional " (ip2/port2)".
    if input[i..].starts_with(b" (") {
        let mut j = i + 2;
        let ip2_start = j;
        if let Ok(ip2) = ipv4(input, j) {
            j += ip2.consumed;
            if input.get(j) == Some(&b'/') {
                j += 1;
                let port2_start = j;
                if let Ok(port2) = super::numeric::number(input, j) {
                    j += port2.consumed;
                    if input.get(j) == Some(&b')') {
                        fields.insert(
                            "ip2",
                            Value::String(String::from_utf8_lossy(&input[ip2_start..ip2_start + ip2.consumed]).into_owned()),
                        );
                        fields.insert(
                            "port2",
                            Value::String(String::from_utf8_lossy(&input[port2_start..port2_start + port2.consumed]).into_owned()),
                        );
                        i = j + 1;
                    }
                }
            }
        }
    }

    // Optional "(user)" or " (user)".
    let (user_open, has_space) = if input.get(i) == Some(&b'(') {
        (i, false)
    } else if input[i..].starts_with(b" (") {
        (i + 1, true)
    } else {
        (i, false)
    };
    if input.get(user_open) == Some(&b'(') {
        let user_start = user_open + 1;
        let mut j = user_start;
        while j < input.len() && !input[j].is_ascii_whitespace() && input[j] != b')' {
            j += 1;
        }
        if input.get(j) == Some(&b')') && j > user_start {
            fields.insert(
                "user",
                Value::String(String::from_utf8_lossy(&input[user_start..j]).into_owned()),
            );
            i = j + 1;
            let _ = has_space;
        }
    }

    Ok(Parsed::new(i - offset, Value::Object(fields)))
}

/// Netfilter `v2IPTables` log line fields: a run of `NAME[=value]` pairs
/// (uppercase-only names per `isValidIPTablesNameChar`), separated by
/// exactly one space, requiring at least two pairs to avoid misfiring on a
/// single stray `KEY=value` token. Unlike the generic name-value-list kind,
/// a bare name with no `=value` is a valid flag (`DF`, `SYN`, ...) and is
/// recorded with a null value, matching `parseIPTablesNameValue`'s
/// `iVal == -1` case. Grounded in `parser.c parseIPTablesNameValue`/
/// `PARSER_Parse(v2IPTables)`: a candidate pair that doesn't conform fails
/// the whole parse immediately (`CHKR`), it is never silently dropped from
/// the reported consumed length.
pub fn v2_iptables(input: &[u8], offset: usize) -> ParseOutcome {
    let mut i = offset;
    let mut fields = Fields::new();
    let mut pairs = 0usize;
    while i < input.len() {
        let name_start = i;
        while matches!(input.get(i), Some(&c) if c.is_ascii_uppercase()) {
            i += 1;
        }
        if i == name_start || (i < input.len() && input[i] != b'=' && input[i] != b' ') {
            return Err(WrongParser);
        }
        let name = String::from_utf8_lossy(&input[name_start..i]).into_owned();
        if input.get(i) == Some(&b'=') {
            i += 1;
            let value_start = i;
            while matches!(input.get(i), Some(c) if !c.is_ascii_whitespace()) {
                i += 1;
            }
            let value = String::from_utf8_lossy(&input[value_start..i]).into_owned();
            fields.insert(name, Value::String(value));
        } else {
            fields.insert(name, Value::Null);
        }
        pairs += 1;
        // Exactly one SP is permitted between fields.
        if input.get(i) == Some(&b' ') {
            i += 1;
        }
    }
    if pairs < 2 {
        return Err(WrongParser);
    }
    Ok(Parsed::new(i - offset, Value::Object(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_rejects_leading_zero_multidigit() {
        assert!(ipv4(b"192.168.01.1", 0).is_err());
        assert!(ipv4(b"192.168.0.1", 0).is_ok());
    }

    #[test]
    fn ipv4_rejects_octet_over_255() {
        assert!(ipv4(b"256.1.1.1", 0).is_err());
    }

    #[test]
    fn ipv6_accepts_double_colon_abbreviation() {
        assert!(ipv6(b"fe80::1", 0).is_ok());
        assert!(ipv6(b"::1", 0).is_ok());
    }

    #[test]
    fn ipv6_accepts_embedded_ipv4() {
        assert!(ipv6(b"::ffff:192.168.1.1", 0).is_ok());
    }

    #[test]
    fn ipv6_accepts_bare_double_colon() {
        assert!(ipv6(b"::", 0).is_ok());
    }

    #[test]
    fn ipv6_rejects_pure_ipv4_text() {
        assert!(ipv6(b"1.2.3.4", 0).is_err());
    }

    #[test]
    fn ipv6_requires_whitespace_or_end_after_the_address() {
        assert!(ipv6(b"1:2:3:4:5:6:7:8", 0).is_ok());
        assert!(ipv6(b"1:2:3:4:5:6:7:8, rest", 0).is_err());
        assert!(ipv6(b"fe80::1 rest", 0).is_ok());
    }

    #[test]
    fn mac48_requires_consistent_delimiter() {
        assert!(mac48(b"00:11:22:33:44:55", 0).is_ok());
        assert!(mac48(b"00:11:22-33:44:55", 0).is_err());
    }

    #[test]
    fn v2_iptables_requires_two_fields() {
        assert!(v2_iptables(b"SRC=1.2.3.4", 0).is_err());
        assert!(v2_iptables(b"SRC=1.2.3.4 DST=5.6.7.8", 0).is_ok());
    }

    #[test]
    fn v2_iptables_accepts_a_bare_flag_name() {
        let parsed = v2_iptables(b"SRC=1.2.3.4 DF SYN", 0).unwrap();
        match parsed.value {
            Value::Object(fields) => {
                assert_eq!(fields.get("DF"), Some(&Value::Null));
                assert_eq!(fields.get("SYN"), Some(&Value::Null));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn v2_iptables_fails_whole_parse_on_malformed_tail() {
        assert!(v2_iptables(b"SRC=1.2.3.4 DST=5.6.7.8 lowercase", 0).is_err());
    }

    #[test]
    fn cisco_interface_spec_with_interface_and_user() {
        let parsed = cisco_interface_spec(b"outside:10.1.1.1/80 (jdoe)", 0).unwrap();
        match parsed.value {
            Value::Object(fields) => {
                assert_eq!(fields.get("interface"), Some(&Value::String("outside".into())));
                assert_eq!(fields.get("ip"), Some(&Value::String("10.1.1.1".into())));
                assert_eq!(fields.get("port"), Some(&Value::String("80".into())));
                assert_eq!(fields.get("user"), Some(&Value::String("jdoe".into())));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn cisco_interface_spec_without_interface() {
        let parsed = cisco_interface_spec(b"10.1.1.1/80", 0).unwrap();
        match parsed.value {
            Value::Object(fields) => {
                assert!(!fields.contains("interface"));
                assert_eq!(fields.get("ip"), Some(&Value::String("10.1.1.1".into())));
                assert_eq!(fields.get("port"), Some(&Value::String("80".into())));
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn cisco_interface_spec_with_second_ip() {
        let parsed = cisco_interface_spec(b"10.1.1.1/80 (10.2.2.2/81)", 0).unwrap();
        match parsed.value {
            Value::Object(fields) => {
                assert_eq!(fields.get("ip2"), Some(&Value::String("10.2.2.2".into())));
                assert_eq!(fields.get("port2"), Some(&Value::String("81".into())));
            }
            _ => panic!("expected object"),
        }
    }
}
