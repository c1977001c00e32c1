//! Parsers that embed another PDAG: a named-type reference and `repeat`.
//! Grounded in `pdag.c`'s sub-dag invocation for `%field:@type%` and
//! `parser.c`'s `data_Repeat`/`PARSER_Parse(Repeat)`.

use super::{ParseOutcome, Parsed};
use crate::error::WrongParser;
use crate::matcher;
use crate::pdag::Pdag;
use crate::value::Value;
use std::rc::Rc;

pub struct TypeRefConfig {
    pub dag: Rc<Pdag>,
}

/// `%field:@typename%`: matches the referenced type's own PDAG as an
/// embedded sub-grammar (terminal-only acceptance, not full-input), then
/// folds its captures in (spec.md §4.A "named-type references").
pub fn type_ref(cfg: &TypeRefConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let (consumed, fields) = matcher::match_subdag(&cfg.dag, input, offset).ok_or(WrongParser)?;
    let value = matcher::subdag_value(input, offset, consumed, fields);
    Ok(Parsed::new(consumed, value))
}

pub struct RepeatConfig {
    /// Sub-dag producing one array element per iteration.
    pub element: Rc<Pdag>,
    /// Sub-dag that must also match after an element before the loop
    /// continues (e.g. a separator); its consumed bytes count toward the
    /// total, mirroring `data_Repeat`'s `while` condition.
    pub while_cond: Option<Rc<Pdag>>,
}

/// Repeatedly matches `element` (optionally interleaved with
/// `while_cond`) for as long as both keep matching, producing a JSON-style
/// array of the per-iteration captures.
///
/// `parser.c`'s `data_Repeat` runs as a do-while: the first `element` match
/// is unconditional, then `while_cond` is consulted before every further
/// iteration, and a `while_cond` match's bytes are folded into the total
/// consumed count rather than discarded.
pub fn repeat(cfg: &RepeatConfig, input: &[u8], offset: usize) -> ParseOutcome {
    let mut items = Vec::new();
    let mut i = offset;

    let (consumed, fields) = matcher::match_subdag(&cfg.element, input, i).ok_or(WrongParser)?;
    items.push(matcher::subdag_value(input, i, consumed, fields));
    i += consumed;

    loop {
        if let Some(while_dag) = &cfg.while_cond {
            match matcher::match_subdag(while_dag, input, i) {
                Some((while_consumed, _)) => i += while_consumed,
                None => break,
            }
        }
        match matcher::match_subdag(&cfg.element, input, i) {
            Some((consumed, fields)) if consumed > 0 => {
                items.push(matcher::subdag_value(input, i, consumed, fields));
                i += consumed;
            }
            _ => break,
        }
    }

    if items.is_empty() {
        return Err(WrongParser);
    }
    Ok(Parsed::new(i - offset, Value::Array(items)))
}

/// An optional `regex` parser kind, only reachable when a
/// [`crate::Context`] was built with `allow_regex` (spec.md §4.A "no regex
/// parser by default").
pub fn regex_match(re: &regex::bytes::Regex, input: &[u8], offset: usize) -> ParseOutcome {
    match re.find(&input[offset..]) {
        Some(m) if m.start() == 0 => Ok(Parsed::slice(input, offset, m.end())),
        _ => Err(WrongParser),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ParserImpl;

    fn single_literal_dag(text: &str) -> Rc<Pdag> {
        let mut dag = Pdag::new();
        let root = dag.root();
        let target = dag.insert_edge(root, ParserImpl::literal(text), Some("v".into()));
        dag.mark_terminal(target, vec![]);
        Rc::new(dag)
    }

    #[test]
    fn type_ref_matches_prefix_of_longer_input() {
        let cfg = TypeRefConfig { dag: single_literal_dag("foo") };
        let parsed = type_ref(&cfg, b"foobar", 0).unwrap();
        assert_eq!(parsed.consumed, 3);
    }

    #[test]
    fn repeat_collects_every_matching_iteration() {
        let cfg = RepeatConfig { element: single_literal_dag("ab"), while_cond: None };
        let parsed = repeat(&cfg, b"ababab", 0).unwrap();
        assert_eq!(parsed.consumed, 6);
        match parsed.value {
            Value::Array(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn repeat_stops_when_while_cond_fails() {
        let cfg = RepeatConfig {
            element: single_literal_dag("ab"),
            while_cond: Some(single_literal_dag(",")),
        };
        let parsed = repeat(&cfg, b"ab,ab,ab!", 0).unwrap();
        assert_eq!(parsed.consumed, 8); // "ab,ab,ab" -- trailing "!" left unconsumed
    }
}
