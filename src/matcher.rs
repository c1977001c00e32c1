//! The recursive backtracking matcher (spec.md §3 "Result object", §4.C,
//! §9 "Explicit recursion not exceptions").
//!
//! Grounded in `pdag.c`'s `ln_normalizeRec`: at each node, try every
//! outgoing edge in insertion order; on a parser's success, recurse into
//! the edge's target node at the new offset. A node is "terminal" when a
//! rule ends there. The original tracks a single `endNode` pointer that
//! the deepest successful recursion writes once and every enclosing frame
//! reads back unchanged — reimplemented here as an explicit `accept`
//! predicate threaded through the recursion so the same function serves
//! both the top-level match (which must also reach end-of-input) and
//! embedded sub-dag matches used by named types and `repeat` (which only
//! need to land on a terminal node, consuming a prefix of their input).

use crate::pdag::{NodeId, Pdag};
use crate::value::{Fields, Value};

/// One recursive attempt's outcome: how far it got and, if it reached an
/// accepting node, the captured fields and the tags attached there.
struct Attempt {
    consumed: usize,
    fields: Fields,
    tags: Vec<String>,
}

/// Outcome of a top-level [`normalize`] call that did not produce a
/// complete match: the furthest offset any edge attempt reached before the
/// matcher concluded non-match (spec.md §3 "furthest reached", used to
/// populate `unparsed-data`).
pub struct NoMatch {
    pub furthest: usize,
}

/// Runs the matcher starting at `dag`'s root, requiring the match to both
/// land on a terminal node and consume the entire input (spec.md §4.C
/// "Success requires reaching a terminal node exactly at the end of
/// input"). Returns the captured fields and tags on success, or the
/// furthest offset reached on failure.
pub fn normalize(dag: &Pdag, input: &[u8]) -> Result<(Fields, Vec<String>), NoMatch> {
    let mut furthest = 0usize;
    match recurse(dag, dag.root(), input, 0, &mut furthest, &|offset, node| {
        node.terminal && offset == input.len()
    }) {
        Some(attempt) => Ok((attempt.fields, attempt.tags)),
        None => Err(NoMatch { furthest }),
    }
}

/// Runs the matcher as an embedded sub-grammar (a named type reference or
/// one iteration of `repeat`): accepts as soon as a terminal node is
/// reached, without requiring the rest of `input` to be consumed. Returns
/// the bytes actually consumed plus the captured fields.
pub fn match_subdag(dag: &Pdag, input: &[u8], offset: usize) -> Option<(usize, Fields)> {
    let mut furthest = offset;
    let attempt = recurse(dag, dag.root(), input, offset, &mut furthest, &|_offset, node| {
        node.terminal
    })?;
    Some((attempt.consumed - offset, attempt.fields))
}

fn recurse(
    dag: &Pdag,
    node_id: NodeId,
    input: &[u8],
    offset: usize,
    furthest: &mut usize,
    accept: &dyn Fn(usize, &crate::pdag::PdagNode) -> bool,
) -> Option<Attempt> {
    let node = dag.node(node_id);

    for edge in &node.edges {
        let parsed = match edge.parser.parse(input, offset) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };
        let next_offset = offset + parsed.consumed;
        if next_offset > *furthest {
            *furthest = next_offset;
        }
        if let Some(mut inner) = recurse(dag, edge.target, input, next_offset, furthest, accept) {
            if let Some(name) = &edge.field_name {
                inner.fields.insert(name.clone(), parsed.value);
            }
            return Some(inner);
        }
    }

    if accept(offset, node) {
        return Some(Attempt {
            consumed: offset,
            fields: Fields::new(),
            tags: node.tags.clone(),
        });
    }

    None
}

/// Wraps [`match_subdag`]'s result the way a parser kind that embeds
/// another PDAG (`type_ref`, `repeat`) needs it: a plain string when the
/// sub-match captured no named fields, or a nested object when it did
/// (spec.md §4.A "named-type references decompose like any other
/// structured parser once they capture sub-fields").
pub fn subdag_value(input: &[u8], offset: usize, consumed: usize, fields: Fields) -> Value {
    if fields.is_empty() {
        Value::String(String::from_utf8_lossy(&input[offset..offset + consumed]).into_owned())
    } else {
        Value::Object(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ParserImpl;

    #[test]
    fn normalize_requires_full_consumption() {
        let mut dag = Pdag::new();
        let root = dag.root();
        let t1 = dag.insert_edge(root, ParserImpl::literal("foo"), Some("a".into()));
        dag.mark_terminal(t1, vec!["matched".into()]);

        assert!(normalize(&dag, b"foo").is_ok());
        assert!(normalize(&dag, b"foobar").is_err());
    }

    #[test]
    fn furthest_reached_reports_high_water_mark() {
        let mut dag = Pdag::new();
        let root = dag.root();
        // "foobar" matches 6 bytes before dead-ending (no further edges,
        // node not terminal); the literal alternative only gets to 3.
        let dead_end = dag.insert_edge(root, ParserImpl::literal("foobar"), None);
        let _ = dead_end;
        dag.insert_edge(root, ParserImpl::literal("foo"), None);

        match normalize(&dag, b"foobarbaz") {
            Err(no_match) => assert_eq!(no_match.furthest, 6),
            Ok(_) => panic!("expected no match"),
        }
    }

    #[test]
    fn match_subdag_accepts_prefix() {
        let mut dag = Pdag::new();
        let root = dag.root();
        let t1 = dag.insert_edge(root, ParserImpl::literal("foo"), None);
        dag.mark_terminal(t1, vec![]);

        let (consumed, fields) = match_subdag(&dag, b"foobar", 0).unwrap();
        assert_eq!(consumed, 3);
        assert!(fields.is_empty());
    }

    #[test]
    fn backtracks_across_sibling_edges() {
        // `Word` greedily consumes the whole input and dead-ends (its
        // target has no edges and isn't terminal); the matcher must fall
        // back to the sibling literal edge rather than give up.
        let mut dag = Pdag::new();
        let root = dag.root();
        dag.insert_edge(root, ParserImpl::Word, None);
        let right = dag.insert_edge(root, ParserImpl::literal("foobar"), None);
        dag.mark_terminal(right, vec![]);

        assert!(normalize(&dag, b"foobar").is_ok());
    }
}
