//! Post-load literal-chain compaction (spec.md §4.F).
//!
//! Grounded in `pdag.c`'s `ln_dagOptimize` pass: the compiler emits one
//! `literal` edge per byte of a literal run (spec.md §4.C compilation
//! algorithm step 1); this pass walks the arena afterwards and, wherever a
//! node's sole edge is a literal whose target's sole edge is also a
//! literal, concatenates the two literal texts into one edge. Terminal
//! flags and tag attachments are never compacted across (spec.md §4.F
//! "must preserve terminal flags... do not compact across a terminal").

use crate::parsers::ParserImpl;
use crate::pdag::Pdag;

/// Runs the compaction pass over every node reachable in `dag`'s arena.
/// Safe to call on an already-optimized DAG (a no-op).
pub fn optimize(dag: &mut Pdag) {
    for index in 0..dag.len() {
        let id = crate::pdag::NodeId(index as u32);
        compact_from(dag, id);
    }
}

fn compact_from(dag: &mut Pdag, node: crate::pdag::NodeId) {
    loop {
        let Some((target, field_name_none)) = sole_literal_edge(dag, node) else { break };
        if !field_name_none {
            break;
        }
        // Never compact through a node the matcher can stop at: a terminal
        // node is an accepting state in its own right even if it also has
        // an outgoing edge, so merging past it would change which prefixes
        // the matcher can terminate on.
        if dag.node(target).terminal {
            break;
        }
        let Some((next_target, next_field_name_none)) = sole_literal_edge(dag, target) else { break };
        if !next_field_name_none {
            break;
        }
        let first_text = literal_text(dag, node, 0);
        let second_text = literal_text(dag, target, 0);
        let merged = format!("{}{}", first_text, second_text);
        let edge = &mut dag.node_mut(node).edges[0];
        edge.parser = ParserImpl::literal(merged);
        edge.target = next_target;
        // loop again: the new target may itself be compactable further.
    }
}

/// If `node` has exactly one outgoing edge and it is a `literal`, returns
/// its target and whether the edge captures nothing (literals never
/// capture in a well-formed rulebase, but this guards the invariant rather
/// than assuming it).
fn sole_literal_edge(dag: &Pdag, node: crate::pdag::NodeId) -> Option<(crate::pdag::NodeId, bool)> {
    let n = dag.node(node);
    if n.edges.len() != 1 {
        return None;
    }
    match &n.edges[0].parser {
        ParserImpl::Literal(_) => Some((n.edges[0].target, n.edges[0].field_name.is_none())),
        _ => None,
    }
}

fn literal_text(dag: &Pdag, node: crate::pdag::NodeId, edge_index: usize) -> String {
    match &dag.node(node).edges[edge_index].parser {
        ParserImpl::Literal(cfg) => cfg.text.clone(),
        _ => unreachable!("literal_text called on a non-literal edge"),
    }
}
