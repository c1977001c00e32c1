//! The Parse DAG (spec.md §3 "PDAG node"/"Parser edge", §4.B).
//!
//! The teacher keeps its grammar as a graph of `Rc<dyn IProduction>` trait
//! objects reachable from a handful of roots. Here the "DAG" is, per
//! spec.md §9, in practice a tree built incrementally by the compiler but
//! with genuine node sharing for common literal prefixes — so nodes live in
//! an arena (`Vec<PdagNode>`) and edges hold small integer indices
//! (`NodeId`) rather than pointers, which is the natural Rust substitute for
//! the "allocation-efficient, cycle-free structure" spec.md §9 asks for.

use crate::parsers::ParserImpl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// One outgoing edge of a [`PdagNode`]: a parser instance plus the node it
/// leads to on success (spec.md §3 "Parser edge").
pub struct ParserEdge {
    pub parser: ParserImpl,
    /// `None` means "do not capture" (the rulebase's `%-:type%` / bare `-`).
    pub field_name: Option<String>,
    pub target: NodeId,
}

impl ParserEdge {
    /// The identity spec.md §3 uses to decide whether two edges at the same
    /// node are "the same edge" and should be merged: same parser kind,
    /// same field name, and for literals, the same first byte (literal
    /// edges with differing first bytes are always kept distinct, per
    /// spec.md §9 "Duplicate-edge semantics for literals").
    fn matches(&self, parser: &ParserImpl, field_name: Option<&str>) -> bool {
        if self.field_name.as_deref() != field_name {
            return false;
        }
        self.parser.merge_key() == parser.merge_key()
    }
}

/// A node of the PDAG: an ordered list of outgoing edges, tried in
/// insertion order during matching (spec.md §4.B: "the only precedence
/// mechanism"), plus an optional terminal tag list.
#[derive(Default)]
pub struct PdagNode {
    pub edges: Vec<ParserEdge>,
    pub terminal: bool,
    pub tags: Vec<String>,
}

/// An arena of [`PdagNode`]s rooted at index 0. Owned wholly by the
/// [`crate::Context`] (or, for a named type, by the type's entry in the
/// context's type table); nodes and edges are created by the compiler and
/// never individually destroyed, only freed en masse when the owning
/// `Pdag` is dropped (spec.md §3 "Lifecycles").
#[derive(Default)]
pub struct Pdag {
    nodes: Vec<PdagNode>,
}

impl Pdag {
    pub fn new() -> Self {
        let mut dag = Pdag { nodes: Vec::new() };
        dag.new_node();
        dag
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn new_node(&mut self) -> NodeId {
        self.nodes.push(PdagNode::default());
        NodeId((self.nodes.len() - 1) as u32)
    }

    pub fn node(&self, id: NodeId) -> &PdagNode {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PdagNode {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Insert (or find an equivalent existing) edge out of `from` for
    /// `parser`/`field_name`, returning its target node. Implements the
    /// merge-on-insert rule of spec.md §4.B: "On edge insertion the
    /// compiler searches the list for an equivalent edge ...; if found,
    /// insertion returns the existing edge's target node; otherwise a new
    /// target node is created and appended."
    pub fn insert_edge(
        &mut self,
        from: NodeId,
        parser: ParserImpl,
        field_name: Option<String>,
    ) -> NodeId {
        if let Some(existing) = self
            .node(from)
            .edges
            .iter()
            .find(|edge| edge.matches(&parser, field_name.as_deref()))
        {
            return existing.target;
        }
        let target = self.new_node();
        self.node_mut(from).edges.push(ParserEdge {
            parser,
            field_name,
            target,
        });
        target
    }

    pub fn mark_terminal(&mut self, node: NodeId, tags: Vec<String>) {
        let n = self.node_mut(node);
        n.terminal = true;
        n.tags = tags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ParserImpl;

    #[test]
    fn duplicate_literal_edges_with_same_first_byte_merge() {
        let mut dag = Pdag::new();
        let root = dag.root();
        let t1 = dag.insert_edge(root, ParserImpl::literal("foo"), None);
        let t2 = dag.insert_edge(root, ParserImpl::literal("foo"), None);
        assert_eq!(t1, t2);
        assert_eq!(dag.node(root).edges.len(), 1);
    }

    #[test]
    fn literal_edges_with_different_first_byte_stay_distinct() {
        let mut dag = Pdag::new();
        let root = dag.root();
        dag.insert_edge(root, ParserImpl::literal("foo"), None);
        dag.insert_edge(root, ParserImpl::literal("bar"), None);
        assert_eq!(dag.node(root).edges.len(), 2);
    }
}
