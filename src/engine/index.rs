//! Adjacency index over the corpus graph.
//!
//! Built once from the node set and edge list, then only read. Every service
//! id gets an entry in both maps, so a node with no edges has empty lists
//! rather than a missing key.
//!
//! ```text
//! edges: a ─REQUIRES─▶ b, a ─ENABLES─▶ c
//!
//! outgoing: a: [b/REQUIRES, c/ENABLES]   b: []   c: []
//! incoming: a: []   b: [a/REQUIRES]   c: [a/ENABLES]
//! ```
//!
//! Edges whose endpoints are not services are skipped (with a warning) rather
//! than indexed.

use crate::corpus::Corpus;
use crate::model::{Edge, EdgeKind};
use std::collections::HashMap;

/// One end of an edge, as seen from the other end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    outgoing: HashMap<String, Vec<Link>>,
    incoming: HashMap<String, Vec<Link>>,
}

impl GraphIndex {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self::build(corpus.services().map(|s| s.id.as_str()), corpus.edges())
    }

    /// Build from node ids and edges. Adjacency lists keep edge order.
    pub fn build<'a>(node_ids: impl IntoIterator<Item = &'a str>, edges: &[Edge]) -> Self {
        let mut outgoing: HashMap<String, Vec<Link>> = HashMap::new();
        let mut incoming: HashMap<String, Vec<Link>> = HashMap::new();
        for id in node_ids {
            outgoing.entry(id.to_string()).or_default();
            incoming.entry(id.to_string()).or_default();
        }

        let mut skipped = 0;
        for edge in edges {
            if !outgoing.contains_key(&edge.from) || !incoming.contains_key(&edge.to) {
                tracing::warn!(from = %edge.from, to = %edge.to, "skipping edge with unknown endpoint");
                skipped += 1;
                continue;
            }
            if let Some(out) = outgoing.get_mut(&edge.from) {
                out.push(Link { id: edge.to.clone(), kind: edge.kind });
            }
            if let Some(inc) = incoming.get_mut(&edge.to) {
                inc.push(Link { id: edge.from.clone(), kind: edge.kind });
            }
        }

        tracing::debug!(nodes = outgoing.len(), edges = edges.len() - skipped, skipped, "graph index built");
        GraphIndex { outgoing, incoming }
    }

    /// Outgoing links of `id`; empty for unknown ids.
    pub fn outgoing(&self, id: &str) -> &[Link] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming links of `id`; empty for unknown ids.
    pub fn incoming(&self, id: &str) -> &[Link] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.outgoing.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Test hook: reverse every adjacency list in place. Discovery and
    /// phase membership must not depend on list order.
    #[cfg(test)]
    pub(crate) fn reverse_adjacency(&mut self) {
        self.outgoing.values_mut().for_each(|links| links.reverse());
        self.incoming.values_mut().for_each(|links| links.reverse());
    }

    /// Test hook: rotate every adjacency list by `by` positions.
    #[cfg(test)]
    pub(crate) fn rotate_adjacency(&mut self, by: usize) {
        for links in self.outgoing.values_mut().chain(self.incoming.values_mut()) {
            if !links.is_empty() {
                let n = by % links.len();
                links.rotate_left(n);
            }
        }
    }
}
