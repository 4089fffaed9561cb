//! In-memory quad store
//!
//! Backs the in-process [`MemoryConnection`](crate::connection::memory::MemoryConnection).
//! Triples are partitioned by graph name; a subject index per graph keeps
//! subject-bound pattern lookups from scanning the whole graph.

use super::types::{RdfTerm, Triple, TriplePattern};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct GraphPartition {
    triples: HashSet<Triple>,
    by_subject: HashMap<RdfTerm, HashSet<Triple>>,
}

impl GraphPartition {
    fn insert(&mut self, triple: Triple) -> bool {
        if !self.triples.insert(triple.clone()) {
            return false;
        }
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .insert(triple);
        true
    }

    fn remove(&mut self, triple: &Triple) -> bool {
        if !self.triples.remove(triple) {
            return false;
        }
        if let Some(bucket) = self.by_subject.get_mut(&triple.subject) {
            bucket.remove(triple);
            if bucket.is_empty() {
                self.by_subject.remove(&triple.subject);
            }
        }
        true
    }

    fn matching<'a>(&'a self, pattern: &'a TriplePattern) -> Box<dyn Iterator<Item = &'a Triple> + 'a> {
        match &pattern.subject {
            Some(subject) => match self.by_subject.get(subject) {
                Some(bucket) => Box::new(bucket.iter().filter(move |t| pattern.matches(t))),
                None => Box::new(std::iter::empty()),
            },
            None => Box::new(self.triples.iter().filter(move |t| pattern.matches(t))),
        }
    }
}

/// Quad store keyed by graph name
#[derive(Debug, Clone, Default)]
pub struct RdfStore {
    graphs: HashMap<String, GraphPartition>,
}

impl RdfStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple into a graph. Returns false if it was already present.
    pub fn insert(&mut self, graph: &str, triple: Triple) -> bool {
        self.graphs.entry(graph.to_string()).or_default().insert(triple)
    }

    /// Remove a triple from a graph. Returns false if it was not present.
    pub fn remove(&mut self, graph: &str, triple: &Triple) -> bool {
        self.graphs
            .get_mut(graph)
            .map(|partition| partition.remove(triple))
            .unwrap_or(false)
    }

    /// Remove every triple matching `pattern` from a graph, returning how many went
    pub fn remove_matching(&mut self, graph: &str, pattern: &TriplePattern) -> usize {
        let Some(partition) = self.graphs.get_mut(graph) else {
            return 0;
        };
        let doomed: Vec<Triple> = partition.matching(pattern).cloned().collect();
        for triple in &doomed {
            partition.remove(triple);
        }
        doomed.len()
    }

    /// Check if a graph holds a triple
    pub fn contains(&self, graph: &str, triple: &Triple) -> bool {
        self.graphs
            .get(graph)
            .map(|partition| partition.triples.contains(triple))
            .unwrap_or(false)
    }

    /// Drop every triple of one graph
    pub fn clear_graph(&mut self, graph: &str) {
        self.graphs.remove(graph);
    }

    /// Number of triples in one graph
    pub fn graph_len(&self, graph: &str) -> usize {
        self.graphs.get(graph).map(|p| p.triples.len()).unwrap_or(0)
    }

    /// Total number of triples across all graphs
    pub fn len(&self) -> usize {
        self.graphs.values().map(|p| p.triples.len()).sum()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Triples matching a pattern, in one graph or (with `None`) across all of them.
    ///
    /// Each hit is paired with the name of the graph holding it.
    pub fn query(&self, graph: Option<&str>, pattern: &TriplePattern) -> Vec<(String, Triple)> {
        let mut hits = Vec::new();
        for (name, partition) in &self.graphs {
            if graph.map_or(false, |g| g != name.as_str()) {
                continue;
            }
            hits.extend(partition.matching(pattern).map(|t| (name.clone(), t.clone())));
        }
        hits
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::types::Literal;

    const SOCIAL: &str = "http://example.org/graph/social";
    const WORK: &str = "http://example.org/graph/work";

    fn alice_name() -> Triple {
        Triple::new(
            RdfTerm::iri("http://example.org/alice").unwrap(),
            RdfTerm::iri("http://xmlns.com/foaf/0.1/name").unwrap(),
            Literal::new_simple_literal("Alice"),
        )
    }

    #[test]
    fn test_insert_is_per_graph() {
        let mut store = RdfStore::new();
        assert!(store.insert(SOCIAL, alice_name()));
        assert!(!store.insert(SOCIAL, alice_name()));
        assert!(store.insert(WORK, alice_name()));

        assert_eq!(store.graph_len(SOCIAL), 1);
        assert_eq!(store.len(), 2);
        assert!(store.contains(WORK, &alice_name()));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = RdfStore::new();
        store.insert(SOCIAL, alice_name());
        store.insert(WORK, alice_name());

        assert!(store.remove(SOCIAL, &alice_name()));
        assert!(!store.remove(SOCIAL, &alice_name()));

        store.clear_graph(WORK);
        assert!(store.is_empty());
        assert_eq!(store.graph_len(WORK), 0);
    }

    #[test]
    fn test_query_by_pattern() {
        let mut store = RdfStore::new();
        let alice = RdfTerm::iri("http://example.org/alice").unwrap();
        let age = RdfTerm::iri("http://xmlns.com/foaf/0.1/age").unwrap();
        store.insert(SOCIAL, alice_name());
        store.insert(SOCIAL, Triple::new(alice.clone(), age.clone(), Literal::new_simple_literal("30")));
        store.insert(WORK, alice_name());

        let by_subject = TriplePattern::new(Some(alice), None, None);
        assert_eq!(store.query(Some(SOCIAL), &by_subject).len(), 2);
        assert_eq!(store.query(None, &by_subject).len(), 3);

        let by_predicate = TriplePattern::new(None, Some(age), None);
        assert_eq!(store.query(None, &by_predicate).len(), 1);

        assert_eq!(store.remove_matching(SOCIAL, &TriplePattern::any()), 2);
        assert_eq!(store.graph_len(SOCIAL), 0);
        assert_eq!(store.graph_len(WORK), 1);
    }
}
