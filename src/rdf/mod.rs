//! RDF data model
//!
//! Terms, triples and patterns exchanged with callers, plus the in-memory quad
//! store used by the in-process connection.
//!
//! # Example
//!
//! ```rust
//! use sparql_bridge::rdf::{Literal, RdfTerm, Triple, TriplePattern};
//!
//! let alice = RdfTerm::iri("http://example.org/alice").unwrap();
//! let name = RdfTerm::iri("http://xmlns.com/foaf/0.1/name").unwrap();
//! let triple = Triple::new(alice.clone(), name, Literal::new_simple_literal("Alice"));
//!
//! let pattern = TriplePattern::new(Some(alice), None, None);
//! assert!(pattern.matches(&triple));
//! ```

mod types;
mod store;

pub use types::{
    RdfError, RdfResult,
    RdfTerm, NamedNode, BlankNode, Literal, Triple,
    TriplePattern,
};

pub use store::RdfStore;
