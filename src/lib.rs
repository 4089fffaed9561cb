//! SPARQL Bridge
//!
//! Client-side bridge that exposes a remote quad store through a graph-pattern
//! API. Pattern matches, counts and bulk mutations are compiled into the
//! store's extended SPARQL dialect and executed over a caller-supplied
//! connection; result rows are decoded back into RDF terms.
//!
//! # Layout
//!
//! - [`rdf`]: terms, triples, patterns and an in-memory quad store
//! - [`codec`]: term ⇄ parameter slots, inline text and native row values
//! - [`sparql`]: statement builder, pattern compiler, rewriter, cursors, queries
//! - [`mutation`]: batched add/delete, pattern delete, transactions
//! - [`connection`]: the remote execution surface and its in-process double
//! - [`graph`]: the [`GraphHandle`] and its graph-level operations
//! - [`config`]: YAML configuration for handles
//!
//! ## Example Usage
//!
//! ```rust
//! use sparql_bridge::connection::MemoryConnection;
//! use sparql_bridge::graph::GraphHandle;
//! use sparql_bridge::rdf::{Literal, RdfTerm, Triple, TriplePattern};
//!
//! let mut graph = GraphHandle::with_graph(Box::new(MemoryConnection::new()), "http://example.org/people");
//!
//! let alice = RdfTerm::iri("http://example.org/alice").unwrap();
//! let name = RdfTerm::iri("http://xmlns.com/foaf/0.1/name").unwrap();
//! graph.add(&Triple::new(alice.clone(), name, Literal::new_simple_literal("Alice"))).unwrap();
//!
//! assert_eq!(graph.size().unwrap(), 1);
//! let found: Vec<_> = graph.find(&TriplePattern::new(Some(alice), None, None)).unwrap().collect();
//! assert_eq!(found.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod graph;
pub mod mutation;
pub mod rdf;
pub mod sparql;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, GraphConfig, QueryOptions, ResourceSettings};

pub use connection::{Connection, ConnectionError, ConnectionResult, MemoryConnection, StatementOptions};

pub use error::{BridgeError, BridgeResult, MutationKind, TermPosition, TxPhase};

pub use graph::{GraphEvent, GraphHandle, GraphListener, TripleMatches, DEFAULT_GRAPH};

pub use mutation::{TransactionHandler, BATCH_SIZE};

pub use rdf::{BlankNode, Literal, NamedNode, RdfTerm, Triple, TriplePattern};

pub use sparql::{QueryEngine, QueryExecution, QuerySolution, ResultCursor, UpdateRequest};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
