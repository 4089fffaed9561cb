//! Statement compilation and result handling
//!
//! Everything between a graph operation and the text sent to the store:
//! - [`statement`]: `sparql` header and ordered `define` directives
//! - [`pattern`]: count / exists / enumerate / delete-where for a triple pattern
//! - [`rewrite`]: substitution of bound variables into caller-written text
//! - [`results`]: solutions and the lazy [`ResultCursor`]
//! - [`execution`] / [`engine`]: ad-hoc queries, updates and the algebra path
//!
//! # Example
//!
//! ```rust
//! use sparql_bridge::config::QueryOptions;
//! use sparql_bridge::rdf::{RdfTerm, TriplePattern};
//! use sparql_bridge::sparql::PatternCompiler;
//!
//! let options = QueryOptions { same_as: true, ..QueryOptions::default() };
//! let alice = RdfTerm::iri("http://example.org/alice").unwrap();
//! let text = PatternCompiler::new("http://example.org/people", &options)
//!     .enumerate(&TriplePattern::new(Some(alice), None, None));
//!
//! assert_eq!(
//!     text,
//!     "sparql\ndefine input:same-as \"yes\"\n\
//!      select * from <http://example.org/people> where { <http://example.org/alice> ?p ?o }"
//! );
//! ```

pub mod engine;
pub mod execution;
pub mod pattern;
pub mod results;
pub mod rewrite;
pub mod statement;

pub use engine::{PreparedQuery, QueryEngine, QueryForm};
pub use execution::{adhoc_statement, QueryExecution, UpdateRequest};
pub use pattern::{pattern_text, CompiledQuery, PatternCompiler};
pub use results::{extract_row, QuerySolution, ResultCursor, GRAPH_VARIABLE};
pub use rewrite::{rewrite, BindingLookup, VARIABLE_DELIMITERS};
pub use statement::{
    Directive, SparqlStatement, COUNT_PREFIX, COUNT_SUFFIX, GRAPH_PARAM, STATEMENT_PREFIX,
};
