//! Writes against the remote store
//!
//! Bulk add/delete runs through one prepared statement per call, bound from
//! the fixed templates below and flushed every [`BATCH_SIZE`] entries.
//! Single-pattern deletes and graph clears bypass batching. The
//! [`TransactionHandler`] covers explicit begin/commit/abort.

mod bulk;
mod delete;
mod transaction;

pub use bulk::{apply_mutations, execute_single, with_graph_transaction, BATCH_SIZE};
pub use delete::{clear_graph, delete_by_pattern};
pub use transaction::TransactionHandler;

/// Parameters: graph, subject, predicate, object kind, object value, object extra
pub const INSERT_TEMPLATE: &str =
    "sparql insert into graph iri(??) { `iri(??)` `iri(??)` `bif:__rdf_long_from_batch_params(??,??,??)` }";

/// Same parameters as [`INSERT_TEMPLATE`]
pub const DELETE_TEMPLATE: &str =
    "sparql delete from graph iri(??) { `iri(??)` `iri(??)` `bif:__rdf_long_from_batch_params(??,??,??)` }";

/// Parameter: graph
pub const CLEAR_GRAPH_TEMPLATE: &str = "sparql clear graph iri(??)";
