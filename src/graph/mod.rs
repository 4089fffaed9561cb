//! Graph handles and the graph-level API
//!
//! A [`GraphHandle`] names one graph on one connection and carries the
//! per-session query options. The pattern-matching, counting and mutation
//! operations are implemented on it in `api`, and every completed mutation is
//! reported to the registered [`GraphListener`]s.

pub mod api;
pub mod event;
pub mod handle;

pub use crate::config::DEFAULT_GRAPH;
pub use api::TripleMatches;
pub use event::{GraphEvent, GraphListener};
pub use handle::GraphHandle;
