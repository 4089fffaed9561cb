//! Delete-by-pattern and graph clear

use super::bulk::execute_single;
use super::CLEAR_GRAPH_TEMPLATE;
use crate::codec::Param;
use crate::error::{BridgeError, BridgeResult, MutationKind};
use crate::graph::GraphHandle;
use crate::rdf::TriplePattern;
use crate::sparql::PatternCompiler;
use tracing::debug;

fn denied(cause: impl std::fmt::Display) -> BridgeError {
    BridgeError::mutation(MutationKind::Delete, cause)
}

/// Remove every triple of `graph`
pub fn clear_graph(handle: &mut GraphHandle, graph: &str) -> BridgeResult<()> {
    let options = handle.statement_options();
    let conn = handle.connection_mut()?;
    let mut stmt = conn.prepare(CLEAR_GRAPH_TEMPLATE, &options).map_err(denied)?;
    stmt.bind(1, Param::Str(graph.to_string())).map_err(denied)?;
    stmt.execute().map_err(denied)?;
    debug!("Cleared graph <{}>", graph);
    Ok(())
}

/// Remove everything in the handle's graph that matches `pattern`.
///
/// A fully bound pattern is one parameterized delete, a full wildcard clears
/// the graph, anything in between is a match-then-delete statement.
pub fn delete_by_pattern(handle: &mut GraphHandle, pattern: &TriplePattern) -> BridgeResult<()> {
    if pattern.is_wildcard() {
        let graph = handle.graph_name().to_string();
        return clear_graph(handle, &graph);
    }
    if let Some(triple) = pattern.as_triple() {
        return execute_single(handle, MutationKind::Delete, &triple);
    }

    let text = PatternCompiler::for_handle(handle).delete_where(pattern);
    let options = handle.statement_options();
    debug!("Deleting by pattern: {}", text);
    handle.connection_mut()?.execute(&text, &options).map_err(denied)
}
