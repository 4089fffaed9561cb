//! Batched insert/delete and the autocommit wrapper

use super::{DELETE_TEMPLATE, INSERT_TEMPLATE};
use crate::codec::{encode_triple, Param};
use crate::connection::PreparedStatement;
use crate::error::{BridgeError, BridgeResult, MutationKind};
use crate::graph::GraphHandle;
use crate::rdf::Triple;
use tracing::{debug, info, warn};

/// Entries per executed batch
pub const BATCH_SIZE: usize = 5000;

fn template(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::Add => INSERT_TEMPLATE,
        MutationKind::Delete => DELETE_TEMPLATE,
    }
}

fn bind_all(stmt: &mut dyn PreparedStatement, params: Vec<Param>, kind: MutationKind) -> BridgeResult<()> {
    for (i, param) in params.into_iter().enumerate() {
        stmt.bind(i + 1, param).map_err(|e| BridgeError::mutation(kind, e))?;
    }
    Ok(())
}

fn flush(stmt: &mut dyn PreparedStatement, kind: MutationKind, pending: usize) -> BridgeResult<()> {
    stmt.execute_batch().map_err(|e| BridgeError::mutation(kind, e))?;
    stmt.clear_batch();
    debug!("Flushed {} {} operations", pending, kind);
    Ok(())
}

/// Add or delete every triple of `triples` in one forward pass.
///
/// Each triple is appended to `notify` once it has been queued. Returns the
/// number of triples sent.
pub fn apply_mutations<I>(
    handle: &mut GraphHandle,
    kind: MutationKind,
    triples: I,
    mut notify: Option<&mut Vec<Triple>>,
) -> BridgeResult<usize>
where
    I: IntoIterator<Item = Triple>,
{
    let graph = handle.graph_name().to_string();
    let options = handle.statement_options();
    let conn = handle.connection_mut()?;
    let mut stmt = conn
        .prepare(template(kind), &options)
        .map_err(|e| BridgeError::mutation(kind, e))?;

    let mut pending = 0;
    let mut total = 0;
    for triple in triples {
        let params = encode_triple(&triple)?.into_params(&graph);
        bind_all(stmt.as_mut(), params, kind)?;
        stmt.add_batch().map_err(|e| BridgeError::mutation(kind, e))?;
        pending += 1;
        if let Some(out) = notify.as_deref_mut() {
            out.push(triple);
        }
        if pending == BATCH_SIZE {
            flush(stmt.as_mut(), kind, pending)?;
            total += pending;
            pending = 0;
        }
    }
    if pending > 0 {
        flush(stmt.as_mut(), kind, pending)?;
        total += pending;
    }
    Ok(total)
}

/// Insert or delete one triple without batching
pub fn execute_single(handle: &mut GraphHandle, kind: MutationKind, triple: &Triple) -> BridgeResult<()> {
    let params = encode_triple(triple)?.into_params(handle.graph_name());
    let options = handle.statement_options();
    let conn = handle.connection_mut()?;
    let mut stmt = conn
        .prepare(template(kind), &options)
        .map_err(|e| BridgeError::mutation(kind, e))?;
    bind_all(stmt.as_mut(), params, kind)?;
    stmt.execute().map_err(|e| BridgeError::mutation(kind, e))
}

/// Run `f` inside a transaction the wrapper opens itself.
///
/// When the connection is in autocommit mode, autocommit is switched off
/// first, and after `f` the work is committed and autocommit restored. If
/// `f` or the commit fails, the work is rolled back and autocommit restored
/// before the error is returned. A transaction the caller already holds
/// (autocommit off on entry) is left alone either way.
pub fn with_graph_transaction<T, F>(handle: &mut GraphHandle, kind: MutationKind, f: F) -> BridgeResult<T>
where
    F: FnOnce(&mut GraphHandle) -> BridgeResult<T>,
{
    let owned = {
        let conn = handle.connection_mut()?;
        let auto = conn.auto_commit().map_err(|e| BridgeError::mutation(kind, e))?;
        if auto {
            conn.set_auto_commit(false).map_err(|e| BridgeError::mutation(kind, e))?;
            debug!("Autocommit disabled for {}", kind);
        }
        auto
    };

    let result = f(handle).and_then(|value| {
        if owned {
            let conn = handle.connection_mut()?;
            conn.commit().map_err(|e| BridgeError::mutation(kind, e))?;
            conn.set_auto_commit(true).map_err(|e| BridgeError::mutation(kind, e))?;
            debug!("Committed {} and restored autocommit", kind);
        }
        Ok(value)
    });

    if let Err(ref e) = result {
        if owned {
            if let Ok(conn) = handle.connection_mut() {
                if let Err(rb) = conn.rollback() {
                    warn!("Rollback after failed {} failed: {}", kind, rb);
                }
                if let Err(ac) = conn.set_auto_commit(true) {
                    warn!("Restoring autocommit after failed {} failed: {}", kind, ac);
                }
            }
            info!("Rolled back {} after failure: {}", kind, e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Faults, MemoryConnection};
    use crate::rdf::{Literal, RdfTerm};

    const G: &str = "http://example.org/g";

    fn triples(n: usize) -> Vec<Triple> {
        (0..n)
            .map(|i| {
                Triple::new(
                    RdfTerm::iri(&format!("http://example.org/s{}", i)).unwrap(),
                    RdfTerm::iri("http://example.org/p").unwrap(),
                    Literal::new_simple_literal(i.to_string()),
                )
            })
            .collect()
    }

    #[test]
    fn test_flush_at_threshold() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);

        let sent = apply_mutations(&mut handle, MutationKind::Add, triples(BATCH_SIZE), None).unwrap();
        assert_eq!(sent, BATCH_SIZE);
        assert_eq!(probe.batch_sizes(), vec![BATCH_SIZE]);
    }

    #[test]
    fn test_empty_input_executes_nothing() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);

        assert_eq!(apply_mutations(&mut handle, MutationKind::Delete, Vec::new(), None).unwrap(), 0);
        assert!(probe.batch_sizes().is_empty());
    }

    #[test]
    fn test_notify_list_collects_queued_triples() {
        let mut handle = GraphHandle::with_graph(Box::new(MemoryConnection::new()), G);
        let mut seen = Vec::new();
        apply_mutations(&mut handle, MutationKind::Add, triples(3), Some(&mut seen)).unwrap();
        assert_eq!(seen, triples(3));
    }

    #[test]
    fn test_literal_subject_fails_before_any_batch() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let bad = Triple::new(
            Literal::new_simple_literal("x"),
            RdfTerm::iri("http://example.org/p").unwrap(),
            RdfTerm::iri("http://example.org/o").unwrap(),
        );
        let err = apply_mutations(&mut handle, MutationKind::Add, vec![bad], None).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedTermPosition { .. }));
        assert!(probe.batch_sizes().is_empty());
    }

    #[test]
    fn test_batch_failure_is_mutation_denied() {
        let conn = MemoryConnection::new().with_faults(Faults {
            batch_at: Some(1),
            ..Faults::default()
        });
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let err = apply_mutations(&mut handle, MutationKind::Delete, triples(2), None).unwrap_err();
        assert_eq!(err.to_string(), "Mutation denied (delete): Statement error: batch 1 rejected by store");
    }

    #[test]
    fn test_single_insert_and_delete() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let t = &triples(1)[0];

        execute_single(&mut handle, MutationKind::Add, t).unwrap();
        assert!(probe.contains(G, t));
        execute_single(&mut handle, MutationKind::Delete, t).unwrap();
        assert!(!probe.contains(G, t));
        assert!(probe.batch_sizes().is_empty());
    }
}
