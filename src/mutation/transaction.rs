//! Explicit transaction control

use crate::connection::{ConnectionError, ConnectionResult, Isolation};
use crate::error::{BridgeError, BridgeResult, TxPhase};
use crate::graph::GraphHandle;
use tracing::{debug, error, warn};

/// Begin/commit/abort on a graph handle's connection.
///
/// Whether the store supports transactions is asked once and cached for the
/// handler's lifetime.
pub struct TransactionHandler<'h> {
    handle: &'h mut GraphHandle,
    supported: Option<bool>,
}

impl<'h> TransactionHandler<'h> {
    pub fn new(handle: &'h mut GraphHandle) -> Self {
        Self {
            handle,
            supported: None,
        }
    }

    /// The handle the transaction runs on
    pub fn handle(&mut self) -> &mut GraphHandle {
        &mut *self.handle
    }

    pub fn supports_transactions(&mut self) -> BridgeResult<bool> {
        if let Some(supported) = self.supported {
            return Ok(supported);
        }
        let supported = self
            .handle
            .connection()?
            .supports_transactions()
            .map_err(|e| BridgeError::transaction(TxPhase::Begin, e))?;
        self.supported = Some(supported);
        Ok(supported)
    }

    fn require(&mut self, name: &str) -> BridgeResult<()> {
        if self.supports_transactions()? {
            Ok(())
        } else {
            Err(BridgeError::UnsupportedOperation { name: name.to_string() })
        }
    }

    /// Roll back after `phase` failed; a failing rollback escalates
    fn fail(&mut self, phase: TxPhase, cause: ConnectionError) -> BridgeError {
        let conn = match self.handle.connection_mut() {
            Ok(conn) => conn,
            Err(e) => return e,
        };
        match conn.rollback() {
            Ok(()) => {
                warn!("Transaction {} failed, rolled back: {}", phase, cause);
                BridgeError::transaction(phase, cause)
            }
            Err(rb) => {
                error!("Rollback after failed {} also failed: {}", phase, rb);
                BridgeError::transaction(TxPhase::Rollback, format!("{} (after {} failed: {})", rb, phase, cause))
            }
        }
    }

    /// READ COMMITTED isolation, autocommit off
    pub fn begin(&mut self) -> BridgeResult<()> {
        self.require("begin transaction")?;
        let conn = self.handle.connection_mut()?;
        let outcome = (|| -> ConnectionResult<()> {
            if conn.isolation()? != Isolation::ReadCommitted {
                conn.set_isolation(Isolation::ReadCommitted)?;
            }
            if conn.auto_commit()? {
                conn.set_auto_commit(false)?;
            }
            Ok(())
        })();
        match outcome {
            Ok(()) => {
                debug!("Transaction started");
                Ok(())
            }
            Err(e) => Err(self.fail(TxPhase::Begin, e)),
        }
    }

    /// Commit and return to autocommit
    pub fn commit(&mut self) -> BridgeResult<()> {
        self.require("commit transaction")?;
        let conn = self.handle.connection_mut()?;
        let outcome = (|| -> ConnectionResult<()> {
            conn.commit()?;
            conn.set_auto_commit(true)
        })();
        match outcome {
            Ok(()) => {
                debug!("Transaction committed");
                Ok(())
            }
            Err(e) => Err(self.fail(TxPhase::Commit, e)),
        }
    }

    /// Discard the open work and return to autocommit
    ///
    /// A rollback refused here is reported as is and not retried.
    pub fn abort(&mut self) -> BridgeResult<()> {
        self.require("abort transaction")?;
        let conn = self.handle.connection_mut()?;
        if let Err(e) = conn.rollback() {
            error!("Rollback during abort failed: {}", e);
            return Err(BridgeError::transaction(TxPhase::Rollback, e));
        }
        let outcome = (|| -> ConnectionResult<()> {
            conn.commit()?;
            conn.set_auto_commit(true)
        })();
        match outcome {
            Ok(()) => {
                debug!("Transaction aborted");
                Ok(())
            }
            Err(e) => Err(self.fail(TxPhase::Abort, e)),
        }
    }

    /// Run `f` between begin and commit; abort if it fails
    pub fn execute_in_transaction<T, F>(&mut self, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut GraphHandle) -> BridgeResult<T>,
    {
        self.begin()?;
        match f(&mut *self.handle) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                warn!("Aborting transaction: {}", e);
                match self.abort() {
                    Ok(()) => Err(e),
                    Err(BridgeError::TransactionFailed { phase, cause }) => Err(BridgeError::TransactionFailed {
                        phase,
                        cause: format!("{} (while aborting after: {})", cause, e),
                    }),
                    Err(other) => Err(BridgeError::transaction(
                        TxPhase::Abort,
                        format!("{} (while aborting after: {})", other, e),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Faults, MemoryConnection};
    use crate::rdf::{RdfTerm, Triple};

    const G: &str = "http://example.org/g";

    fn triple() -> Triple {
        Triple::new(
            RdfTerm::iri("http://ex/s").unwrap(),
            RdfTerm::iri("http://ex/p").unwrap(),
            RdfTerm::iri("http://ex/o").unwrap(),
        )
    }

    #[test]
    fn test_begin_commit() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        tx.begin().unwrap();
        assert!(!probe.auto_commit());
        assert_eq!(probe.isolation(), Isolation::ReadCommitted);

        tx.handle().add(&triple()).unwrap();
        assert_eq!(probe.committed_len(G), 0);

        tx.commit().unwrap();
        assert!(probe.auto_commit());
        assert_eq!(probe.committed_len(G), 1);
    }

    #[test]
    fn test_abort_discards_work() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        tx.begin().unwrap();
        tx.handle().add(&triple()).unwrap();
        tx.abort().unwrap();
        assert!(probe.auto_commit());
        assert_eq!(probe.graph_len(G), 0);
    }

    #[test]
    fn test_unsupported_store() {
        let mut handle = GraphHandle::new(Box::new(MemoryConnection::new().without_transactions()));
        let mut tx = TransactionHandler::new(&mut handle);
        assert!(matches!(tx.begin(), Err(BridgeError::UnsupportedOperation { name }) if name == "begin transaction"));
        assert!(matches!(tx.commit(), Err(BridgeError::UnsupportedOperation { .. })));
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        tx.begin().unwrap();
        tx.handle().add(&triple()).unwrap();
        probe.set_faults(Faults {
            commit: true,
            ..Faults::default()
        });
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, BridgeError::TransactionFailed { phase: TxPhase::Commit, .. }));
        assert_eq!(probe.rollbacks(), 1);
        assert_eq!(probe.graph_len(G), 0);
    }

    #[test]
    fn test_failed_rollback_escalates() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        tx.begin().unwrap();
        probe.set_faults(Faults {
            commit: true,
            rollback: true,
            ..Faults::default()
        });
        let err = tx.commit().unwrap_err();
        assert!(matches!(err, BridgeError::TransactionFailed { phase: TxPhase::Rollback, .. }));
        assert!(err.to_string().contains("after commit failed"));
    }

    #[test]
    fn test_execute_in_transaction() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        let added = tx.execute_in_transaction(|h| h.add(&triple()).map(|_| 1)).unwrap();
        assert_eq!(added, 1);
        assert_eq!(probe.committed_len(G), 1);

        let err = tx
            .execute_in_transaction(|h| {
                h.delete(&triple())?;
                Err::<(), _>(BridgeError::query("caller gave up"))
            })
            .unwrap_err();
        assert!(matches!(err, BridgeError::QueryFailed { .. }));
        assert_eq!(probe.committed_len(G), 1);
        assert!(probe.auto_commit());
    }

    #[test]
    fn test_failed_abort_keeps_caller_error() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        let err = tx
            .execute_in_transaction(|h| {
                h.add(&triple())?;
                probe.set_faults(Faults {
                    rollback: true,
                    ..Faults::default()
                });
                Err::<(), _>(BridgeError::query("caller gave up"))
            })
            .unwrap_err();
        assert!(matches!(err, BridgeError::TransactionFailed { phase: TxPhase::Rollback, .. }));
        let text = err.to_string();
        assert!(text.contains("rollback refused by store"));
        assert!(text.contains("caller gave up"));
    }

    #[test]
    fn test_abort_does_not_retry_refused_rollback() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        let mut handle = GraphHandle::with_graph(Box::new(conn), G);
        let mut tx = TransactionHandler::new(&mut handle);

        tx.begin().unwrap();
        probe.set_faults(Faults {
            rollback: true,
            ..Faults::default()
        });
        let err = tx.abort().unwrap_err();
        assert!(matches!(err, BridgeError::TransactionFailed { phase: TxPhase::Rollback, .. }));
        assert!(!err.to_string().contains("after abort failed"));
        assert_eq!(probe.rollbacks(), 0);
    }
}
