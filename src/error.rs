//! Bridge error taxonomy
//!
//! Every remote failure is wrapped into one of these variants with the
//! lower-level cause text kept in the message.

use crate::config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Slot of a triple a term is being encoded for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermPosition {
    Subject,
    Predicate,
    Object,
}

impl fmt::Display for TermPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermPosition::Subject => write!(f, "subject"),
            TermPosition::Predicate => write!(f, "predicate"),
            TermPosition::Object => write!(f, "object"),
        }
    }
}

/// Direction of a bulk mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Add => write!(f, "add"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Transaction step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Begin,
    Commit,
    Abort,
    /// The rollback issued after another phase failed
    Rollback,
}

impl fmt::Display for TxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxPhase::Begin => write!(f, "begin"),
            TxPhase::Commit => write!(f, "commit"),
            TxPhase::Abort => write!(f, "abort"),
            TxPhase::Rollback => write!(f, "rollback"),
        }
    }
}

/// Bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A term kind that the slot cannot hold (literal subject, blank predicate, ...)
    #[error("Unsupported term in {position} position: {term}")]
    UnsupportedTermPosition {
        position: TermPosition,
        term: String,
    },

    /// Add or delete execution failed
    #[error("Mutation denied ({kind}): {cause}")]
    MutationDenied {
        kind: MutationKind,
        cause: String,
    },

    /// Select/ask/construct execution failed
    #[error("Query failed: {cause}")]
    QueryFailed { cause: String },

    /// Cursor advanced past its last row
    #[error("No more rows")]
    NoMoreRows,

    /// Begin/commit/abort failed on a store that claims transaction support
    #[error("Transaction {phase} failed: {cause}")]
    TransactionFailed { phase: TxPhase, cause: String },

    /// Feature the remote store does not offer
    #[error("Unsupported operation: {name}")]
    UnsupportedOperation { name: String },

    /// The handle's connection has been released
    #[error("Graph handle is closed")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BridgeError {
    pub(crate) fn query(cause: impl fmt::Display) -> Self {
        BridgeError::QueryFailed {
            cause: cause.to_string(),
        }
    }

    pub(crate) fn mutation(kind: MutationKind, cause: impl fmt::Display) -> Self {
        BridgeError::MutationDenied {
            kind,
            cause: cause.to_string(),
        }
    }

    pub(crate) fn transaction(phase: TxPhase, cause: impl fmt::Display) -> Self {
        BridgeError::TransactionFailed {
            phase,
            cause: cause.to_string(),
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_is_kept_in_message() {
        let err = BridgeError::mutation(MutationKind::Delete, "SR133: permission denied");
        assert_eq!(err.to_string(), "Mutation denied (delete): SR133: permission denied");

        let err = BridgeError::transaction(TxPhase::Commit, "connection reset");
        assert_eq!(err.to_string(), "Transaction commit failed: connection reset");
    }

    #[test]
    fn test_config_error_converts() {
        let err: BridgeError = ConfigError::Invalid("fetch_size must be positive".into()).into();
        assert_eq!(err.to_string(), "Configuration error: Invalid value: fetch_size must be positive");
    }
}
