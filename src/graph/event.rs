//! Graph change events
//!
//! Emitted by the graph API after a mutation reached the store, for caches,
//! inference layers or anything else that mirrors the graph.

use crate::rdf::{Triple, TriplePattern};
use std::sync::mpsc::Sender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    Added {
        graph: String,
        triples: Vec<Triple>,
    },
    Deleted {
        graph: String,
        triples: Vec<Triple>,
    },
    /// Everything matching the pattern was removed
    Removed {
        graph: String,
        pattern: TriplePattern,
    },
    Cleared {
        graph: String,
    },
}

impl GraphEvent {
    pub fn graph(&self) -> &str {
        match self {
            GraphEvent::Added { graph, .. }
            | GraphEvent::Deleted { graph, .. }
            | GraphEvent::Removed { graph, .. }
            | GraphEvent::Cleared { graph } => graph,
        }
    }
}

/// Receives events synchronously, on the thread that made the change
pub trait GraphListener {
    fn notify(&mut self, event: &GraphEvent);
}

impl GraphListener for Sender<GraphEvent> {
    fn notify(&mut self, event: &GraphEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.send(event.clone());
    }
}
