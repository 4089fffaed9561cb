//! Graph operations on a handle
//!
//! Reads compile the pattern and stream the rows back; writes go through the
//! mutation layer and then notify the registered listeners.

use super::event::GraphEvent;
use super::handle::GraphHandle;
use crate::error::{BridgeError, BridgeResult, MutationKind};
use crate::mutation::{
    apply_mutations, clear_graph, delete_by_pattern, execute_single, with_graph_transaction, TransactionHandler,
};
use crate::rdf::{RdfTerm, Triple, TriplePattern};
use crate::sparql::{PatternCompiler, QueryExecution, QuerySolution, ResultCursor};
use tracing::{debug, info, warn};

/// Triples matching a pattern, read lazily from the store.
///
/// Bound slots come from the pattern, wildcard slots from the `s`/`p`/`o`
/// columns. Rows that do not form a valid triple are skipped.
pub struct TripleMatches<'h> {
    cursor: ResultCursor<'h>,
    pattern: TriplePattern,
}

impl TripleMatches<'_> {
    fn build(&self, solution: &QuerySolution) -> Option<Triple> {
        let subject = self.slot(&self.pattern.subject, solution, "s")?;
        let predicate = self.slot(&self.pattern.predicate, solution, "p")?;
        let object = self.slot(&self.pattern.object, solution, "o")?;
        match (&subject, &predicate) {
            (RdfTerm::NamedNode(_) | RdfTerm::BlankNode(_), RdfTerm::NamedNode(_)) => {
                Some(Triple::new(subject, predicate, object))
            }
            _ => None,
        }
    }

    fn slot(&self, bound: &Option<RdfTerm>, solution: &QuerySolution, var: &str) -> Option<RdfTerm> {
        bound.clone().or_else(|| solution.get(var).cloned())
    }

    /// Release the underlying stream early
    pub fn close(&mut self) {
        self.cursor.close();
    }
}

impl Iterator for TripleMatches<'_> {
    type Item = BridgeResult<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let solution = match self.cursor.next()? {
                Ok(solution) => solution,
                Err(e) => return Some(Err(e)),
            };
            match self.build(&solution) {
                Some(triple) => return Some(Ok(triple)),
                None => warn!("Skipping row that does not form a triple: {:?}", solution),
            }
        }
    }
}

impl GraphHandle {
    /// Stream every triple of the graph matching `pattern`
    pub fn find(&mut self, pattern: &TriplePattern) -> BridgeResult<TripleMatches<'_>> {
        let text = PatternCompiler::for_handle(self).enumerate(pattern);
        let options = self.statement_options();
        let graph = self.graph_name().to_string();
        debug!("Finding: {}", text);
        let stream = self.connection_mut()?.query(&text, &options).map_err(BridgeError::query)?;
        Ok(TripleMatches {
            cursor: ResultCursor::new(stream, &graph),
            pattern: pattern.clone(),
        })
    }

    /// Whether anything matches `pattern`
    pub fn contains(&mut self, pattern: &TriplePattern) -> BridgeResult<bool> {
        let text = PatternCompiler::for_handle(self).exists(pattern);
        let options = self.statement_options();
        let conn = self.connection_mut()?;
        let mut rows = conn.query(&text, &options).map_err(BridgeError::query)?;
        let found = rows.next_row().map(|row| row.is_some()).map_err(BridgeError::query);
        if let Err(e) = rows.close() {
            warn!("Closing exists cursor failed: {}", e);
        }
        found
    }

    pub fn contains_triple(&mut self, triple: &Triple) -> BridgeResult<bool> {
        self.contains(&TriplePattern::from(triple))
    }

    /// Number of triples in the graph
    pub fn size(&mut self) -> BridgeResult<usize> {
        let compiled = PatternCompiler::for_handle(self).count(&TriplePattern::any());
        let options = self.statement_options();
        let conn = self.connection_mut()?;
        let mut stmt = conn.prepare(&compiled.text, &options).map_err(BridgeError::query)?;
        for (i, param) in compiled.params.into_iter().enumerate() {
            stmt.bind(i + 1, param).map_err(BridgeError::query)?;
        }
        let mut rows = stmt.query().map_err(BridgeError::query)?;
        let first = rows.next_row().map_err(BridgeError::query);
        if let Err(e) = rows.close() {
            warn!("Closing count cursor failed: {}", e);
        }
        let count = first?
            .and_then(|row| row.first().and_then(|v| v.as_integer()))
            .unwrap_or(0);
        usize::try_from(count).map_err(|_| BridgeError::query(format!("negative count {}", count)))
    }

    pub fn is_empty(&mut self) -> BridgeResult<bool> {
        Ok(self.size()? == 0)
    }

    /// Insert one triple
    pub fn add(&mut self, triple: &Triple) -> BridgeResult<()> {
        execute_single(self, MutationKind::Add, triple)?;
        self.notify(GraphEvent::Added {
            graph: self.graph_name().to_string(),
            triples: vec![triple.clone()],
        });
        Ok(())
    }

    /// Delete one triple
    pub fn delete(&mut self, triple: &Triple) -> BridgeResult<()> {
        execute_single(self, MutationKind::Delete, triple)?;
        self.notify(GraphEvent::Deleted {
            graph: self.graph_name().to_string(),
            triples: vec![triple.clone()],
        });
        Ok(())
    }

    fn bulk(&mut self, kind: MutationKind, triples: &[Triple], notify: bool) -> BridgeResult<()> {
        with_graph_transaction(self, kind, |h| apply_mutations(h, kind, triples.iter().cloned(), None))?;
        if notify {
            let graph = self.graph_name().to_string();
            let triples = triples.to_vec();
            self.notify(match kind {
                MutationKind::Add => GraphEvent::Added { graph, triples },
                MutationKind::Delete => GraphEvent::Deleted { graph, triples },
            });
        }
        Ok(())
    }

    /// Batched insert; listeners always hear about it
    pub fn add_triples(&mut self, triples: &[Triple]) -> BridgeResult<()> {
        self.bulk(MutationKind::Add, triples, true)
    }

    pub fn delete_triples(&mut self, triples: &[Triple]) -> BridgeResult<()> {
        self.bulk(MutationKind::Delete, triples, true)
    }

    /// Batched insert, listeners notified only when `notify` is set
    pub fn add_list(&mut self, triples: &[Triple], notify: bool) -> BridgeResult<()> {
        self.bulk(MutationKind::Add, triples, notify)
    }

    pub fn delete_list(&mut self, triples: &[Triple], notify: bool) -> BridgeResult<()> {
        self.bulk(MutationKind::Delete, triples, notify)
    }

    fn bulk_iter<I>(&mut self, kind: MutationKind, triples: I, notify: bool) -> BridgeResult<usize>
    where
        I: IntoIterator<Item = Triple>,
    {
        let mut sent = Vec::new();
        let out = if notify { Some(&mut sent) } else { None };
        let count = with_graph_transaction(self, kind, |h| apply_mutations(h, kind, triples, out))?;
        if notify {
            let graph = self.graph_name().to_string();
            self.notify(match kind {
                MutationKind::Add => GraphEvent::Added { graph, triples: sent },
                MutationKind::Delete => GraphEvent::Deleted { graph, triples: sent },
            });
        }
        Ok(count)
    }

    /// Batched insert from any sequence, consumed once; returns the count sent
    pub fn add_iter<I>(&mut self, triples: I, notify: bool) -> BridgeResult<usize>
    where
        I: IntoIterator<Item = Triple>,
    {
        self.bulk_iter(MutationKind::Add, triples, notify)
    }

    pub fn delete_iter<I>(&mut self, triples: I, notify: bool) -> BridgeResult<usize>
    where
        I: IntoIterator<Item = Triple>,
    {
        self.bulk_iter(MutationKind::Delete, triples, notify)
    }

    /// Delete everything matching `(s, p, o)`, `None` being a wildcard
    pub fn remove(&mut self, s: Option<RdfTerm>, p: Option<RdfTerm>, o: Option<RdfTerm>) -> BridgeResult<()> {
        let pattern = TriplePattern::new(s, p, o);
        delete_by_pattern(self, &pattern)?;
        self.notify(GraphEvent::Removed {
            graph: self.graph_name().to_string(),
            pattern,
        });
        Ok(())
    }

    /// Empty the graph without notifying
    pub fn remove_all(&mut self) -> BridgeResult<()> {
        let graph = self.graph_name().to_string();
        clear_graph(self, &graph)
    }

    pub fn clear(&mut self) -> BridgeResult<()> {
        self.remove_all()?;
        self.notify(GraphEvent::Cleared {
            graph: self.graph_name().to_string(),
        });
        Ok(())
    }

    /// Have the store fetch `url` and load it into this graph
    pub fn load(&mut self, url: &str) -> BridgeResult<()> {
        if url.contains('"') {
            return Err(BridgeError::mutation(MutationKind::Add, format!("invalid source URL {}", url)));
        }
        let text = format!("sparql load \"{}\" into graph <{}>", url, self.graph_name());
        let options = self.statement_options();
        self.connection_mut()?
            .execute(&text, &options)
            .map_err(|e| BridgeError::mutation(MutationKind::Add, e))?;
        info!("Loaded {} into <{}>", url, self.graph_name());
        Ok(())
    }

    /// Caller-written query scoped to this graph
    pub fn query(&mut self, query: impl Into<String>) -> QueryExecution<'_> {
        QueryExecution::new(self, query)
    }

    pub fn transaction(&mut self) -> TransactionHandler<'_> {
        TransactionHandler::new(self)
    }
}
