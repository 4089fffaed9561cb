//! Ad-hoc query execution and update requests

use super::results::{QuerySolution, ResultCursor};
use super::rewrite::rewrite;
use super::statement::{Directive, SparqlStatement, STATEMENT_PREFIX};
use crate::codec::{decode_value, NativeValue};
use crate::connection::RowStream;
use crate::error::{BridgeError, BridgeResult};
use crate::graph::GraphHandle;
use crate::rdf::{RdfTerm, Triple};
use std::fmt;
use tracing::{debug, warn};

/// Directive block for a caller-written query against `handle`
pub fn adhoc_statement(handle: &GraphHandle, body: impl Into<String>) -> SparqlStatement {
    let statement = SparqlStatement::new(body).with_options(handle.options());
    if handle.options().read_all_graphs {
        statement
    } else {
        statement.directive(Directive::DefaultGraph(handle.graph_name().to_string()))
    }
}

/// Caller-written query bound to a graph handle
pub struct QueryExecution<'h> {
    handle: &'h mut GraphHandle,
    query: String,
    initial_binding: Option<QuerySolution>,
}

impl<'h> QueryExecution<'h> {
    pub fn new(handle: &'h mut GraphHandle, query: impl Into<String>) -> Self {
        Self {
            handle,
            query: query.into(),
            initial_binding: None,
        }
    }

    /// Values substituted for `?name` references before execution
    pub fn set_initial_binding(&mut self, binding: QuerySolution) {
        self.initial_binding = Some(binding);
    }

    pub fn with_initial_binding(mut self, binding: QuerySolution) -> Self {
        self.set_initial_binding(binding);
        self
    }

    /// Statement text sent to the store
    pub fn query_text(&self) -> String {
        let body = match &self.initial_binding {
            Some(binding) => rewrite(&self.query, binding),
            None => self.query.clone(),
        };
        adhoc_statement(&*self.handle, body).render()
    }

    fn open(&mut self) -> BridgeResult<Box<dyn RowStream + '_>> {
        let text = self.query_text();
        let options = self.handle.statement_options();
        debug!("Executing query: {}", text);
        self.handle
            .connection_mut()?
            .query(&text, &options)
            .map_err(BridgeError::query)
    }

    /// Stream the solutions
    pub fn exec_select(&mut self) -> BridgeResult<ResultCursor<'_>> {
        let graph = self.handle.graph_name().to_string();
        let stream = self.open()?;
        Ok(ResultCursor::new(stream, &graph))
    }

    /// True when any row's first column is the integer 1
    pub fn exec_ask(&mut self) -> BridgeResult<bool> {
        let mut stream = self.open()?;
        let mut answer = false;
        let outcome = loop {
            match stream.next_row() {
                Ok(Some(row)) => {
                    if row.first().and_then(|v| v.as_integer()) == Some(1) {
                        answer = true;
                    }
                }
                Ok(None) => break Ok(answer),
                Err(e) => break Err(BridgeError::query(e)),
            }
        };
        if let Err(e) = stream.close() {
            warn!("Closing result stream failed: {}", e);
        }
        outcome
    }

    /// Triples built from the first three columns of every row
    pub fn exec_construct(&mut self) -> BridgeResult<Vec<Triple>> {
        let mut stream = self.open()?;
        let mut triples = Vec::new();
        let outcome = loop {
            match stream.next_row() {
                Ok(Some(row)) => {
                    if let Some(triple) = row_triple(&row) {
                        triples.push(triple);
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(BridgeError::query(e)),
            }
        };
        if let Err(e) = stream.close() {
            warn!("Closing result stream failed: {}", e);
        }
        outcome.map(|_| triples)
    }

    pub fn exec_describe(&mut self) -> BridgeResult<Vec<Triple>> {
        self.exec_construct()
    }
}

fn row_triple(row: &[NativeValue]) -> Option<Triple> {
    if row.len() < 3 {
        debug!("Skipping row with {} columns", row.len());
        return None;
    }
    let subject = decode_value(&row[0])?;
    let predicate = decode_value(&row[1])?;
    let object = decode_value(&row[2])?;
    match (&subject, &predicate) {
        (RdfTerm::NamedNode(_) | RdfTerm::BlankNode(_), RdfTerm::NamedNode(_)) => {
            Some(Triple::new(subject, predicate, object))
        }
        _ => {
            debug!("Skipping row that is not a valid triple: {} {} {}", subject, predicate, object);
            None
        }
    }
}

/// Ordered list of update statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    updates: Vec<String>,
}

impl UpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_update(&mut self, update: impl Into<String>) {
        self.updates.push(update.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.updates.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Run every update in order; stops at the first failure
    pub fn exec(&self, handle: &mut GraphHandle) -> BridgeResult<()> {
        let options = handle.statement_options();
        let conn = handle.connection_mut()?;
        for update in &self.updates {
            let text = format!("{}{}", STATEMENT_PREFIX, update);
            debug!("Executing update: {}", text);
            conn.execute(&text, &options).map_err(BridgeError::query)?;
        }
        Ok(())
    }
}

impl From<&str> for UpdateRequest {
    fn from(update: &str) -> Self {
        let mut request = Self::new();
        request.add_update(update);
        request
    }
}

impl fmt::Display for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for update in &self.updates {
            writeln!(f, "{}", update)?;
        }
        Ok(())
    }
}
