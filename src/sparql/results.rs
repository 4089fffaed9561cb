//! Query solutions and the result cursor

use crate::codec::{decode_value, NativeValue};
use crate::connection::RowStream;
use crate::error::{BridgeError, BridgeResult};
use crate::graph::DEFAULT_GRAPH;
use crate::rdf::{NamedNode, RdfTerm};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Name of the synthetic binding carrying the handle's graph
pub const GRAPH_VARIABLE: &str = "graph";

/// Query solution (variable bindings), in column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySolution {
    bindings: IndexMap<String, RdfTerm>,
}

impl QuerySolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable: &str) -> Option<&RdfTerm> {
        self.bindings.get(variable)
    }

    pub fn bind(&mut self, variable: impl Into<String>, term: RdfTerm) {
        self.bindings.insert(variable.into(), term);
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.bindings.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RdfTerm)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// One binding row in SPARQL 1.1 JSON results form
    pub fn to_json(&self) -> Value {
        let mut row = Map::new();
        for (name, term) in &self.bindings {
            row.insert(name.clone(), term_json(term));
        }
        Value::Object(row)
    }
}

impl FromIterator<(String, RdfTerm)> for QuerySolution {
    fn from_iter<I: IntoIterator<Item = (String, RdfTerm)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

fn term_json(term: &RdfTerm) -> Value {
    match term {
        RdfTerm::NamedNode(n) => json!({ "type": "uri", "value": n.as_str() }),
        RdfTerm::BlankNode(b) => json!({ "type": "bnode", "value": b.as_str() }),
        RdfTerm::Literal(lit) => {
            let mut obj = json!({ "type": "literal", "value": lit.value() });
            if let Some(lang) = lit.language() {
                obj["xml:lang"] = json!(lang);
            } else if let Some(datatype) = lit.explicit_datatype() {
                obj["datatype"] = json!(datatype.as_str());
            }
            obj
        }
    }
}

/// Decode one row; columns without a term form are left out
pub fn extract_row(columns: &[String], row: &[NativeValue], graph: Option<&RdfTerm>) -> QuerySolution {
    let mut solution = QuerySolution::new();
    for (name, value) in columns.iter().zip(row) {
        if let Some(term) = decode_value(value) {
            solution.bind(name.as_str(), term);
        }
    }
    if let Some(graph) = graph {
        solution.bind(GRAPH_VARIABLE, graph.clone());
    }
    solution
}

/// Lazy cursor over a remote row stream with one row of lookahead.
///
/// The stream is released as soon as it runs dry, on [`close`](Self::close),
/// or when the cursor is dropped, whichever comes first.
pub struct ResultCursor<'h> {
    stream: Option<Box<dyn RowStream + 'h>>,
    columns: Vec<String>,
    graph: Option<RdfTerm>,
    lookahead: Option<QuerySolution>,
    row_number: usize,
}

impl<'h> ResultCursor<'h> {
    pub fn new(stream: Box<dyn RowStream + 'h>, graph_name: &str) -> Self {
        let columns = stream.columns().to_vec();
        let graph = if graph_name == DEFAULT_GRAPH {
            None
        } else {
            match NamedNode::new(graph_name) {
                Ok(node) => Some(node.into()),
                Err(e) => {
                    warn!("Graph name cannot be bound as a result term: {}", e);
                    None
                }
            }
        };
        Self {
            stream: Some(stream),
            columns,
            graph,
            lookahead: None,
            row_number: 0,
        }
    }

    /// Projected variables, plus `graph` on a named graph
    pub fn result_vars(&self) -> Vec<String> {
        let mut vars = self.columns.clone();
        if self.graph.is_some() {
            vars.push(GRAPH_VARIABLE.to_string());
        }
        vars
    }

    /// Rows handed out so far
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none() && self.lookahead.is_none()
    }

    /// Fetch ahead if needed; false once the stream is exhausted or closed
    pub fn has_next(&mut self) -> BridgeResult<bool> {
        if self.lookahead.is_some() {
            return Ok(true);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(false);
        };
        match stream.next_row() {
            Ok(Some(row)) => {
                self.lookahead = Some(extract_row(&self.columns, &row, self.graph.as_ref()));
                Ok(true)
            }
            Ok(None) => {
                self.release();
                Ok(false)
            }
            Err(e) => {
                self.release();
                Err(BridgeError::query(e))
            }
        }
    }

    /// Take the next row
    pub fn advance(&mut self) -> BridgeResult<QuerySolution> {
        if !self.has_next()? {
            return Err(BridgeError::NoMoreRows);
        }
        match self.lookahead.take() {
            Some(solution) => {
                self.row_number += 1;
                Ok(solution)
            }
            None => Err(BridgeError::NoMoreRows),
        }
    }

    /// Release the stream; safe to call any number of times
    pub fn close(&mut self) {
        self.lookahead = None;
        self.release();
    }

    /// Best-effort cancel of the statement still producing rows, then close
    pub fn abort(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            if let Err(e) = stream.cancel() {
                warn!("Cancel failed: {}", e);
            }
        }
        self.close();
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing result stream after {} rows", self.row_number);
            if let Err(e) = stream.close() {
                warn!("Closing result stream failed: {}", e);
            }
        }
    }
}

impl Iterator for ResultCursor<'_> {
    type Item = BridgeResult<QuerySolution>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.advance()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Drop for ResultCursor<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
