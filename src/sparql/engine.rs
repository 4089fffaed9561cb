//! Algebra-path evaluation
//!
//! Queries are parsed with spargebra, serialized back to text, and evaluated
//! remotely after the initial binding has been substituted into that text.

use super::execution::adhoc_statement;
use super::results::ResultCursor;
use super::rewrite::{rewrite, BindingLookup};
use crate::error::{BridgeError, BridgeResult};
use crate::graph::GraphHandle;
use spargebra::Query;
use tracing::debug;

/// Query form of a parsed query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryForm {
    Select,
    Construct,
    Describe,
    Ask,
}

/// A syntax-checked query in canonical text form
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    form: QueryForm,
    text: String,
}

impl PreparedQuery {
    pub fn form(&self) -> QueryForm {
        self.form
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Evaluates parsed queries against a graph handle
pub struct QueryEngine;

impl QueryEngine {
    /// Parse and normalize a query
    pub fn prepare(query: &str) -> BridgeResult<PreparedQuery> {
        let parsed = Query::parse(query, None)
            .map_err(|e| BridgeError::query(format!("Syntax error: {}", e)))?;
        let form = match &parsed {
            Query::Select { .. } => QueryForm::Select,
            Query::Construct { .. } => QueryForm::Construct,
            Query::Describe { .. } => QueryForm::Describe,
            Query::Ask { .. } => QueryForm::Ask,
        };
        Ok(PreparedQuery {
            form,
            text: parsed.to_string(),
        })
    }

    /// Substitute `initial` into the query and stream the solutions
    pub fn eval<'h>(
        handle: &'h mut GraphHandle,
        query: &PreparedQuery,
        initial: &dyn BindingLookup,
    ) -> BridgeResult<ResultCursor<'h>> {
        let text = adhoc_statement(handle, rewrite(&query.text, initial)).render();
        let graph = handle.graph_name().to_string();
        let options = handle.statement_options();
        debug!("Evaluating {:?} query: {}", query.form, text);
        let stream = handle
            .connection_mut()?
            .query(&text, &options)
            .map_err(BridgeError::query)?;
        Ok(ResultCursor::new(stream, &graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ExtendedString, NativeValue};
    use crate::connection::MemoryConnection;
    use crate::rdf::RdfTerm;
    use std::collections::HashMap;

    #[test]
    fn test_prepare_detects_form() {
        assert_eq!(QueryEngine::prepare("SELECT * WHERE { ?s ?p ?o }").unwrap().form(), QueryForm::Select);
        assert_eq!(QueryEngine::prepare("ASK { ?s ?p ?o }").unwrap().form(), QueryForm::Ask);
        assert_eq!(
            QueryEngine::prepare("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }").unwrap().form(),
            QueryForm::Construct
        );
    }

    #[test]
    fn test_syntax_error_is_query_failed() {
        let err = QueryEngine::prepare("SELECT WHERE {").unwrap_err();
        assert!(err.to_string().starts_with("Query failed: Syntax error"));
    }

    #[test]
    fn test_eval_substitutes_binding() {
        let conn = MemoryConnection::new();
        let probe = conn.probe();
        conn.push_result(&["s"], vec![vec![NativeValue::Extended(ExtendedString::iri("http://ex/a"))]]);
        let mut handle = GraphHandle::new(Box::new(conn));

        let prepared = QueryEngine::prepare("SELECT ?s WHERE { ?s <http://ex/p> ?o }").unwrap();
        let mut initial = HashMap::new();
        initial.insert("o".to_string(), RdfTerm::iri("http://ex/o").unwrap());

        let rows: Vec<_> = QueryEngine::eval(&mut handle, &prepared, &initial)
            .unwrap()
            .collect::<BridgeResult<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);

        let sql = probe.last_statement().unwrap().sql;
        assert!(sql.starts_with("sparql\ndefine input:default-graph-uri <virt:DEFAULT>\n"));
        assert!(sql.contains("<http://ex/p> <http://ex/o>"));
    }
}
