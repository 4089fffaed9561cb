//! Integration tests for ad-hoc queries, the rewriter and result cursors

use sparql_bridge::codec::{ExtendedString, NativeValue, RdfBox};
use sparql_bridge::connection::{MemoryConnection, MemoryProbe};
use sparql_bridge::rdf::{Literal, RdfTerm};
use sparql_bridge::sparql::{rewrite, QueryEngine, QueryForm, QuerySolution, UpdateRequest};
use sparql_bridge::{BridgeError, GraphHandle, DEFAULT_GRAPH};
use std::collections::HashMap;

const G: &str = "http://example.org/people";

fn open(graph: &str) -> (GraphHandle, MemoryProbe) {
    let conn = MemoryConnection::new();
    let probe = conn.probe();
    (GraphHandle::with_graph(Box::new(conn), graph), probe)
}

fn people_rows() -> Vec<Vec<NativeValue>> {
    vec![
        vec![
            NativeValue::Extended(ExtendedString::iri("http://example.org/alice")),
            NativeValue::Box(RdfBox::new("Alice").with_lang("en")),
        ],
        vec![
            NativeValue::Extended(ExtendedString::iri("http://example.org/bob")),
            NativeValue::Unsupported("ARRAY".to_string()),
        ],
    ]
}

#[test]
fn test_rewrite_leaves_quoted_text_alone() {
    let mut bindings = HashMap::new();
    bindings.insert("x".to_string(), RdfTerm::iri("http://ex/1").unwrap());

    let out = rewrite("select ?x where { ?x a 'b?c' }", &bindings);

    assert_eq!(out, "select <http://ex/1> where { <http://ex/1> a 'b?c' }");
}

#[test]
fn test_rewrite_unbound_variables_unchanged() {
    assert_eq!(rewrite("?y ?z", &HashMap::<String, RdfTerm>::new()), "?y ?z");
}

#[test]
fn test_cursor_lifecycle() {
    let (mut graph, probe) = open(G);
    probe.push_result(&["s", "name"], people_rows());

    let mut execution = graph.query("SELECT ?s ?name WHERE { ?s <http://xmlns.com/foaf/0.1/name> ?name }");
    let mut cursor = execution.exec_select().unwrap();
    assert_eq!(cursor.result_vars(), vec!["s", "name", "graph"]);
    assert_eq!(probe.open_streams(), 1);

    let first = cursor.advance().unwrap();
    assert_eq!(
        first.get("name"),
        Some(&RdfTerm::from(Literal::new_language_tagged_literal("Alice", "en").unwrap()))
    );
    assert_eq!(first.get("graph"), Some(&RdfTerm::iri(G).unwrap()));

    // The unsupported column is skipped, not bound
    let second = cursor.advance().unwrap();
    assert!(!second.contains("name"));
    assert_eq!(second.len(), 2);

    assert!(!cursor.has_next().unwrap());
    assert!(!cursor.has_next().unwrap());
    assert_eq!(probe.open_streams(), 0);
    assert!(matches!(cursor.advance(), Err(BridgeError::NoMoreRows)));

    cursor.close();
    cursor.close();
    assert!(cursor.is_closed());
    assert_eq!(cursor.row_number(), 2);
}

#[test]
fn test_default_graph_rows_have_no_graph_binding() {
    let (mut graph, probe) = open(DEFAULT_GRAPH);
    probe.push_result(&["s", "name"], people_rows());

    let mut execution = graph.query("SELECT * WHERE { ?s ?p ?name }");
    let solutions: Vec<QuerySolution> = execution
        .exec_select()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(solutions.len(), 2);
    assert!(solutions.iter().all(|s| !s.contains("graph")));
}

#[test]
fn test_abort_cancels_stream() {
    let (mut graph, probe) = open(G);
    probe.push_result(&["s", "name"], people_rows());

    let mut execution = graph.query("SELECT * WHERE { ?s ?p ?name }");
    let mut cursor = execution.exec_select().unwrap();
    cursor.advance().unwrap();
    cursor.abort();

    assert_eq!(probe.cancels(), 1);
    assert_eq!(probe.open_streams(), 0);
    assert!(cursor.next().is_none());
}

#[test]
fn test_dropped_cursor_releases_stream() {
    let (mut graph, probe) = open(G);
    probe.push_result(&["s", "name"], people_rows());
    {
        let mut execution = graph.query("SELECT * WHERE { ?s ?p ?name }");
        let mut cursor = execution.exec_select().unwrap();
        assert!(cursor.has_next().unwrap());
    }
    assert_eq!(probe.open_streams(), 0);
}

#[test]
fn test_query_prefix_and_initial_binding() {
    let (mut graph, probe) = open(G);
    graph.set_rule_set(Some("urn:rules".to_string()));
    graph.set_same_as(true);

    let mut binding = QuerySolution::new();
    binding.bind("who", RdfTerm::iri("http://example.org/alice").unwrap());
    let mut execution = graph
        .query("SELECT ?o WHERE { ?who ?p ?o }")
        .with_initial_binding(binding);
    drop(execution.exec_select().unwrap());

    assert_eq!(
        probe.last_statement().unwrap().sql,
        "sparql\n\
         define input:inference 'urn:rules'\n\
         define input:same-as \"yes\"\n\
         define input:default-graph-uri <http://example.org/people>\n\
         SELECT ?o WHERE { <http://example.org/alice> ?p ?o }"
    );
}

#[test]
fn test_read_all_graphs_drops_default_graph_directive() {
    let (mut graph, _probe) = open(G);
    graph.set_read_all_graphs(true);
    let execution = graph.query("SELECT * WHERE { ?s ?p ?o }");
    assert_eq!(execution.query_text(), "sparql\nSELECT * WHERE { ?s ?p ?o }");
}

#[test]
fn test_ask_and_construct() {
    let (mut graph, probe) = open(G);
    probe.push_result(&["result"], vec![vec![NativeValue::Integer(1)]]);
    probe.push_result(&["result"], vec![vec![NativeValue::Integer(0)]]);
    probe.push_result(
        &["s", "p", "o"],
        vec![
            vec![
                NativeValue::Extended(ExtendedString::iri("http://example.org/alice")),
                NativeValue::Extended(ExtendedString::iri("http://xmlns.com/foaf/0.1/age")),
                NativeValue::Integer(42),
            ],
            // Literal subject: not a triple
            vec![
                NativeValue::String("alice".to_string()),
                NativeValue::Extended(ExtendedString::iri("http://xmlns.com/foaf/0.1/age")),
                NativeValue::Integer(7),
            ],
        ],
    );

    assert!(graph.query("ASK { ?s ?p ?o }").exec_ask().unwrap());
    assert!(!graph.query("ASK { ?s ?p ?o }").exec_ask().unwrap());

    let triples = graph.query("CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o }").exec_construct().unwrap();
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].subject, RdfTerm::iri("http://example.org/alice").unwrap());
}

#[test]
fn test_engine_rejects_bad_syntax() {
    let err = QueryEngine::prepare("SELECT WHERE {").unwrap_err();
    assert!(matches!(err, BridgeError::QueryFailed { .. }));
    assert!(err.to_string().starts_with("Query failed: Syntax error"));
}

#[test]
fn test_engine_eval_substitutes_binding() {
    let (mut graph, probe) = open(G);
    probe.push_result(&["o"], vec![vec![NativeValue::String("x".to_string())]]);

    let prepared = QueryEngine::prepare("SELECT ?o WHERE { ?s ?p ?o }").unwrap();
    assert_eq!(prepared.form(), QueryForm::Select);

    let mut initial = HashMap::new();
    initial.insert("s".to_string(), RdfTerm::iri("http://example.org/alice").unwrap());
    let rows: Vec<_> = QueryEngine::eval(&mut graph, &prepared, &initial)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 1);
    let sent = probe.last_statement().unwrap().sql;
    assert!(sent.contains("<http://example.org/alice>"));
    assert!(!sent.contains("?s"));
}

#[test]
fn test_update_request_runs_in_order() {
    let (mut graph, probe) = open(G);
    let mut request = UpdateRequest::new();
    request.add_update("INSERT DATA { <http://ex/a> <http://ex/p> <http://ex/b> }");
    request.add_update("CLEAR GRAPH <http://ex/g>");

    request.exec(&mut graph).unwrap();

    let sent: Vec<String> = probe.statements().into_iter().map(|s| s.sql).collect();
    assert_eq!(
        sent,
        vec![
            "sparql\nINSERT DATA { <http://ex/a> <http://ex/p> <http://ex/b> }".to_string(),
            "sparql\nCLEAR GRAPH <http://ex/g>".to_string(),
        ]
    );
}

#[test]
fn test_query_failure_is_wrapped() {
    let (mut graph, probe) = open(G);
    probe.set_faults(sparql_bridge::connection::Faults {
        queries: true,
        ..Default::default()
    });
    let err = graph.query("SELECT * WHERE { ?s ?p ?o }").exec_select().err().unwrap();
    assert!(matches!(err, BridgeError::QueryFailed { .. }));
    assert!(err.to_string().contains("query rejected"));
}
