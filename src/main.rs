use anyhow::Context;
use sparql_bridge::connection::MemoryConnection;
use sparql_bridge::rdf::{Literal, RdfTerm, Triple, TriplePattern};
use sparql_bridge::{GraphConfig, GraphEvent, GraphHandle};
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

const FOAF: &str = "http://xmlns.com/foaf/0.1/";
const EX: &str = "http://example.org/";

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("SPARQL Bridge v{}", sparql_bridge::version());
    println!("==========================================");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => GraphConfig::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => GraphConfig {
            graph_name: format!("{}people", EX),
            ..GraphConfig::default()
        },
    };
    config.validate()?;

    let mut graph = GraphHandle::with_config(Box::new(MemoryConnection::new()), &config);
    let (tx, rx) = mpsc::channel();
    graph.add_listener(Box::new(tx));

    demo_mutations(&mut graph)?;
    demo_patterns(&mut graph)?;
    demo_queries(&mut graph)?;

    println!("\nEvents:");
    for event in rx.try_iter() {
        match event {
            GraphEvent::Added { triples, .. } => println!("  + {} triples", triples.len()),
            GraphEvent::Deleted { triples, .. } => println!("  - {} triples", triples.len()),
            GraphEvent::Removed { pattern, .. } => println!("  - matches of {:?}", pattern),
            GraphEvent::Cleared { graph } => println!("  cleared <{}>", graph),
        }
    }

    graph.close();
    Ok(())
}

fn iri(local: &str, ns: &str) -> anyhow::Result<RdfTerm> {
    Ok(RdfTerm::iri(&format!("{}{}", ns, local))?)
}

fn demo_mutations(graph: &mut GraphHandle) -> anyhow::Result<()> {
    println!("=== Demo 1: Mutations on <{}> ===", graph.graph_name());

    let knows = iri("knows", FOAF)?;
    let name = iri("name", FOAF)?;
    let mut triples = Vec::new();
    for person in ["alice", "bob", "carol"] {
        triples.push(Triple::new(iri(person, EX)?, name.clone(), Literal::new_simple_literal(person)));
    }
    triples.push(Triple::new(iri("alice", EX)?, knows.clone(), iri("bob", EX)?));
    triples.push(Triple::new(iri("bob", EX)?, knows.clone(), iri("carol", EX)?));

    graph.add_triples(&triples)?;
    println!("✓ Added {} triples", triples.len());

    let carol_knows_alice = Triple::new(iri("carol", EX)?, knows, iri("alice", EX)?);
    let mut tx = graph.transaction();
    if tx.supports_transactions()? {
        tx.execute_in_transaction(|g| g.add(&carol_knows_alice))?;
        println!("✓ Added carol -> alice in a transaction");
    }

    println!("  Size: {}", graph.size()?);
    Ok(())
}

fn demo_patterns(graph: &mut GraphHandle) -> anyhow::Result<()> {
    println!("\n=== Demo 2: Pattern Matching ===");

    let knows = iri("knows", FOAF)?;
    let pattern = TriplePattern::new(None, Some(knows.clone()), None);
    for triple in graph.find(&pattern)? {
        println!("  {}", triple?);
    }

    let alice_knows_bob = Triple::new(iri("alice", EX)?, knows.clone(), iri("bob", EX)?);
    println!("  alice knows bob: {}", graph.contains_triple(&alice_knows_bob)?);

    graph.remove(Some(iri("carol", EX)?), Some(knows), None)?;
    println!("✓ Removed carol's foaf:knows edges, size now {}", graph.size()?);
    Ok(())
}

fn demo_queries(graph: &mut GraphHandle) -> anyhow::Result<()> {
    println!("\n=== Demo 3: Ad-hoc Query ===");

    let text = format!("select * where {{ ?s <{}name> ?o }}", FOAF);
    let mut execution = graph.query(text);
    println!("  Sent:\n{}", execution.query_text());
    let mut cursor = execution.exec_select()?;
    println!("  Variables: {:?}", cursor.result_vars());
    for solution in cursor.by_ref() {
        println!("  {}", solution?.to_json());
    }
    println!("  → {} rows", cursor.row_number());
    Ok(())
}
