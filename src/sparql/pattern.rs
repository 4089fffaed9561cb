//! Pattern compiler
//!
//! Builds the count, exists, enumerate and delete-where statements for a
//! triple pattern. Wildcards become `?s ?p ?o`, bound slots are rendered
//! inline with [`term_to_text`].

use super::statement::{Directive, SparqlStatement, GRAPH_PARAM, STATEMENT_PREFIX};
use crate::codec::{term_to_text, Param};
use crate::config::QueryOptions;
use crate::graph::GraphHandle;
use crate::rdf::{RdfTerm, TriplePattern};

/// Statement text plus the parameters to bind, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub text: String,
    pub params: Vec<Param>,
}

fn slot(term: Option<&RdfTerm>, var: &str) -> String {
    match term {
        Some(term) => term_to_text(term),
        None => format!("?{}", var),
    }
}

/// `S P O` of a pattern, wildcards as variables
pub fn pattern_text(pattern: &TriplePattern) -> String {
    format!(
        "{} {} {}",
        slot(pattern.subject.as_ref(), "s"),
        slot(pattern.predicate.as_ref(), "p"),
        slot(pattern.object.as_ref(), "o")
    )
}

/// Compiles patterns against one graph scope
#[derive(Debug, Clone, Copy)]
pub struct PatternCompiler<'a> {
    graph: &'a str,
    options: &'a QueryOptions,
}

impl<'a> PatternCompiler<'a> {
    pub fn new(graph: &'a str, options: &'a QueryOptions) -> Self {
        Self { graph, options }
    }

    pub fn for_handle(handle: &'a GraphHandle) -> Self {
        Self::new(handle.graph_name(), handle.options())
    }

    fn scoped_select(&self, pattern: &TriplePattern) -> String {
        if self.options.read_all_graphs {
            format!("select * where {{ {} }}", pattern_text(pattern))
        } else {
            format!("select * where {{ graph <{}> {{ {} }} }}", self.graph, pattern_text(pattern))
        }
    }

    /// Row count of the pattern; the graph is bound as parameter 1
    pub fn count(&self, pattern: &TriplePattern) -> CompiledQuery {
        let (body, params) = if self.options.read_all_graphs {
            (format!("select * where {{ {} }}", pattern_text(pattern)), Vec::new())
        } else {
            (
                format!("select * where {{ {} {{ {} }} }}", GRAPH_PARAM, pattern_text(pattern)),
                vec![Param::Str(self.graph.to_string())],
            )
        };
        let text = SparqlStatement::new(body)
            .directive(Directive::Storage(String::new()))
            .with_options(self.options)
            .render_count();
        CompiledQuery { text, params }
    }

    /// At most one matching row
    pub fn exists(&self, pattern: &TriplePattern) -> String {
        SparqlStatement::new(format!("{} limit 1", self.scoped_select(pattern)))
            .directive(Directive::Storage(String::new()))
            .with_options(self.options)
            .render()
    }

    /// Every match; projected columns are the wildcard slots
    pub fn enumerate(&self, pattern: &TriplePattern) -> String {
        let body = if self.options.read_all_graphs {
            format!("select * where {{ {} }}", pattern_text(pattern))
        } else {
            format!("select * from <{}> where {{ {} }}", self.graph, pattern_text(pattern))
        };
        SparqlStatement::new(body).with_options(self.options).render()
    }

    /// Match-then-delete for a partially bound pattern
    pub fn delete_where(&self, pattern: &TriplePattern) -> String {
        let triple = pattern_text(pattern);
        format!(
            "{}delete from graph <{g}> {{ {t} }} from <{g}> where {{ {t} }}",
            STATEMENT_PREFIX,
            g = self.graph,
            t = triple
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::Literal;

    const G: &str = "http://example.org/g";

    fn alice() -> RdfTerm {
        RdfTerm::iri("http://example.org/alice").unwrap()
    }

    #[test]
    fn test_pattern_text_mixes_terms_and_variables() {
        let pattern = TriplePattern::new(Some(alice()), None, Some(Literal::new_simple_literal("O'Neil").into()));
        assert_eq!(pattern_text(&pattern), "<http://example.org/alice> ?p 'O\\'Neil'");
    }

    #[test]
    fn test_count_binds_graph_as_parameter() {
        let options = QueryOptions::default();
        let query = PatternCompiler::new(G, &options).count(&TriplePattern::any());
        assert_eq!(
            query.text,
            "select count(*) from (sparql\ndefine input:storage \"\"\nselect * where { graph `iri(??)` { ?s ?p ?o } })f"
        );
        assert_eq!(query.params, vec![Param::Str(G.into())]);
        assert!(!query.text.contains(G));
    }

    #[test]
    fn test_exists_inlines_graph_and_limits() {
        let options = QueryOptions::default();
        let text = PatternCompiler::new(G, &options).exists(&TriplePattern::new(Some(alice()), None, None));
        assert!(text.ends_with("select * where { graph <http://example.org/g> { <http://example.org/alice> ?p ?o } } limit 1"));
    }

    #[test]
    fn test_read_all_graphs_drops_scope() {
        let options = QueryOptions {
            read_all_graphs: true,
            ..QueryOptions::default()
        };
        let compiler = PatternCompiler::new(G, &options);
        assert!(compiler.count(&TriplePattern::any()).params.is_empty());
        assert!(!compiler.exists(&TriplePattern::any()).contains(G));
        assert_eq!(compiler.enumerate(&TriplePattern::any()), "sparql\nselect * where { ?s ?p ?o }");
    }

    #[test]
    fn test_enumerate_prefixes_options_in_order() {
        let options = QueryOptions {
            rule_set: Some("rs".into()),
            same_as: true,
            read_all_graphs: false,
        };
        let text = PatternCompiler::new(G, &options).enumerate(&TriplePattern::any());
        let inference = text.find("define input:inference 'rs'").unwrap();
        let same_as = text.find("define input:same-as").unwrap();
        let body = text.find("select * from <http://example.org/g>").unwrap();
        assert!(inference < same_as && same_as < body);
    }

    #[test]
    fn test_delete_where_repeats_pattern() {
        let options = QueryOptions::default();
        let text = PatternCompiler::new(G, &options).delete_where(&TriplePattern::new(None, None, Some(alice())));
        assert_eq!(
            text,
            "sparql\ndelete from graph <http://example.org/g> { ?s ?p <http://example.org/alice> } \
             from <http://example.org/g> where { ?s ?p <http://example.org/alice> }"
        );
    }
}
