//! Structured statement builder
//!
//! A statement is a `sparql` header, an ordered block of `define` directives
//! (one per line) and a body. Directives are kept in a fixed order no matter
//! the order they were pushed in.

use crate::config::QueryOptions;
use std::fmt;

/// Header line every statement starts with
pub const STATEMENT_PREFIX: &str = "sparql\n";

/// Count wrapper around a statement
pub const COUNT_PREFIX: &str = "select count(*) from (";
pub const COUNT_SUFFIX: &str = ")f";

/// Graph scope bound as a parameter rather than inlined
pub const GRAPH_PARAM: &str = "graph `iri(??)`";

/// One `define` line of the directive block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `define input:storage "<name>"`
    Storage(String),
    /// `define input:inference '<rule set>'`
    Inference(String),
    /// `define input:same-as "yes"`
    SameAs,
    /// `define input:default-graph-uri <graph>`
    DefaultGraph(String),
}

impl Directive {
    fn rank(&self) -> u8 {
        match self {
            Directive::Storage(_) => 0,
            Directive::Inference(_) => 1,
            Directive::SameAs => 2,
            Directive::DefaultGraph(_) => 3,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Storage(name) => write!(f, "define input:storage \"{}\"", name),
            Directive::Inference(rule_set) => write!(f, "define input:inference '{}'", rule_set),
            Directive::SameAs => write!(f, "define input:same-as \"yes\""),
            Directive::DefaultGraph(graph) => write!(f, "define input:default-graph-uri <{}>", graph),
        }
    }
}

/// Statement under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlStatement {
    directives: Vec<Directive>,
    body: String,
}

impl SparqlStatement {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            directives: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a directive at its fixed position in the block
    pub fn directive(mut self, directive: Directive) -> Self {
        let at = self
            .directives
            .iter()
            .position(|d| d.rank() > directive.rank())
            .unwrap_or(self.directives.len());
        self.directives.insert(at, directive);
        self
    }

    /// Inference and same-as directives from the handle's options
    pub fn with_options(mut self, options: &QueryOptions) -> Self {
        if let Some(rule_set) = &options.rule_set {
            self = self.directive(Directive::Inference(rule_set.clone()));
        }
        if options.same_as {
            self = self.directive(Directive::SameAs);
        }
        self
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Final statement text
    pub fn render(&self) -> String {
        let mut text = String::from(STATEMENT_PREFIX);
        for directive in &self.directives {
            text.push_str(&directive.to_string());
            text.push('\n');
        }
        text.push_str(&self.body);
        text
    }

    /// Final text wrapped as a row count of this statement's result
    pub fn render_count(&self) -> String {
        format!("{}{}{}", COUNT_PREFIX, self.render(), COUNT_SUFFIX)
    }
}

impl fmt::Display for SparqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
