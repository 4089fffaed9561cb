//! RDF type definitions
//!
//! Wrapper types around the oxrdf primitives. Triples and patterns carry a
//! generic [`RdfTerm`] in every slot, the same shape the upstream graph API
//! hands us; position rules (no literal subjects, IRI-only predicates) are
//! enforced when a triple is encoded for the remote store, not here.

use oxrdf::{
    vocab::{rdf, xsd},
    BlankNode as OxBlankNode,
    Literal as OxLiteral,
    NamedNode as OxNamedNode,
};
use std::fmt;
use thiserror::Error;

/// RDF errors
#[derive(Error, Debug)]
pub enum RdfError {
    /// Invalid IRI
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// Invalid blank node
    #[error("Invalid blank node: {0}")]
    InvalidBlankNode(String),

    /// Invalid literal
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
}

pub type RdfResult<T> = Result<T, RdfError>;

/// Named node (IRI)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedNode(OxNamedNode);

impl NamedNode {
    /// Create a new named node from an IRI string
    pub fn new(iri: &str) -> RdfResult<Self> {
        OxNamedNode::new(iri)
            .map(Self)
            .map_err(|e| RdfError::InvalidIri(format!("{}: {}", iri, e)))
    }

    /// Get the IRI string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.as_str())
    }
}

impl From<OxNamedNode> for NamedNode {
    fn from(node: OxNamedNode) -> Self {
        Self(node)
    }
}

/// Blank node (anonymous node)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNode(OxBlankNode);

impl BlankNode {
    /// Create a new blank node with a unique identifier
    pub fn new() -> Self {
        Self(OxBlankNode::default())
    }

    /// Create a blank node from a string identifier
    pub fn from_str(s: &str) -> RdfResult<Self> {
        OxBlankNode::new(s)
            .map(Self)
            .map_err(|e| RdfError::InvalidBlankNode(format!("{}: {}", s, e)))
    }

    /// Get the blank node identifier
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for BlankNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.as_str())
    }
}

impl From<OxBlankNode> for BlankNode {
    fn from(node: OxBlankNode) -> Self {
        Self(node)
    }
}

/// RDF literal value
///
/// A literal carries either a language tag or a datatype. A literal whose
/// datatype is `xsd:string` is a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(OxLiteral);

impl Literal {
    /// Create a simple literal (plain string)
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self(OxLiteral::new_simple_literal(value))
    }

    /// Create a literal with language tag
    pub fn new_language_tagged_literal(value: impl Into<String>, language: impl Into<String>) -> RdfResult<Self> {
        OxLiteral::new_language_tagged_literal(value, language)
            .map(Self)
            .map_err(|e| RdfError::InvalidLiteral(e.to_string()))
    }

    /// Create a typed literal
    pub fn new_typed_literal(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self(OxLiteral::new_typed_literal(value, datatype.0))
    }

    /// Get the lexical value
    pub fn value(&self) -> &str {
        self.0.value()
    }

    /// Get the language tag if present
    pub fn language(&self) -> Option<&str> {
        self.0.language()
    }

    /// Get the datatype
    pub fn datatype(&self) -> NamedNode {
        NamedNode(self.0.datatype().into_owned())
    }

    /// Datatype IRI to write next to the lexical value, if any.
    ///
    /// `None` for plain and language-tagged literals.
    pub fn explicit_datatype(&self) -> Option<NamedNode> {
        let datatype = self.0.datatype();
        if datatype == xsd::STRING || datatype == rdf::LANG_STRING {
            None
        } else {
            Some(NamedNode(datatype.into_owned()))
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lang) = self.language() {
            write!(f, "\"{}\"@{}", self.value(), lang)
        } else {
            write!(f, "\"{}\"^^{}", self.value(), self.datatype())
        }
    }
}

impl From<OxLiteral> for Literal {
    fn from(lit: OxLiteral) -> Self {
        Self(lit)
    }
}

/// RDF term (any RDF value)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdfTerm {
    /// Named node (IRI)
    NamedNode(NamedNode),
    /// Blank node
    BlankNode(BlankNode),
    /// Literal value
    Literal(Literal),
}

impl RdfTerm {
    /// Shorthand for an IRI term
    pub fn iri(iri: &str) -> RdfResult<Self> {
        Ok(RdfTerm::NamedNode(NamedNode::new(iri)?))
    }

    /// Check if this is a named node
    pub fn is_named_node(&self) -> bool {
        matches!(self, RdfTerm::NamedNode(_))
    }

    /// Check if this is a blank node
    pub fn is_blank_node(&self) -> bool {
        matches!(self, RdfTerm::BlankNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, RdfTerm::Literal(_))
    }

    /// Short kind name used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            RdfTerm::NamedNode(_) => "IRI",
            RdfTerm::BlankNode(_) => "blank node",
            RdfTerm::Literal(_) => "literal",
        }
    }
}

impl fmt::Display for RdfTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfTerm::NamedNode(n) => write!(f, "{}", n),
            RdfTerm::BlankNode(b) => write!(f, "{}", b),
            RdfTerm::Literal(l) => write!(f, "{}", l),
        }
    }
}

impl From<NamedNode> for RdfTerm {
    fn from(node: NamedNode) -> Self {
        RdfTerm::NamedNode(node)
    }
}

impl From<BlankNode> for RdfTerm {
    fn from(node: BlankNode) -> Self {
        RdfTerm::BlankNode(node)
    }
}

impl From<Literal> for RdfTerm {
    fn from(lit: Literal) -> Self {
        RdfTerm::Literal(lit)
    }
}

/// RDF triple (subject-predicate-object)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// Subject
    pub subject: RdfTerm,
    /// Predicate
    pub predicate: RdfTerm,
    /// Object
    pub object: RdfTerm,
}

impl Triple {
    /// Create a new triple
    pub fn new(subject: impl Into<RdfTerm>, predicate: impl Into<RdfTerm>, object: impl Into<RdfTerm>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Triple pattern for queries (with optional variables)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TriplePattern {
    /// Subject (None = wildcard)
    pub subject: Option<RdfTerm>,
    /// Predicate (None = wildcard)
    pub predicate: Option<RdfTerm>,
    /// Object (None = wildcard)
    pub object: Option<RdfTerm>,
}

impl TriplePattern {
    /// Create a new triple pattern
    pub fn new(subject: Option<RdfTerm>, predicate: Option<RdfTerm>, object: Option<RdfTerm>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The pattern that matches every triple
    pub fn any() -> Self {
        Self::default()
    }

    /// Every slot is concrete
    pub fn is_fully_bound(&self) -> bool {
        self.subject.is_some() && self.predicate.is_some() && self.object.is_some()
    }

    /// Every slot is a wildcard
    pub fn is_wildcard(&self) -> bool {
        self.subject.is_none() && self.predicate.is_none() && self.object.is_none()
    }

    /// The concrete triple, when every slot is bound
    pub fn as_triple(&self) -> Option<Triple> {
        match (&self.subject, &self.predicate, &self.object) {
            (Some(s), Some(p), Some(o)) => Some(Triple::new(s.clone(), p.clone(), o.clone())),
            _ => None,
        }
    }

    /// Check if a triple matches this pattern
    pub fn matches(&self, triple: &Triple) -> bool {
        if let Some(ref s) = self.subject {
            if s != &triple.subject {
                return false;
            }
        }
        if let Some(ref p) = self.predicate {
            if p != &triple.predicate {
                return false;
            }
        }
        if let Some(ref o) = self.object {
            if o != &triple.object {
                return false;
            }
        }
        true
    }
}

impl From<&Triple> for TriplePattern {
    fn from(triple: &Triple) -> Self {
        Self::new(
            Some(triple.subject.clone()),
            Some(triple.predicate.clone()),
            Some(triple.object.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_node() {
        let node = NamedNode::new("http://example.org/alice").unwrap();
        assert_eq!(node.as_str(), "http://example.org/alice");
        assert_eq!(node.to_string(), "<http://example.org/alice>");
        assert!(NamedNode::new("not an iri").is_err());
    }

    #[test]
    fn test_blank_node() {
        let node1 = BlankNode::new();
        let node2 = BlankNode::new();
        assert_ne!(node1, node2);

        let named = BlankNode::from_str("b42").unwrap();
        assert_eq!(named.to_string(), "_:b42");
    }

    #[test]
    fn test_literal_kinds() {
        let plain = Literal::new_simple_literal("Alice");
        assert_eq!(plain.explicit_datatype(), None);

        let tagged = Literal::new_language_tagged_literal("Alice", "en").unwrap();
        assert_eq!(tagged.language(), Some("en"));
        assert_eq!(tagged.explicit_datatype(), None);

        let int = NamedNode::new("http://www.w3.org/2001/XMLSchema#integer").unwrap();
        let typed = Literal::new_typed_literal("42", int.clone());
        assert_eq!(typed.explicit_datatype(), Some(int));
    }

    #[test]
    fn test_triple_pattern_matching() {
        let alice = RdfTerm::iri("http://example.org/alice").unwrap();
        let name = RdfTerm::iri("http://xmlns.com/foaf/0.1/name").unwrap();
        let triple = Triple::new(alice.clone(), name, Literal::new_simple_literal("Alice"));

        assert!(TriplePattern::new(Some(alice), None, None).matches(&triple));

        let bob = RdfTerm::iri("http://example.org/bob").unwrap();
        assert!(!TriplePattern::new(Some(bob), None, None).matches(&triple));

        assert!(TriplePattern::any().matches(&triple));
        assert!(TriplePattern::any().is_wildcard());
        assert!(TriplePattern::from(&triple).is_fully_bound());
        assert_eq!(TriplePattern::from(&triple).as_triple(), Some(triple));
    }
}
