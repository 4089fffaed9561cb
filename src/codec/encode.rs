//! Term encoding for bound parameters and inline query text

use super::value::Param;
use crate::error::{BridgeError, BridgeResult, TermPosition};
use crate::rdf::{RdfTerm, Triple};

/// Prefix marking a blank node label in a parameter or IRI slot
pub const BLANK_PREFIX: &str = "_:";

/// Discriminant written in the first object parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// IRI or blank node
    Node = 1,
    /// Plain string literal
    Plain = 3,
    /// Literal with datatype
    Typed = 4,
    /// Literal with language tag
    Lang = 5,
}

impl ObjectKind {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ObjectKind::Node),
            3 => Some(ObjectKind::Plain),
            4 => Some(ObjectKind::Typed),
            5 => Some(ObjectKind::Lang),
            _ => None,
        }
    }
}

/// The three parameter slots of an encoded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSlots {
    pub kind: ObjectKind,
    pub value: String,
    /// Datatype IRI or language tag
    pub extra: Option<String>,
}

impl ObjectSlots {
    pub fn into_params(self) -> [Param; 3] {
        [Param::Int(self.kind.code()), Param::Str(self.value), self.extra.into()]
    }
}

/// A triple ready to be bound into the insert/delete templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTriple {
    pub subject: String,
    pub predicate: String,
    pub object: ObjectSlots,
}

impl EncodedTriple {
    /// Parameters in template order: graph, subject, predicate, object slots
    pub fn into_params(self, graph: &str) -> Vec<Param> {
        let mut params = Vec::with_capacity(6);
        params.push(Param::Str(graph.to_string()));
        params.push(Param::Str(self.subject));
        params.push(Param::Str(self.predicate));
        params.extend(self.object.into_params());
        params
    }
}

/// Encode a subject or predicate into its single string slot.
///
/// Subjects take IRIs and blank nodes, predicates only IRIs.
pub fn encode_node(term: &RdfTerm, position: TermPosition) -> BridgeResult<String> {
    match (term, position) {
        (RdfTerm::NamedNode(n), _) => Ok(n.as_str().to_string()),
        (RdfTerm::BlankNode(b), TermPosition::Subject | TermPosition::Object) => {
            Ok(format!("{}{}", BLANK_PREFIX, b.as_str()))
        }
        _ => Err(BridgeError::UnsupportedTermPosition {
            position,
            term: format!("{} {}", term.kind_name(), term),
        }),
    }
}

/// Encode an object into (kind, value, extra)
pub fn encode_object(term: &RdfTerm) -> ObjectSlots {
    match term {
        RdfTerm::NamedNode(n) => ObjectSlots {
            kind: ObjectKind::Node,
            value: n.as_str().to_string(),
            extra: None,
        },
        RdfTerm::BlankNode(b) => ObjectSlots {
            kind: ObjectKind::Node,
            value: format!("{}{}", BLANK_PREFIX, b.as_str()),
            extra: None,
        },
        RdfTerm::Literal(lit) => {
            if let Some(lang) = lit.language() {
                ObjectSlots {
                    kind: ObjectKind::Lang,
                    value: lit.value().to_string(),
                    extra: Some(lang.to_string()),
                }
            } else if let Some(datatype) = lit.explicit_datatype() {
                ObjectSlots {
                    kind: ObjectKind::Typed,
                    value: lit.value().to_string(),
                    extra: Some(datatype.as_str().to_string()),
                }
            } else {
                ObjectSlots {
                    kind: ObjectKind::Plain,
                    value: lit.value().to_string(),
                    extra: None,
                }
            }
        }
    }
}

pub fn encode_triple(triple: &Triple) -> BridgeResult<EncodedTriple> {
    Ok(EncodedTriple {
        subject: encode_node(&triple.subject, TermPosition::Subject)?,
        predicate: encode_node(&triple.predicate, TermPosition::Predicate)?,
        object: encode_object(&triple.object),
    })
}

/// Prefix every single quote with a backslash. Nothing else is escaped.
pub fn escape_quotes(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '\'' {
            buf.push('\\');
        }
        buf.push(ch);
    }
    buf
}

/// Render a term for direct inclusion in query text.
///
/// Only single quotes are escaped in literal values; never pass untrusted
/// text through here into a live query.
pub fn term_to_text(term: &RdfTerm) -> String {
    match term {
        RdfTerm::NamedNode(n) => format!("<{}>", n.as_str()),
        RdfTerm::BlankNode(b) => format!("<{}{}>", BLANK_PREFIX, b.as_str()),
        RdfTerm::Literal(lit) => {
            let mut text = format!("'{}'", escape_quotes(lit.value()));
            if let Some(lang) = lit.language() {
                text.push('@');
                text.push_str(lang);
            } else if let Some(datatype) = lit.explicit_datatype() {
                text.push_str("^^<");
                text.push_str(datatype.as_str());
                text.push('>');
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{BlankNode, Literal, NamedNode};

    const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";

    #[test]
    fn test_subject_accepts_iri_and_blank() {
        let iri = RdfTerm::iri("http://ex/1").unwrap();
        assert_eq!(encode_node(&iri, TermPosition::Subject).unwrap(), "http://ex/1");

        let blank = RdfTerm::from(BlankNode::from_str("b1").unwrap());
        assert_eq!(encode_node(&blank, TermPosition::Subject).unwrap(), "_:b1");
    }

    #[test]
    fn test_literal_subject_is_rejected() {
        let lit = RdfTerm::from(Literal::new_simple_literal("x"));
        let err = encode_node(&lit, TermPosition::Subject).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnsupportedTermPosition { position: TermPosition::Subject, .. }
        ));
    }

    #[test]
    fn test_blank_predicate_is_rejected() {
        let blank = RdfTerm::from(BlankNode::from_str("p").unwrap());
        assert!(encode_node(&blank, TermPosition::Predicate).is_err());
    }

    #[test]
    fn test_object_slots() {
        let slots = encode_object(&RdfTerm::iri("http://ex/o").unwrap());
        assert_eq!(slots.kind, ObjectKind::Node);
        assert_eq!(slots.extra, None);

        let slots = encode_object(&RdfTerm::from(BlankNode::from_str("b7").unwrap()));
        assert_eq!(slots.value, "_:b7");

        let slots = encode_object(&Literal::new_simple_literal("hi").into());
        assert_eq!(slots.into_params(), [Param::Int(3), Param::Str("hi".into()), Param::Null]);

        let typed = Literal::new_typed_literal("7", NamedNode::new(XSD_INT).unwrap());
        let slots = encode_object(&typed.into());
        assert_eq!(slots.kind, ObjectKind::Typed);
        assert_eq!(slots.extra.as_deref(), Some(XSD_INT));

        let tagged = Literal::new_language_tagged_literal("salut", "fr").unwrap();
        let slots = encode_object(&tagged.into());
        assert_eq!(slots.kind.code(), 5);
        assert_eq!(slots.extra.as_deref(), Some("fr"));
    }

    #[test]
    fn test_escape_only_touches_quotes() {
        assert_eq!(escape_quotes("it's"), "it\\'s");
        assert_eq!(escape_quotes("''"), "\\'\\'");
        assert_eq!(escape_quotes("a\"b\\c\n"), "a\"b\\c\n");
    }

    #[test]
    fn test_term_to_text() {
        assert_eq!(term_to_text(&RdfTerm::iri("http://ex/1").unwrap()), "<http://ex/1>");
        assert_eq!(
            term_to_text(&BlankNode::from_str("b0").unwrap().into()),
            "<_:b0>"
        );
        assert_eq!(
            term_to_text(&Literal::new_simple_literal("O'Brien").into()),
            "'O\\'Brien'"
        );
        assert_eq!(
            term_to_text(&Literal::new_language_tagged_literal("chat", "fr").unwrap().into()),
            "'chat'@fr"
        );
        let typed = Literal::new_typed_literal("5", NamedNode::new(XSD_INT).unwrap());
        assert_eq!(term_to_text(&typed.into()), format!("'5'^^<{}>", XSD_INT));
    }

    #[test]
    fn test_triple_params_order() {
        let triple = Triple::new(
            RdfTerm::iri("http://ex/s").unwrap(),
            RdfTerm::iri("http://ex/p").unwrap(),
            Literal::new_simple_literal("v"),
        );
        let params = encode_triple(&triple).unwrap().into_params("http://ex/g");
        assert_eq!(params.len(), 6);
        assert_eq!(params[0].as_str(), Some("http://ex/g"));
        assert_eq!(params[3].as_int(), Some(3));
        assert_eq!(params[5], Param::Null);
    }
}
