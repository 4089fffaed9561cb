//! Decoding of result columns and parameter slots back into terms

use super::encode::{ObjectKind, BLANK_PREFIX};
use super::value::{ExtendedString, IriKind, NativeValue, RdfBox};
use crate::rdf::{BlankNode, Literal, NamedNode, RdfError, RdfResult, RdfTerm};
use chrono::{NaiveDateTime, Timelike};
use oxrdf::{vocab::xsd, NamedNodeRef};
use tracing::{error, warn};

/// Prefix of store-internal blank node identifiers
pub const NODE_ID_PREFIX: &str = "nodeID://";

const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

fn xsd_literal(lexical: impl Into<String>, datatype: NamedNodeRef<'_>) -> RdfTerm {
    Literal::new_typed_literal(lexical, NamedNode::from(datatype.into_owned())).into()
}

/// True if `s` parses as an absolute IRI
pub fn is_absolute_iri(s: &str) -> bool {
    oxiri::Iri::parse(s).is_ok()
}

/// Decode a subject/predicate parameter or IRI column: `_:` labels become blank nodes
pub fn decode_node(value: &str) -> RdfResult<RdfTerm> {
    match value.strip_prefix(BLANK_PREFIX) {
        Some(label) => Ok(BlankNode::from_str(label)?.into()),
        None => Ok(NamedNode::new(value)?.into()),
    }
}

/// Rebuild an object term from its three parameter slots
pub fn decode_object_slots(code: i64, value: &str, extra: Option<&str>) -> RdfResult<RdfTerm> {
    let kind = ObjectKind::from_code(code)
        .ok_or_else(|| RdfError::InvalidLiteral(format!("unknown object kind code {}", code)))?;
    match (kind, extra) {
        (ObjectKind::Node, _) => decode_node(value),
        (ObjectKind::Plain, _) => Ok(Literal::new_simple_literal(value).into()),
        (ObjectKind::Typed, Some(datatype)) => {
            Ok(Literal::new_typed_literal(value, NamedNode::new(datatype)?).into())
        }
        (ObjectKind::Lang, Some(lang)) => Ok(Literal::new_language_tagged_literal(value, lang)?.into()),
        (kind, None) => Err(RdfError::InvalidLiteral(format!(
            "object kind {:?} without datatype or language slot",
            kind
        ))),
    }
}

/// Lexical form of a float or double; non-finite values use `NaN`, `INF` and `-INF`
fn float_lexical<T: Into<f64> + Copy + std::fmt::Display>(value: T) -> String {
    let wide: f64 = value.into();
    if wide.is_nan() {
        "NaN".to_string()
    } else if wide == f64::INFINITY {
        "INF".to_string()
    } else if wide == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

/// Lexical form of a timestamp: `YYYY-MM-DDTHH:MM:SS.f`, fraction without trailing zeros
pub fn timestamp_lexical(ts: &NaiveDateTime) -> String {
    let nanos = ts.nanosecond() % 1_000_000_000;
    let fraction = if nanos == 0 {
        "0".to_string()
    } else {
        let digits = format!("{:09}", nanos);
        digits.trim_end_matches('0').to_string()
    };
    format!("{}.{}", ts.format("%Y-%m-%dT%H:%M:%S"), fraction)
}

fn decode_extended(es: &ExtendedString) -> Option<RdfTerm> {
    let term = match es.iri_kind {
        IriKind::Iri if es.str_flags & ExtendedString::IRI_FLAG == ExtendedString::IRI_FLAG => {
            decode_node(&es.value)
        }
        IriKind::BlankNode => {
            let label = es.value.strip_prefix(NODE_ID_PREFIX).unwrap_or(&es.value);
            BlankNode::from_str(label).map(RdfTerm::from)
        }
        _ => Ok(Literal::new_simple_literal(es.value.as_str()).into()),
    };
    term.map_err(|e| warn!("Cannot decode extended string '{}': {}", es.value, e)).ok()
}

fn decode_box(rb: &RdfBox) -> Option<RdfTerm> {
    let term = match (&rb.lang, &rb.datatype) {
        (Some(lang), _) => Literal::new_language_tagged_literal(rb.value.as_str(), lang.as_str()).map(RdfTerm::from),
        (None, Some(datatype)) => {
            // The store may hand back a bare XSD local name instead of a full IRI
            let iri = if is_absolute_iri(datatype) {
                datatype.clone()
            } else {
                format!("{}{}", XSD_NS, datatype)
            };
            NamedNode::new(&iri).map(|dt| Literal::new_typed_literal(rb.value.as_str(), dt).into())
        }
        (None, None) => Ok(Literal::new_simple_literal(rb.value.as_str()).into()),
    };
    term.map_err(|e| warn!("Cannot decode literal box '{}': {}", rb.value, e)).ok()
}

/// Decode one result column.
///
/// Returns `None` when the value has no term form (null, unsupported kind,
/// malformed metadata); the caller leaves that column unbound.
pub fn decode_value(value: &NativeValue) -> Option<RdfTerm> {
    match value {
        NativeValue::Null => {
            warn!("Null column value has no term form");
            None
        }
        NativeValue::String(s) => {
            if is_absolute_iri(s) {
                if let Ok(node) = NamedNode::new(s) {
                    return Some(node.into());
                }
            }
            Some(Literal::new_simple_literal(s.as_str()).into())
        }
        NativeValue::Integer(i) => Some(xsd_literal(i.to_string(), xsd::INTEGER)),
        NativeValue::Float(v) => Some(xsd_literal(float_lexical(*v), xsd::FLOAT)),
        NativeValue::Double(v) => Some(xsd_literal(float_lexical(*v), xsd::DOUBLE)),
        NativeValue::Decimal(d) => Some(xsd_literal(d.as_str(), xsd::DECIMAL)),
        NativeValue::Date(d) => Some(xsd_literal(d.format("%Y-%m-%d").to_string(), xsd::DATE)),
        NativeValue::Time(t) => Some(xsd_literal(t.to_string(), xsd::TIME)),
        NativeValue::Timestamp(ts) => Some(xsd_literal(timestamp_lexical(ts), xsd::DATE_TIME)),
        NativeValue::Binary(bytes) => Some(xsd_literal(hex::encode_upper(bytes), xsd::HEX_BINARY)),
        NativeValue::Extended(es) => decode_extended(es),
        NativeValue::Box(rb) => decode_box(rb),
        NativeValue::Unsupported(type_name) => {
            error!("The column value type '{}' is not recognised", type_name);
            None
        }
    }
}
