//! Native column values returned by the remote store
//!
//! A closed set of the scalar kinds a result row can carry. Each kind maps to
//! exactly one decode rule in [`decode`](super::decode).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// How the store tagged an extended string column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IriKind {
    /// Plain string
    None,
    /// IRI (or `_:` blank label when the string type flag is set)
    Iri,
    /// Store-internal blank node (`nodeID://...`)
    BlankNode,
}

/// String column carrying IRI metadata from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedString {
    pub value: String,
    pub iri_kind: IriKind,
    /// Low bit set = the value is an IRI string
    pub str_flags: u8,
}

impl ExtendedString {
    pub const IRI_FLAG: u8 = 0x01;

    pub fn new(value: impl Into<String>, iri_kind: IriKind, str_flags: u8) -> Self {
        Self {
            value: value.into(),
            iri_kind,
            str_flags,
        }
    }

    /// An IRI string as the store returns it
    pub fn iri(value: impl Into<String>) -> Self {
        Self::new(value, IriKind::Iri, Self::IRI_FLAG)
    }
}

/// Literal box: lexical value with optional language tag and datatype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdfBox {
    pub value: String,
    pub lang: Option<String>,
    pub datatype: Option<String>,
}

impl RdfBox {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }
}

/// One column value of a result row
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    String(String),
    /// Any integer column (short, int, long)
    Integer(i64),
    Float(f32),
    Double(f64),
    /// Fixed-point number, kept in its lexical form
    Decimal(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Binary(Vec<u8>),
    Extended(ExtendedString),
    Box(RdfBox),
    /// A column type the bridge has no rule for; carries the store's type name
    Unsupported(String),
}

impl NativeValue {
    /// Integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            NativeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Null => write!(f, "NULL"),
            NativeValue::String(s) => write!(f, "{}", s),
            NativeValue::Integer(i) => write!(f, "{}", i),
            NativeValue::Float(v) => write!(f, "{}", v),
            NativeValue::Double(v) => write!(f, "{}", v),
            NativeValue::Decimal(d) => write!(f, "{}", d),
            NativeValue::Date(d) => write!(f, "{}", d),
            NativeValue::Time(t) => write!(f, "{}", t),
            NativeValue::Timestamp(ts) => write!(f, "{}", ts),
            NativeValue::Binary(bytes) => write!(f, "{}", hex::encode_upper(bytes)),
            NativeValue::Extended(es) => write!(f, "{}", es.value),
            NativeValue::Box(b) => write!(f, "{}", b.value),
            NativeValue::Unsupported(name) => write!(f, "<{}>", name),
        }
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<i64> for NativeValue {
    fn from(i: i64) -> Self {
        NativeValue::Integer(i)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::Double(v)
    }
}

/// Positional parameter bound into a prepared statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Null,
    Int(i64),
    Str(String),
}

impl Param {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Param::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Str(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Str(s)
    }
}

impl From<Option<String>> for Param {
    fn from(s: Option<String>) -> Self {
        s.map(Param::Str).unwrap_or(Param::Null)
    }
}
