//! Term codec
//!
//! Converts terms to the parameter slots and inline text the remote store
//! accepts, and converts result columns back into terms.
//!
//! # Example
//!
//! ```rust
//! use sparql_bridge::codec::{decode_object_slots, encode_object, term_to_text};
//! use sparql_bridge::rdf::{Literal, RdfTerm};
//!
//! let term: RdfTerm = Literal::new_simple_literal("it's").into();
//! assert_eq!(term_to_text(&term), "'it\\'s'");
//!
//! let slots = encode_object(&term);
//! let back = decode_object_slots(slots.kind.code(), &slots.value, slots.extra.as_deref()).unwrap();
//! assert_eq!(back, term);
//! ```

mod decode;
mod encode;
mod value;

pub use decode::{
    decode_node, decode_object_slots, decode_value, is_absolute_iri, timestamp_lexical,
    NODE_ID_PREFIX,
};
pub use encode::{
    encode_node, encode_object, encode_triple, escape_quotes, term_to_text,
    EncodedTriple, ObjectKind, ObjectSlots, BLANK_PREFIX,
};
pub use value::{ExtendedString, IriKind, NativeValue, Param, RdfBox};
