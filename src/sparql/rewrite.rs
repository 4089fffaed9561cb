//! Query rewriter
//!
//! Substitutes bound variables into raw query text. Quoted regions and
//! backslash-escaped characters are copied untouched; an unbound `?name`
//! stays in the text as is.

use super::results::QuerySolution;
use crate::codec::term_to_text;
use crate::rdf::RdfTerm;
use std::collections::HashMap;

/// Characters that end a variable name
pub const VARIABLE_DELIMITERS: &str = " ,)(;.";

/// Source of variable bindings for [`rewrite`]
pub trait BindingLookup {
    fn lookup(&self, name: &str) -> Option<&RdfTerm>;
}

impl BindingLookup for HashMap<String, RdfTerm> {
    fn lookup(&self, name: &str) -> Option<&RdfTerm> {
        self.get(name)
    }
}

impl BindingLookup for QuerySolution {
    fn lookup(&self, name: &str) -> Option<&RdfTerm> {
        self.get(name)
    }
}

impl<T: BindingLookup + ?Sized> BindingLookup for &T {
    fn lookup(&self, name: &str) -> Option<&RdfTerm> {
        (**self).lookup(name)
    }
}

/// Replace every bound `?name` outside quotes with the term's inline text
pub fn rewrite(text: &str, bindings: &dyn BindingLookup) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        i += 1;
        match ch {
            '\\' => {
                out.push(ch);
                if i < chars.len() {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            '"' | '\'' => {
                out.push(ch);
                while i < chars.len() {
                    let c = chars[i];
                    i += 1;
                    out.push(c);
                    if c == ch {
                        break;
                    }
                }
            }
            '?' => {
                let end = chars[i..]
                    .iter()
                    .position(|c| VARIABLE_DELIMITERS.contains(*c))
                    .map_or(chars.len(), |n| i + n);
                let name: String = chars[i..end].iter().collect();
                match bindings.lookup(&name) {
                    Some(term) if !name.is_empty() => {
                        out.push_str(&term_to_text(term));
                        i = end;
                    }
                    _ => out.push(ch),
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
