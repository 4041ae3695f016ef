//! Plain-text dictionary output and serde export.
//!
//! Output round-trips: `parse(write(d))` reproduces `d`'s entry order,
//! keywords, pattern flags and token content. Pattern keywords are re-quoted,
//! strings re-escaped, and unresolved `$` references echo back literally.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::token::Token;

use super::{Dictionary, Entry, EntryValue};

const INDENT: &str = "    ";

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_keyword(entry: &Entry, out: &mut String) {
    if entry.is_pattern() {
        // Quoted form marks the keyword as a pattern on re-read.
        out.push_str(&Token::Str(entry.keyword().to_string()).to_string());
    } else {
        out.push_str(entry.keyword());
    }
}

fn write_entry(entry: &Entry, out: &mut String, depth: usize) {
    match entry.value() {
        EntryValue::Stream(stream) => {
            push_indent(out, depth);
            push_keyword(entry, out);
            for token in stream.tokens() {
                out.push(' ');
                out.push_str(&token.to_string());
            }
            out.push_str(";\n");
        }
        EntryValue::Dict(sub) => {
            push_indent(out, depth);
            push_keyword(entry, out);
            out.push('\n');
            push_indent(out, depth);
            out.push_str("{\n");
            write_body(sub, out, depth + 1);
            push_indent(out, depth);
            out.push_str("}\n");
        }
    }
}

/// Emits the dictionary body (entries only, no surrounding braces) at the
/// given indent depth. Also the canonical form behind [`Dictionary::digest`].
pub(super) fn write_body(dict: &Dictionary, out: &mut String, depth: usize) {
    for entry in dict.iter() {
        write_entry(entry, out, depth);
    }
}

impl Dictionary {
    /// Appends the serialized body to `out`.
    pub fn write(&self, out: &mut String) {
        write_body(self, out, 0);
    }

    /// The serialized body as a fresh string.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// --------------------------
// serde export
// --------------------------

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Token::Undefined => serializer.serialize_unit(),
            Token::Punct(c) => serializer.serialize_char(*c),
            Token::Word(w) => serializer.serialize_str(w),
            Token::Str(s) => serializer.serialize_str(s),
            Token::Int(v) => serializer.serialize_i64(*v),
            Token::Float(v) => serializer.serialize_f64(*v),
        }
    }
}

/// A value stream: a single token flattens to that token, anything else is a
/// sequence.
struct StreamValue<'a>(&'a [Token]);

impl Serialize for StreamValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            [single] => single.serialize(serializer),
            tokens => {
                let mut seq = serializer.serialize_seq(Some(tokens.len()))?;
                for token in tokens {
                    seq.serialize_element(token)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Dictionary {
    /// Ordered map of keyword to value; nested dictionaries nest as maps.
    /// Pattern keywords serialize as their regex source text.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for entry in self.iter() {
            match entry.value() {
                EntryValue::Stream(stream) => {
                    map.serialize_entry(entry.keyword(), &StreamValue(stream.tokens()))?;
                }
                EntryValue::Dict(sub) => {
                    map.serialize_entry(entry.keyword(), sub)?;
                }
            }
        }
        map.end()
    }
}
