//! Capacity-managed containers and a scoped, pattern-matching dictionary
//! engine for plain-text configuration.
//!
//! ## Scope
//! Two subsystems, layered:
//! - `stdx`: growable and pointer-slot containers that distinguish
//!   addressable size from allocated capacity, plus an arena-backed linked
//!   list family.
//! - `dict`: a hierarchical keyword/value store parsed from `key value;` /
//!   `key { ... }` text, with regex pattern keys, scoped lookup across
//!   nesting levels, and `$`-reference substitution.
//!
//! ## Key invariants
//! - `len() <= capacity()` on every container, after every operation; growth
//!   is doubling, so N appends cost O(log N) reallocations.
//! - Exact dictionary keys always beat pattern keys; overlapping patterns are
//!   tried most-recent-first; recursive lookup runs the full procedure
//!   (patterns included) at each enclosing level.
//! - A token stream is replayable: rewinding and re-reading is free and
//!   changes nothing.
//!
//! ## Error model
//! Structural misuse (out-of-range index, null-slot deref, stale node
//! handle, empty-list pop) panics at the point of detection with the
//! offending index or keyword in the message. Everything recoverable
//! (lookup miss, malformed input, typed-read mismatch) is a `Result` whose
//! error names the dictionary, keyword and input line involved.
//!
//! ## Notable entry points
//! - [`DynList`], [`PtrList`] / [`PtrDynList`], [`LinkedList`] / [`BoxList`]:
//!   the container layer.
//! - [`TokenStream`]: replayable token sequence over the lexer in [`token`].
//! - [`Dictionary`]: parse with [`Dictionary::parse`], look up with
//!   [`Dictionary::get`] or a [`Scope`], substitute with
//!   [`Dictionary::expand`], serialize with [`Dictionary::write`].

pub mod api;
pub mod dict;
pub mod stdx;
pub mod token;
pub mod token_stream;

pub use api::{LookupError, LookupErrorKind, ParseError, ParseErrorKind, SearchPolicy, TokenError};
pub use dict::{Dictionary, Entry, EntryValue, Scope};
pub use stdx::{BoxList, Cloneable, DynList, LinkedList, NodeId, PtrDynList, PtrList, RefList};
pub use token::Token;
pub use token_stream::{FromTokens, TokenStream};
