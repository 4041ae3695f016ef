//! Hierarchical, pattern-matching keyword/value store.
//!
//! A [`Dictionary`] is a named, insertion-ordered collection of entries. Each
//! entry binds a keyword to either a token stream or a nested dictionary.
//! Three structures are kept consistent under every mutation:
//! - the entry list (insertion order, governs iteration and output),
//! - the exact-match hash index over non-pattern keywords (authoritative for
//!   lookup),
//! - the pattern table of regex-keyed entries in insertion order (consulted
//!   in reverse, so the most recently added pattern wins).
//!
//! Exact matches always beat patterns regardless of insertion order. Upward
//! and scoped lookup live in [`search`]; parsing, substitution and output in
//! their own submodules.

pub mod expand;
pub mod parse;
pub mod search;
pub mod write;

use ahash::AHashMap;
use regex::Regex;
use sha2::{Digest as _, Sha256};

use crate::api::{LookupError, LookupErrorKind, SearchPolicy};
use crate::stdx::{LinkedList, NodeId};
use crate::token_stream::{FromTokens, TokenStream};

pub use search::Scope;

/// A keyword bound to a value stream or a nested dictionary.
#[derive(Clone, Debug)]
pub struct Entry {
    keyword: String,
    /// Pattern entries carry their keyword as regex source text.
    pattern: bool,
    value: EntryValue,
}

#[derive(Clone, Debug)]
pub enum EntryValue {
    Stream(TokenStream),
    Dict(Dictionary),
}

impl Entry {
    /// Plain entry holding a value stream.
    pub fn stream(keyword: impl Into<String>, stream: TokenStream) -> Self {
        Self {
            keyword: keyword.into(),
            pattern: false,
            value: EntryValue::Stream(stream),
        }
    }

    /// Pattern entry: `keyword` is regex source, matched against lookup keys
    /// when no exact entry matches.
    pub fn pattern(keyword: impl Into<String>, stream: TokenStream) -> Self {
        Self {
            keyword: keyword.into(),
            pattern: true,
            value: EntryValue::Stream(stream),
        }
    }

    /// Entry holding a nested dictionary.
    pub fn dict(keyword: impl Into<String>, dict: Dictionary) -> Self {
        Self {
            keyword: keyword.into(),
            pattern: false,
            value: EntryValue::Dict(dict),
        }
    }

    #[inline]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[inline]
    pub fn is_pattern(&self) -> bool {
        self.pattern
    }

    #[inline]
    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut EntryValue {
        &mut self.value
    }

    /// The value stream, or `None` for a dictionary entry.
    pub fn as_stream(&self) -> Option<&TokenStream> {
        match &self.value {
            EntryValue::Stream(s) => Some(s),
            EntryValue::Dict(_) => None,
        }
    }

    /// The nested dictionary, or `None` for a stream entry.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match &self.value {
            EntryValue::Dict(d) => Some(d),
            EntryValue::Stream(_) => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match &mut self.value {
            EntryValue::Dict(d) => Some(d),
            EntryValue::Stream(_) => None,
        }
    }
}

/// Named, insertion-ordered, pattern-aware keyword/value store.
#[derive(Debug)]
pub struct Dictionary {
    /// Diagnostic identifier; nested dictionaries carry a slash-joined path.
    name: String,
    entries: LinkedList<Entry>,
    index: AHashMap<String, NodeId>,
    /// Pattern entries with their compiled, fully anchored regexes, in
    /// insertion order. Matched in reverse.
    patterns: Vec<(NodeId, Regex)>,
}

impl Dictionary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: LinkedList::new(),
            index: AHashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// Parses dictionary text. Equivalent to [`parse::parse`].
    pub fn parse(name: &str, text: &str) -> Result<Self, crate::api::ParseError> {
        parse::parse(name, text)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Keyword list in insertion order, patterns included.
    pub fn toc(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.keyword.clone()).collect()
    }

    // --------------------------
    // Local lookup
    // --------------------------

    /// Local lookup: exact hash hit first, then (under `policy.patterns`)
    /// the pattern table in reverse insertion order. `policy.recursive` has
    /// no effect here; upward search needs a [`Scope`].
    pub fn find_entry(&self, keyword: &str, policy: SearchPolicy) -> Option<&Entry> {
        if let Some(id) = self.index.get(keyword) {
            return self.entries.get(*id);
        }
        if policy.patterns {
            for (id, re) in self.patterns.iter().rev() {
                if re.is_match(keyword) {
                    return self.entries.get(*id);
                }
            }
        }
        None
    }

    pub fn find_entry_mut(&mut self, keyword: &str, policy: SearchPolicy) -> Option<&mut Entry> {
        let id = if let Some(id) = self.index.get(keyword) {
            Some(*id)
        } else if policy.patterns {
            self.patterns
                .iter()
                .rev()
                .find(|(_, re)| re.is_match(keyword))
                .map(|(id, _)| *id)
        } else {
            None
        };
        id.and_then(|id| self.entries.get_mut(id))
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.find_entry(keyword, SearchPolicy::LOCAL).is_some()
    }

    /// Roots a [`Scope`] at this dictionary for upward and scoped search.
    pub fn scope(&self) -> Scope<'_> {
        Scope::root(self)
    }

    // --------------------------
    // Mutation
    // --------------------------

    fn compile_pattern(&self, entry: &Entry) -> Result<Regex, LookupError> {
        // Patterns must match the whole keyword, not a substring.
        Regex::new(&format!("^(?:{})$", entry.keyword)).map_err(|e| {
            LookupError::new(
                &self.name,
                &entry.keyword,
                LookupErrorKind::BadValue {
                    detail: format!("invalid pattern: {e}"),
                },
            )
        })
    }

    /// Inserts a new entry, refusing to overwrite an existing keyword.
    pub fn add(&mut self, entry: Entry) -> Result<(), LookupError> {
        if self.entry_id(&entry.keyword).is_some() {
            return Err(LookupError::new(
                &self.name,
                &entry.keyword,
                LookupErrorKind::AlreadyPresent,
            ));
        }
        self.insert_unchecked(entry)
    }

    /// Inserts, merging with any existing entry of the same keyword: two
    /// dictionaries interleave recursively (primitive leaves overwrite),
    /// anything else is overwritten wholesale.
    pub fn add_merge(&mut self, entry: Entry) -> Result<(), LookupError> {
        let Some(id) = self.entry_id(&entry.keyword) else {
            return self.insert_unchecked(entry);
        };
        let existing_is_dict = self
            .entries
            .get(id)
            .is_some_and(|e| e.as_dict().is_some());
        match entry.value {
            EntryValue::Dict(new) if existing_is_dict => {
                let old = self
                    .entries
                    .get_mut(id)
                    .and_then(Entry::as_dict_mut)
                    .expect("index and entry list agree");
                old.merge(new)
            }
            value => {
                let existing = self
                    .entries
                    .get_mut(id)
                    .expect("index and entry list agree");
                if existing.pattern == entry.pattern {
                    // In-place overwrite keeps the entry's position.
                    existing.value = value;
                    Ok(())
                } else {
                    self.set(Entry {
                        keyword: entry.keyword,
                        pattern: entry.pattern,
                        value,
                    })
                }
            }
        }
    }

    /// Overwrites whatever currently occupies the keyword, dictionary or not.
    pub fn set(&mut self, entry: Entry) -> Result<(), LookupError> {
        self.remove(&entry.keyword);
        self.insert_unchecked(entry)
    }

    fn insert_unchecked(&mut self, entry: Entry) -> Result<(), LookupError> {
        if entry.pattern {
            let re = self.compile_pattern(&entry)?;
            let id = self.entries.push_back(entry);
            self.patterns.push((id, re));
        } else {
            let keyword = entry.keyword.clone();
            let id = self.entries.push_back(entry);
            self.index.insert(keyword, id);
        }
        Ok(())
    }

    /// Node id of the entry with exactly this keyword (pattern text matches
    /// only its own entry here, not other keys).
    fn entry_id(&self, keyword: &str) -> Option<NodeId> {
        if let Some(id) = self.index.get(keyword) {
            return Some(*id);
        }
        self.patterns
            .iter()
            .find(|(id, _)| {
                self.entries
                    .get(*id)
                    .is_some_and(|e| e.keyword == keyword)
            })
            .map(|(id, _)| *id)
    }

    /// Removes the entry bound to `keyword` (exact or pattern text) from the
    /// entry list, the hash index, and the pattern table. Returns the entry.
    pub fn remove(&mut self, keyword: &str) -> Option<Entry> {
        let id = self.entry_id(keyword)?;
        self.index.remove(keyword);
        self.patterns.retain(|(pid, _)| *pid != id);
        Some(self.entries.remove(id))
    }

    /// Rebinds an entry under a new keyword, keeping its position in the
    /// entry order. Returns false when `old` does not exist or `new` is
    /// already taken.
    pub fn change_keyword(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return self.entry_id(old).is_some();
        }
        if self.entry_id(new).is_some() {
            return false;
        }
        let Some(id) = self.entry_id(old) else {
            return false;
        };
        let is_pattern = self.entries.get(id).is_some_and(|e| e.pattern);
        if is_pattern {
            let Ok(re) = Regex::new(&format!("^(?:{new})$")) else {
                return false;
            };
            for slot in &mut self.patterns {
                if slot.0 == id {
                    slot.1 = re;
                    break;
                }
            }
        } else {
            self.index.remove(old);
            self.index.insert(new.to_string(), id);
        }
        self.entries
            .get_mut(id)
            .expect("index and entry list agree")
            .keyword = new.to_string();
        true
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.patterns.clear();
    }

    /// Recursive merge of `other` into `self`: sub-dictionaries interleave,
    /// primitive entries overwrite, new entries append in `other`'s order.
    pub fn merge(&mut self, mut other: Dictionary) -> Result<(), LookupError> {
        while let Some(entry) = other.entries.pop_front() {
            self.add_merge(entry)?;
        }
        Ok(())
    }

    /// Descends through sub-dictionary entries named by `path` segments
    /// (exact keyword text, pattern keywords included).
    fn dict_at_path_mut(&mut self, path: &[String]) -> Option<&mut Dictionary> {
        let mut current = self;
        for segment in path {
            let id = current.entry_id(segment)?;
            current = current.entries.get_mut(id)?.as_dict_mut()?;
        }
        Some(current)
    }

    // --------------------------
    // Typed access
    // --------------------------

    fn found_or_err(&self, keyword: &str, policy: SearchPolicy) -> Result<&Entry, LookupError> {
        self.find_entry(keyword, policy)
            .ok_or_else(|| LookupError::not_found(&self.name, keyword))
    }

    /// The raw value stream bound to `keyword`.
    pub fn stream(&self, keyword: &str) -> Result<&TokenStream, LookupError> {
        match &self.found_or_err(keyword, SearchPolicy::LOCAL)?.value {
            EntryValue::Stream(s) => Ok(s),
            EntryValue::Dict(_) => Err(LookupError::new(
                &self.name,
                keyword,
                LookupErrorKind::NotAStream,
            )),
        }
    }

    /// The nested dictionary bound to `keyword`.
    pub fn subdict(&self, keyword: &str) -> Result<&Dictionary, LookupError> {
        match &self.found_or_err(keyword, SearchPolicy::LOCAL)?.value {
            EntryValue::Dict(d) => Ok(d),
            EntryValue::Stream(_) => Err(LookupError::new(
                &self.name,
                keyword,
                LookupErrorKind::NotADictionary,
            )),
        }
    }

    pub fn subdict_mut(&mut self, keyword: &str) -> Result<&mut Dictionary, LookupError> {
        let name = self.name.clone();
        match self.find_entry_mut(keyword, SearchPolicy::LOCAL) {
            Some(Entry {
                value: EntryValue::Dict(d),
                ..
            }) => Ok(d),
            Some(_) => Err(LookupError::new(
                name,
                keyword,
                LookupErrorKind::NotADictionary,
            )),
            None => Err(LookupError::not_found(name, keyword)),
        }
    }

    /// Mandatory typed read: the whole value stream must convert to `T` with
    /// nothing left over.
    pub fn get<T: FromTokens>(&self, keyword: &str) -> Result<T, LookupError> {
        let stream = self.stream(keyword)?;
        let mut replay = stream.clone();
        replay.rewind();
        let value = T::from_tokens(&mut replay).map_err(|e| {
            LookupError::new(
                &self.name,
                keyword,
                LookupErrorKind::BadValue {
                    detail: e.to_string(),
                },
            )
        })?;
        if !replay.is_exhausted() {
            return Err(LookupError::new(
                &self.name,
                keyword,
                LookupErrorKind::BadValue {
                    detail: format!("{} unread trailing token(s)", replay.remaining()),
                },
            ));
        }
        Ok(value)
    }

    /// Optional typed read: a miss or a malformed value yields `default`.
    /// Never fails; misses log at debug, malformed values at warn.
    pub fn get_or_default<T: FromTokens>(&self, keyword: &str, default: T) -> T {
        match self.get(keyword) {
            Ok(value) => value,
            Err(LookupError {
                kind: LookupErrorKind::NotFound,
                ..
            }) => {
                log::debug!(
                    "dictionary '{}': keyword '{keyword}' absent, using default",
                    self.name
                );
                default
            }
            Err(e) => {
                log::warn!("{e}; using default");
                default
            }
        }
    }

    /// Fills `out` when the keyword is present and well formed; reports
    /// whether it did.
    pub fn read_if_present<T: FromTokens>(&self, keyword: &str, out: &mut T) -> bool {
        match self.get(keyword) {
            Ok(value) => {
                *out = value;
                true
            }
            Err(LookupError {
                kind: LookupErrorKind::NotFound,
                ..
            }) => false,
            Err(e) => {
                log::warn!("{e}; keeping previous value");
                false
            }
        }
    }

    // --------------------------
    // Content identity
    // --------------------------

    /// Deterministic content hash of the dictionary body. A pure function of
    /// entry order, keywords, pattern flags and values; the dictionary's own
    /// name and position in any enclosing tree do not contribute.
    pub fn digest(&self) -> [u8; 32] {
        let mut canonical = String::new();
        write::write_body(self, &mut canonical, 0);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hasher.finalize().into()
    }

    /// Structural equality on content: entry order, keywords, pattern flags,
    /// token sequences and nested dictionaries. Names are ignored.
    pub fn content_eq(&self, other: &Dictionary) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries.iter().zip(other.entries.iter()).all(|(a, b)| {
            a.keyword == b.keyword
                && a.pattern == b.pattern
                && match (&a.value, &b.value) {
                    (EntryValue::Stream(x), EntryValue::Stream(y)) => x.content_eq(y),
                    (EntryValue::Dict(x), EntryValue::Dict(y)) => x.content_eq(y),
                    _ => false,
                }
        })
    }
}

impl Clone for Dictionary {
    /// Deep copy. Rebuilt entry by entry so the internal indexes refer to the
    /// clone's own storage.
    fn clone(&self) -> Self {
        let mut out = Dictionary::new(self.name.clone());
        for entry in self.entries.iter() {
            out.insert_unchecked(entry.clone())
                .expect("pattern re-compilation of an already compiled pattern");
        }
        out
    }
}
