//! Post-parse `$`-reference substitution over an already built tree.
//!
//! Parse-time substitution only sees entries declared before the reference.
//! [`Dictionary::expand`] retries everything that is still referential in a
//! finished tree: `$ref` words inside value streams, and `$ref` placeholder
//! entries in keyword position.
//!
//! Mutating a dictionary while resolving against its own ancestors cannot be
//! expressed through borrows, so each pass runs in two phases: an immutable
//! walk collects the resolvable edits (paths plus cloned replacement
//! content), then the edits are applied by path. Passes repeat until a pass
//! resolves nothing, with a cycle cap.

use crate::token::Token;
use crate::token_stream::TokenStream;

use super::search::Scope;
use super::{Dictionary, Entry, EntryValue};

/// Substitution passes before assuming a reference cycle.
const MAX_PASSES: usize = 8;

enum EditAction {
    /// Rewrite a value stream whose `$` words all resolved.
    ReplaceStream {
        keyword: String,
        stream_name: String,
        tokens: Vec<Token>,
    },
    /// Replace a `$ref` placeholder entry with the referenced entry.
    ReplaceEntry { placeholder: String, entry: Entry },
    /// Replace a `$ref` placeholder entry by merging the referenced
    /// dictionary's entries.
    MergeDict { placeholder: String, dict: Dictionary },
}

struct Edit {
    /// Keywords of the sub-dictionaries from the root to the edit site.
    path: Vec<String>,
    action: EditAction,
}

impl Dictionary {
    /// Resolves remaining `$` references throughout the tree. Returns the
    /// number of edits applied. References that never resolve are left
    /// literal; an unsettled fixpoint after the pass cap logs a warning.
    pub fn expand(&mut self) -> usize {
        let mut total = 0usize;
        for _ in 0..MAX_PASSES {
            let mut edits = Vec::new();
            {
                let this: &Dictionary = self;
                collect(this, &mut Vec::new(), &mut vec![this], &mut edits);
            }
            if edits.is_empty() {
                return total;
            }
            total += edits.len();
            for edit in edits {
                apply(self, edit);
            }
        }
        log::warn!(
            "dictionary '{}': substitution unsettled after {MAX_PASSES} passes; possible reference cycle",
            self.name()
        );
        total
    }
}

/// Immutable walk. `chain` is the root-first ancestor stack including `dict`
/// itself; `path` the keyword trail addressing `dict` from the root.
fn collect<'a>(
    dict: &'a Dictionary,
    path: &mut Vec<String>,
    chain: &mut Vec<&'a Dictionary>,
    edits: &mut Vec<Edit>,
) {
    let scope = Scope::from_chain(chain.clone());
    for entry in dict.iter() {
        match entry.value() {
            EntryValue::Stream(stream) => {
                if !entry.is_pattern() && entry.keyword().starts_with('$') {
                    if let Some(hit) = scope.resolve_reference(entry.keyword()) {
                        edits.push(Edit {
                            path: path.clone(),
                            action: match hit.value() {
                                EntryValue::Dict(d) => EditAction::MergeDict {
                                    placeholder: entry.keyword().to_string(),
                                    dict: d.clone(),
                                },
                                EntryValue::Stream(_) => EditAction::ReplaceEntry {
                                    placeholder: entry.keyword().to_string(),
                                    entry: hit.clone(),
                                },
                            },
                        });
                    }
                    continue;
                }
                if let Some(tokens) = expand_stream(&scope, stream) {
                    edits.push(Edit {
                        path: path.clone(),
                        action: EditAction::ReplaceStream {
                            keyword: entry.keyword().to_string(),
                            stream_name: stream.name().to_string(),
                            tokens,
                        },
                    });
                }
            }
            EntryValue::Dict(sub) => {
                path.push(entry.keyword().to_string());
                chain.push(sub);
                collect(sub, path, chain, edits);
                chain.pop();
                path.pop();
            }
        }
    }
}

/// Expanded token sequence for a stream, or `None` when no reference in it
/// resolves (leave it alone this pass).
fn expand_stream(scope: &Scope<'_>, stream: &TokenStream) -> Option<Vec<Token>> {
    let mut out = Vec::with_capacity(stream.len());
    let mut resolved_any = false;
    for token in stream.tokens() {
        match token {
            Token::Word(w) if w.starts_with('$') => match scope.resolve_reference(w) {
                Some(hit) => match hit.as_stream() {
                    Some(s) => {
                        out.extend(s.tokens().iter().cloned());
                        resolved_any = true;
                    }
                    None => out.push(token.clone()),
                },
                None => out.push(token.clone()),
            },
            other => out.push(other.clone()),
        }
    }
    resolved_any.then_some(out)
}

fn apply(root: &mut Dictionary, edit: Edit) {
    let Some(dict) = root.dict_at_path_mut(&edit.path) else {
        // The edit site vanished under an earlier edit of the same pass.
        return;
    };
    match edit.action {
        EditAction::ReplaceStream {
            keyword,
            stream_name,
            tokens,
        } => {
            // Pattern keywords are addressed by their own text, so go
            // through the id lookup rather than the exact-match index.
            if let Some(id) = dict.entry_id(&keyword) {
                if let Some(entry) = dict.entries.get_mut(id) {
                    entry.value = EntryValue::Stream(TokenStream::from_tokens(
                        stream_name,
                        tokens.into_iter().collect(),
                    ));
                }
            }
        }
        EditAction::ReplaceEntry { placeholder, entry } => {
            dict.remove(&placeholder);
            let _ = dict.add_merge(entry);
        }
        EditAction::MergeDict { placeholder, dict: merged } => {
            dict.remove(&placeholder);
            let _ = dict.merge(merged);
        }
    }
}
