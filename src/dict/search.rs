//! Upward and scoped lookup over a dictionary tree.
//!
//! Nesting is by ownership, so a dictionary cannot reach its parent on its
//! own. A [`Scope`] is the explicit ancestor stack (root first) that upward
//! search needs; it is built by descending from the root and holds shared
//! borrows only.
//!
//! Two scoped syntaxes are resolved here:
//! - slash paths (`/a/b`, `../sibling`, `./x`): unambiguous, `/` cannot
//!   occur in a keyword; semantics mirror filesystem paths, and ascending
//!   above the root stays at the root.
//! - dotted keys (`a.b.c`, `..x`, `^top.x`): ambiguous because dots occur in
//!   plain keywords. Resolution backtracks over literal-prefix candidates,
//!   longest first, shrinking at the rightmost dot. The ambiguity is a
//!   documented property of the syntax, not of this implementation.

use crate::api::SearchPolicy;

use super::{Dictionary, Entry};

/// Ancestor stack for upward and scoped search. Index 0 is the root; the
/// last element is the current dictionary.
#[derive(Clone, Debug)]
pub struct Scope<'a> {
    stack: Vec<&'a Dictionary>,
}

impl<'a> Scope<'a> {
    /// Scope containing only `root`.
    pub fn root(root: &'a Dictionary) -> Self {
        Self { stack: vec![root] }
    }

    /// Builds a scope from an explicit root-first ancestor chain.
    ///
    /// # Panics
    /// Panics on an empty chain.
    pub fn from_chain(chain: Vec<&'a Dictionary>) -> Self {
        assert!(!chain.is_empty(), "scope requires at least a root");
        Self { stack: chain }
    }

    /// The dictionary this scope currently points at.
    pub fn current(&self) -> &'a Dictionary {
        *self.stack.last().expect("scope stack is never empty")
    }

    /// Nesting depth below the root.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Extends the scope into the sub-dictionary bound to `keyword`, or
    /// `None` when the keyword is absent or not a dictionary.
    pub fn descend(&self, keyword: &str) -> Option<Scope<'a>> {
        let sub = self
            .current()
            .find_entry(keyword, SearchPolicy::LOCAL)?
            .as_dict()?;
        let mut stack = self.stack.clone();
        stack.push(sub);
        Some(Scope { stack })
    }

    /// Drops up to `levels` ancestors, stopping at the root.
    pub fn ascend(&self, levels: usize) -> Scope<'a> {
        let keep = self.stack.len().saturating_sub(levels).max(1);
        Scope {
            stack: self.stack[..keep].to_vec(),
        }
    }

    /// Scope holding only the root.
    pub fn to_root(&self) -> Scope<'a> {
        Scope {
            stack: vec![self.stack[0]],
        }
    }

    // --------------------------
    // Plain upward search
    // --------------------------

    /// Exact match at the current level, then its patterns, then (under
    /// `policy.recursive`) the same against each ancestor outward to the
    /// root. The ancestor pass is a full lookup, patterns included, not just
    /// a hash probe.
    pub fn search(&self, keyword: &str, policy: SearchPolicy) -> Option<&'a Entry> {
        let mut levels: Vec<&'a Dictionary> = vec![self.current()];
        if policy.recursive {
            levels.extend(self.stack[..self.stack.len() - 1].iter().rev().copied());
        }
        for dict in levels {
            if let Some(entry) = dict.find_entry(keyword, policy) {
                return Some(entry);
            }
        }
        None
    }

    // --------------------------
    // Slash-scoped resolution
    // --------------------------

    /// Resolves a slash path to a dictionary. A leading `/` anchors at the
    /// root; `.` stays; `..` ascends (never above the root); empty segments
    /// are ignored.
    pub fn resolve_dict(&self, path: &str) -> Option<&'a Dictionary> {
        let mut scope = if path.starts_with('/') {
            self.to_root()
        } else {
            self.clone()
        };
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => scope = scope.ascend(1),
                name => scope = scope.descend(name)?,
            }
        }
        Some(scope.current())
    }

    /// Resolves a slash path whose final segment names an entry (stream or
    /// dictionary) rather than a traversal step.
    pub fn resolve_entry(&self, path: &str, policy: SearchPolicy) -> Option<&'a Entry> {
        let (dir, leaf) = match path.rfind('/') {
            Some(cut) => (&path[..cut], &path[cut + 1..]),
            None => ("", path),
        };
        if leaf.is_empty() || leaf == "." || leaf == ".." {
            return None;
        }
        let scope = if dir.is_empty() && !path.starts_with('/') {
            self.clone()
        } else {
            let dir = if path.starts_with('/') && dir.is_empty() {
                "/"
            } else {
                dir
            };
            let target = self.resolve_dict(dir)?;
            // Rebuild a minimal scope; upward search past the resolved
            // dictionary is not part of slash semantics.
            Scope::root(target)
        };
        scope.current().find_entry(leaf, policy)
    }

    // --------------------------
    // Dot-scoped resolution
    // --------------------------

    /// Resolves dotted-key syntax:
    /// - `^key` (or the legacy `:key`) anchors at the root;
    /// - `.key` resolves at the current level, each further leading dot
    ///   ascends one level (`..key` looks one level up);
    /// - the remaining key is matched by literal-prefix backtracking, since a
    ///   dot may belong to the keyword itself.
    ///
    /// A plain key without dots degrades to [`search`](Self::search), so
    /// `policy.recursive` keeps its meaning there; anchored and dotted forms
    /// resolve against the anchored level only.
    pub fn search_scoped(&self, keyword: &str, policy: SearchPolicy) -> Option<&'a Entry> {
        if let Some(rest) = keyword.strip_prefix(['^', ':']) {
            return dotted(self.stack[0], rest, policy);
        }
        let dots = keyword.len() - keyword.trim_start_matches('.').len();
        if dots > 0 {
            let rest = &keyword[dots..];
            let scope = self.ascend(dots - 1);
            return dotted(scope.current(), rest, policy);
        }
        if !keyword.contains('.') {
            return self.search(keyword, policy);
        }
        dotted(self.current(), keyword, policy)
    }

    /// Resolves a `$name` / `${name}` reference word against this scope:
    /// slash syntax when the target contains `/`, scoped dotted resolution
    /// with recursive ascent otherwise. `None` for a malformed or unresolved
    /// reference.
    pub fn resolve_reference(&self, refword: &str) -> Option<&'a Entry> {
        let target = reference_target(refword)?;
        if target.contains('/') {
            self.resolve_entry(target, SearchPolicy::LOCAL)
        } else {
            self.search_scoped(target, SearchPolicy::RECURSIVE)
        }
    }
}

/// Strips the `$` / `${...}` wrapper from a reference word.
pub(super) fn reference_target(refword: &str) -> Option<&str> {
    let stripped = refword.strip_prefix('$')?;
    let inner = match stripped.strip_prefix('{') {
        Some(braced) => braced.strip_suffix('}')?,
        None => stripped,
    };
    (!inner.is_empty()).then_some(inner)
}

/// Literal-prefix backtracking over a dotted key.
///
/// The whole key is tried as a literal first. Failing that, candidate split
/// points are taken at each dot from right to left, so the longest literal
/// prefix wins; the prefix must name a sub-dictionary, and the tail is
/// resolved inside it the same way. The first success is returned; downstream
/// configurations rely on exactly this precedence.
fn dotted<'a>(dict: &'a Dictionary, key: &str, policy: SearchPolicy) -> Option<&'a Entry> {
    if key.is_empty() {
        return None;
    }
    if let Some(entry) = dict.find_entry(key, policy) {
        return Some(entry);
    }
    let mut split = key.len();
    while let Some(dot) = key[..split].rfind('.') {
        let prefix = &key[..dot];
        let rest = &key[dot + 1..];
        if !prefix.is_empty() {
            if let Some(sub) = dict
                .find_entry(prefix, policy)
                .and_then(Entry::as_dict)
            {
                if let Some(found) = dotted(sub, rest, policy) {
                    return Some(found);
                }
            }
        }
        split = dot;
    }
    None
}
