//! Token parser for dictionary text, with `$`-reference substitution.
//!
//! Grammar, per entry:
//! ```text
//! keyword value tokens… ;      primitive entry (quoted keyword => pattern)
//! keyword { entries… }         nested dictionary
//! $reference ;                 keyword substitution
//! ```
//!
//! References are expanded while reading, against the stack of dictionaries
//! being built, so an entry can refer to anything declared before it at any
//! enclosing level. `$key` and `${key}` resolve scoped syntax (`^` root
//! anchor, leading dots, dotted paths; slash paths inside `${...}`). An
//! unresolved reference is kept literally, with a warning, and echoes back on
//! write; the post-parse pass in [`expand`](super::expand) can retry it.
//!
//! Duplicate keywords within one input overwrite the earlier entry, as
//! re-reading a configuration would.

use crate::api::{LookupError, LookupErrorKind, ParseError, ParseErrorKind};
use crate::stdx::DynList;
use crate::token::{tokenize_with_lines, Token};
use crate::token_stream::TokenStream;

use super::search::Scope;
use super::{Dictionary, Entry, EntryValue};

/// Parses dictionary text into a [`Dictionary`] named `name`.
pub fn parse(name: &str, text: &str) -> Result<Dictionary, ParseError> {
    let (tokens, lines) = tokenize_with_lines(name, text)?;
    let mut parser = Parser {
        name,
        tokens: tokens.into_vec(),
        lines,
        pos: 0,
        stack: vec![Dictionary::new(name)],
    };
    parser.parse_body(None)?;
    debug_assert_eq!(parser.stack.len(), 1);
    Ok(parser.stack.pop().expect("root dictionary"))
}

/// Outcome of resolving a `$` reference: cloned content, so the stack can be
/// mutated afterwards.
enum Resolved {
    Dict(Dictionary),
    Entry(Entry),
}

struct Parser<'i> {
    name: &'i str,
    tokens: Vec<Token>,
    lines: Vec<u32>,
    pos: usize,
    /// Dictionaries under construction, root first. References resolve
    /// against this chain; entries land in the last element.
    stack: Vec<Dictionary>,
}

impl<'i> Parser<'i> {
    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Takes the next token, leaving a sentinel behind (each token is read
    /// exactly once).
    fn next_token(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let token = std::mem::replace(&mut self.tokens[self.pos], Token::Undefined);
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    /// Line of the token at `pos`, or of the last token at end of input.
    fn line_at(&self, pos: usize) -> u32 {
        match self.lines.get(pos) {
            Some(line) => *line,
            None => self.lines.last().copied().unwrap_or(1),
        }
    }

    fn error(&self, pos: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.name, self.line_at(pos), kind)
    }

    fn top(&mut self) -> &mut Dictionary {
        self.stack.last_mut().expect("parser stack is never empty")
    }

    /// Parses entries into the stack top until end of input (root) or the
    /// closing brace of the block named `block` (nested).
    fn parse_body(&mut self, block: Option<&str>) -> Result<(), ParseError> {
        loop {
            match self.peek_token() {
                None => {
                    return match block {
                        None => Ok(()),
                        Some(keyword) => Err(self.error(
                            self.pos,
                            ParseErrorKind::MissingCloseBrace {
                                keyword: keyword.to_string(),
                            },
                        )),
                    };
                }
                Some(Token::Punct('}')) if block.is_some() => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(Token::Word(_)) | Some(Token::Str(_)) => self.parse_entry()?,
                Some(other) => {
                    let found = format!("{} '{}'", other.type_name(), other);
                    return Err(self.error(self.pos, ParseErrorKind::UnexpectedToken { found }));
                }
            }
        }
    }

    fn parse_entry(&mut self) -> Result<(), ParseError> {
        let kw_pos = self.pos;
        let (keyword, pattern) = match self.next_token() {
            Some(Token::Word(w)) => (w, false),
            Some(Token::Str(s)) => (s, true),
            _ => unreachable!("caller peeked a word or string"),
        };

        // `$reference ;` substitutes a foreign entry (or whole dictionary)
        // under this one's roof.
        if !pattern
            && keyword.starts_with('$')
            && matches!(self.peek_token(), Some(Token::Punct(';')))
        {
            self.pos += 1;
            return self.substitute_keyword(keyword, kw_pos);
        }

        if matches!(self.peek_token(), Some(Token::Punct('{'))) {
            self.pos += 1;
            let child_name = format!("{}/{}", self.top().name(), keyword);
            self.stack.push(Dictionary::new(child_name));
            self.parse_body(Some(&keyword))?;
            let child = self.stack.pop().expect("child just pushed");
            let entry = Entry {
                keyword,
                pattern,
                value: EntryValue::Dict(child),
            };
            return self.add_parsed(entry, kw_pos);
        }

        let value = self.collect_value(&keyword, kw_pos)?;
        let stream_name = format!("{}/{}", self.top().name(), keyword);
        let entry = Entry {
            keyword,
            pattern,
            value: EntryValue::Stream(TokenStream::from_tokens(stream_name, value)),
        };
        self.add_parsed(entry, kw_pos)
    }

    /// Installs a parsed entry, overwriting any earlier one of the same
    /// keyword. Pattern compilation failures become parse errors at the
    /// keyword's line.
    fn add_parsed(&mut self, entry: Entry, kw_pos: usize) -> Result<(), ParseError> {
        let keyword = entry.keyword.clone();
        match self.top().set(entry) {
            Ok(()) => Ok(()),
            Err(LookupError {
                kind: LookupErrorKind::BadValue { detail },
                ..
            }) => Err(self.error(
                kw_pos,
                ParseErrorKind::BadPattern {
                    pattern: keyword,
                    detail,
                },
            )),
            Err(e) => Err(self.error(
                kw_pos,
                ParseErrorKind::BadPattern {
                    pattern: keyword,
                    detail: e.to_string(),
                },
            )),
        }
    }

    /// Collects value tokens up to the terminating `;`, tracking bracket
    /// nesting and expanding `$` references inline.
    fn collect_value(
        &mut self,
        keyword: &str,
        kw_pos: usize,
    ) -> Result<DynList<Token>, ParseError> {
        let mut out: DynList<Token> = DynList::new();
        let mut depth = 0usize;
        loop {
            let tok_pos = self.pos;
            let Some(token) = self.next_token() else {
                return Err(self.error(
                    kw_pos,
                    ParseErrorKind::MissingSemicolon {
                        keyword: keyword.to_string(),
                    },
                ));
            };
            match token {
                Token::Punct(';') if depth == 0 => return Ok(out),
                Token::Punct(c @ ('(' | '[' | '{')) => {
                    depth += 1;
                    out.push(Token::Punct(c));
                }
                Token::Punct(c @ (')' | ']' | '}')) => {
                    if depth == 0 {
                        // A stray closer means the `;` never came.
                        return Err(self.error(
                            tok_pos,
                            ParseErrorKind::MissingSemicolon {
                                keyword: keyword.to_string(),
                            },
                        ));
                    }
                    depth -= 1;
                    out.push(Token::Punct(c));
                }
                Token::Word(w) if w.starts_with('$') => match self.resolve_ref(&w) {
                    Some(Resolved::Entry(entry)) => match entry.as_stream() {
                        Some(s) => out.extend(s.tokens().iter().cloned()),
                        None => out.push(Token::Word(w)),
                    },
                    Some(Resolved::Dict(_)) => {
                        log::warn!(
                            "{}: reference {w} names a dictionary inside a value; kept literal",
                            self.name
                        );
                        out.push(Token::Word(w));
                    }
                    None => {
                        log::warn!("{}: unresolved reference {w}; kept literal", self.name);
                        out.push(Token::Word(w));
                    }
                },
                other => out.push(other),
            }
        }
    }

    /// `$reference ;` in keyword position: a referenced dictionary merges its
    /// entries here; a referenced primitive entry is re-added under its own
    /// keyword. Unresolved references are preserved literally.
    fn substitute_keyword(&mut self, keyword: String, kw_pos: usize) -> Result<(), ParseError> {
        match self.resolve_ref(&keyword) {
            Some(Resolved::Dict(dict)) => {
                let merged: Vec<Entry> = dict.iter().cloned().collect();
                for entry in merged {
                    let entry_keyword = entry.keyword.clone();
                    if let Err(e) = self.top().add_merge(entry) {
                        return Err(self.error(
                            kw_pos,
                            ParseErrorKind::BadPattern {
                                pattern: entry_keyword,
                                detail: e.to_string(),
                            },
                        ));
                    }
                }
                Ok(())
            }
            Some(Resolved::Entry(entry)) => self.add_parsed(entry, kw_pos),
            None => {
                log::warn!(
                    "{}: unresolved reference {keyword}; kept literal",
                    self.name
                );
                let entry = Entry {
                    keyword: keyword.clone(),
                    pattern: false,
                    value: EntryValue::Stream(TokenStream::new(format!(
                        "{}/{keyword}",
                        self.top().name()
                    ))),
                };
                self.add_parsed(entry, kw_pos)
            }
        }
    }

    /// Resolves `$name` / `${name}` against the construction stack, cloning
    /// the hit so the stack can be mutated afterwards.
    fn resolve_ref(&self, refword: &str) -> Option<Resolved> {
        let chain: Vec<&Dictionary> = self.stack.iter().collect();
        let entry = Scope::from_chain(chain).resolve_reference(refword)?;
        Some(match &entry.value {
            EntryValue::Dict(d) => Resolved::Dict(d.clone()),
            EntryValue::Stream(_) => Resolved::Entry(entry.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::api::ParseErrorKind;
    use crate::token::Token;

    #[test]
    fn flat_entries() {
        let d = parse("system", "nCells 100;\ntolerance 1e-6;\nscheme upwind;").unwrap();
        assert_eq!(d.get::<i64>("nCells").unwrap(), 100);
        assert_eq!(d.get::<f64>("tolerance").unwrap(), 1e-6);
        assert_eq!(d.get::<String>("scheme").unwrap(), "upwind");
    }

    #[test]
    fn nested_blocks_carry_path_names() {
        let d = parse("system", "solvers { p { tol 0.1; } }").unwrap();
        let p = d.subdict("solvers").unwrap().subdict("p").unwrap();
        assert_eq!(p.name(), "system/solvers/p");
        assert_eq!(p.get::<f64>("tol").unwrap(), 0.1);
    }

    #[test]
    fn quoted_keywords_become_patterns() {
        let d = parse("system", r#""p.*" { solver PCG; } pFinal { solver PBiCG; }"#).unwrap();
        assert_eq!(d.subdict("pRefined").unwrap().get::<String>("solver").unwrap(), "PCG");
        assert_eq!(d.subdict("pFinal").unwrap().get::<String>("solver").unwrap(), "PBiCG");
    }

    #[test]
    fn value_substitution_resolves_earlier_entries() {
        let d = parse("system", "outer { inner 5; ref $inner; }").unwrap();
        let outer = d.subdict("outer").unwrap();
        assert!(outer
            .stream("ref")
            .unwrap()
            .content_eq(outer.stream("inner").unwrap()));
        assert_eq!(outer.get::<i64>("ref").unwrap(), 5);
    }

    #[test]
    fn substitution_searches_enclosing_levels() {
        let d = parse("system", "base 3;\nsub { copy $base; }").unwrap();
        assert_eq!(d.subdict("sub").unwrap().get::<i64>("copy").unwrap(), 3);
    }

    #[test]
    fn braced_references_take_scoped_paths() {
        let d = parse(
            "system",
            "a { x 1; }\nb { y ${../a/x}; z ${^a.x}; }",
        )
        .unwrap();
        let b = d.subdict("b").unwrap();
        assert_eq!(b.get::<i64>("y").unwrap(), 1);
        assert_eq!(b.get::<i64>("z").unwrap(), 1);
    }

    #[test]
    fn keyword_substitution_merges_a_dictionary() {
        let d = parse(
            "system",
            "defaults { tol 1e-6; iters 10; }\nsolver { $defaults; iters 50; }",
        )
        .unwrap();
        let solver = d.subdict("solver").unwrap();
        assert_eq!(solver.get::<f64>("tol").unwrap(), 1e-6);
        // Later explicit entry overwrites the merged one.
        assert_eq!(solver.get::<i64>("iters").unwrap(), 50);
    }

    #[test]
    fn keyword_substitution_re_adds_a_primitive() {
        let d = parse("system", "n 4;\nblock { $n; }").unwrap();
        assert_eq!(d.subdict("block").unwrap().get::<i64>("n").unwrap(), 4);
    }

    #[test]
    fn unresolved_references_stay_literal() {
        let d = parse("system", "ref $missing;").unwrap();
        let tokens = d.stream("ref").unwrap().tokens().to_vec();
        assert_eq!(tokens, vec![Token::Word("$missing".into())]);
    }

    #[test]
    fn later_duplicate_overwrites() {
        let d = parse("system", "n 1;\nn 2;").unwrap();
        assert_eq!(d.get::<i64>("n").unwrap(), 2);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn values_may_nest_brackets() {
        let d = parse("system", "grading ( (1 2 3) (4 5 6) );").unwrap();
        let v = d.get::<Vec<Vec<i64>>>("grading").unwrap();
        assert_eq!(v, vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn missing_semicolon_is_reported_with_keyword() {
        let err = parse("system", "n 1").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::MissingSemicolon { ref keyword } if keyword == "n"
        ));
    }

    #[test]
    fn missing_close_brace_is_reported() {
        let err = parse("system", "solvers { p { tol 0.1; }").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::MissingCloseBrace { ref keyword } if keyword == "solvers"
        ));
    }

    #[test]
    fn bad_pattern_is_a_parse_error() {
        let err = parse("system", r#""un[closed" 1;"#).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::BadPattern { .. }));
    }

    #[test]
    fn stray_closer_is_rejected() {
        let err = parse("system", "n 1; }").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
    }
}
