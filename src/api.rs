//! Public shared types: search policy and the error taxonomy.
//!
//! Recoverable conditions (lookup miss, malformed input, typed-read mismatch)
//! are `Result` errors carrying maximal context so the message is
//! self-diagnosing: dictionary name, keyword, stream name, line number.
//! Structural misuse (out-of-range index, null-slot deref, stale node id) is
//! a panic at the point of detection, never a `Result`.

use std::fmt;

// --------------------------
// Search policy
// --------------------------

/// Match options for dictionary lookup.
///
/// `patterns` enables the regex-keyword fallback when no exact key matches;
/// `recursive` enables ascent into enclosing dictionaries when the local
/// level has no match at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchPolicy {
    pub patterns: bool,
    pub recursive: bool,
}

impl SearchPolicy {
    /// Exact keys only, this level only.
    pub const LOCAL_EXACT: Self = Self {
        patterns: false,
        recursive: false,
    };

    /// Exact keys then patterns, this level only. The default.
    pub const LOCAL: Self = Self {
        patterns: true,
        recursive: false,
    };

    /// Exact keys then patterns, ascending through enclosing levels.
    pub const RECURSIVE: Self = Self {
        patterns: true,
        recursive: true,
    };

    /// Exact keys only, ascending through enclosing levels.
    pub const RECURSIVE_EXACT: Self = Self {
        patterns: false,
        recursive: true,
    };
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self::LOCAL
    }
}

// --------------------------
// Parse errors
// --------------------------

/// Failure while tokenizing or parsing dictionary text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Diagnostic name of the input (file name, stream name).
    pub stream: String,
    /// 1-based line where the failure was detected.
    pub line: u32,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Input ended inside a double-quoted string.
    UnterminatedString,
    /// Input ended inside a `/* */` comment.
    UnterminatedComment,
    /// Input ended inside a `${...}` reference.
    UnterminatedReference,
    /// A quoted keyword failed to compile as a regular expression.
    BadPattern { pattern: String, detail: String },
    /// Entry value ran to end of input without a terminating `;`.
    MissingSemicolon { keyword: String },
    /// A `{` block ran to end of input without its `}`.
    MissingCloseBrace { keyword: String },
    /// A token that cannot start an entry appeared in keyword position.
    UnexpectedToken { found: String },
}

impl ParseError {
    pub fn new(stream: impl Into<String>, line: u32, kind: ParseErrorKind) -> Self {
        Self {
            stream: stream.into(),
            line,
            kind,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: ", self.stream, self.line)?;
        match &self.kind {
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ParseErrorKind::UnterminatedComment => write!(f, "unterminated block comment"),
            ParseErrorKind::UnterminatedReference => write!(f, "unterminated ${{...}} reference"),
            ParseErrorKind::BadPattern { pattern, detail } => {
                write!(f, "invalid pattern keyword \"{pattern}\": {detail}")
            }
            ParseErrorKind::MissingSemicolon { keyword } => {
                write!(f, "entry '{keyword}' is missing its terminating ';'")
            }
            ParseErrorKind::MissingCloseBrace { keyword } => {
                write!(f, "block '{keyword}' is missing its closing '}}'")
            }
            ParseErrorKind::UnexpectedToken { found } => {
                write!(f, "unexpected token {found} in keyword position")
            }
        }
    }
}

impl std::error::Error for ParseError {}

// --------------------------
// Token stream errors
// --------------------------

/// Failure of a strict token-stream read. The failsafe `peek` family never
/// produces this; it returns the undefined-token sentinel instead.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenError {
    /// Diagnostic name of the stream.
    pub stream: String,
    pub kind: TokenErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenErrorKind {
    /// Read past the end of the stream.
    Exhausted,
    /// The current token does not convert to the requested type.
    Mismatch {
        expected: &'static str,
        found: String,
    },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenErrorKind::Exhausted => {
                write!(f, "token stream '{}' exhausted", self.stream)
            }
            TokenErrorKind::Mismatch { expected, found } => {
                write!(
                    f,
                    "token stream '{}': expected {expected}, found {found}",
                    self.stream
                )
            }
        }
    }
}

impl std::error::Error for TokenError {}

// --------------------------
// Dictionary lookup errors
// --------------------------

/// Failure of a dictionary operation, naming the dictionary and keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupError {
    /// Name of the dictionary the operation ran against.
    pub dictionary: String,
    pub keyword: String,
    pub kind: LookupErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupErrorKind {
    /// No entry matched the keyword under the given policy.
    NotFound,
    /// The entry exists but holds a sub-dictionary, not a value stream.
    NotAStream,
    /// The entry exists but holds a value stream, not a sub-dictionary.
    NotADictionary,
    /// `add` refused to overwrite an existing entry.
    AlreadyPresent,
    /// The entry's tokens did not convert to the requested type.
    BadValue { detail: String },
}

impl LookupError {
    pub fn new(
        dictionary: impl Into<String>,
        keyword: impl Into<String>,
        kind: LookupErrorKind,
    ) -> Self {
        Self {
            dictionary: dictionary.into(),
            keyword: keyword.into(),
            kind,
        }
    }

    pub fn not_found(dictionary: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self::new(dictionary, keyword, LookupErrorKind::NotFound)
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LookupErrorKind::NotFound => write!(
                f,
                "keyword '{}' not found in dictionary '{}'",
                self.keyword, self.dictionary
            ),
            LookupErrorKind::NotAStream => write!(
                f,
                "keyword '{}' in dictionary '{}' is a sub-dictionary, not a value",
                self.keyword, self.dictionary
            ),
            LookupErrorKind::NotADictionary => write!(
                f,
                "keyword '{}' in dictionary '{}' is a value, not a sub-dictionary",
                self.keyword, self.dictionary
            ),
            LookupErrorKind::AlreadyPresent => write!(
                f,
                "keyword '{}' already present in dictionary '{}'",
                self.keyword, self.dictionary
            ),
            LookupErrorKind::BadValue { detail } => write!(
                f,
                "keyword '{}' in dictionary '{}': {detail}",
                self.keyword, self.dictionary
            ),
        }
    }
}

impl std::error::Error for LookupError {}
