//! Lexical token type and the plain-text tokenizer.
//!
//! The tokenizer consumes raw text until end of input; anything that is not
//! whitespace, a comment, punctuation, a quoted string or a number becomes a
//! word. Words are permissive: they may contain dots, slashes and the
//! `$`/`${...}` reference syntax, which survives lexing untouched and is
//! interpreted by the dictionary layer, not here.
//!
//! Failure modes are unterminated constructs only (string, block comment,
//! `${...}`); every error carries the input name and 1-based line.

use memchr::{memchr, memchr_iter, memmem};

use crate::api::{ParseError, ParseErrorKind};
use crate::stdx::DynList;

/// A single lexical unit.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Sentinel returned by failsafe reads; never produced by the tokenizer.
    Undefined,
    /// Structural character: one of `{ } ( ) [ ] ; ,`.
    Punct(char),
    /// Bare identifier-like run, dots and references included.
    Word(String),
    /// Double-quoted string, unescaped.
    Str(String),
    Int(i64),
    Float(f64),
}

impl Token {
    /// The failsafe-read sentinel, by shared reference.
    pub fn undefined() -> &'static Token {
        static UNDEFINED: Token = Token::Undefined;
        &UNDEFINED
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Token::Undefined)
    }

    #[inline]
    pub fn is_word(&self) -> bool {
        matches!(self, Token::Word(_))
    }

    #[inline]
    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Word or string content, for contexts accepting either.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Word(w) => Some(w),
            Token::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Token::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value, with integer tokens promoted.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Token::Float(v) => Some(*v),
            Token::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean value of a switch-like token: `true/false`, `on/off`,
    /// `yes/no`, or the integers 0 and 1.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Token::Word(w) => match w.as_str() {
                "true" | "on" | "yes" => Some(true),
                "false" | "off" | "no" => Some(false),
                _ => None,
            },
            Token::Int(0) => Some(false),
            Token::Int(1) => Some(true),
            _ => None,
        }
    }

    /// Short class name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Token::Undefined => "undefined",
            Token::Punct(_) => "punctuation",
            Token::Word(_) => "word",
            Token::Str(_) => "string",
            Token::Int(_) => "integer",
            Token::Float(_) => "float",
        }
    }
}

impl std::fmt::Display for Token {
    /// Writes the token in its re-lexable source form.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Undefined => write!(f, "<undefined>"),
            Token::Punct(c) => write!(f, "{c}"),
            Token::Word(w) => write!(f, "{w}"),
            Token::Str(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        _ => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Token::Int(v) => write!(f, "{v}"),
            // An integral float keeps its decimal point so it re-lexes as a
            // float, not an integer.
            Token::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
        }
    }
}

const PUNCT: &[u8] = b"{}()[];,";

#[inline]
fn is_punct_byte(b: u8) -> bool {
    PUNCT.contains(&b)
}

/// True when `b` ends the current word.
#[inline]
fn ends_word(bytes: &[u8], i: usize) -> bool {
    let b = bytes[i];
    b.is_ascii_whitespace()
        || is_punct_byte(b)
        || b == b'"'
        || (b == b'/' && matches!(bytes.get(i + 1), Some(&b'/') | Some(&b'*')))
}

/// Classifies a completed word chunk: integer, float, or plain word.
fn classify(chunk: &str) -> Token {
    if let Ok(v) = chunk.parse::<i64>() {
        return Token::Int(v);
    }
    // Reject word-like inputs that f64::parse would accept.
    if chunk.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
        if let Ok(v) = chunk.parse::<f64>() {
            if v.is_finite() {
                return Token::Float(v);
            }
        }
    }
    Token::Word(chunk.to_string())
}

/// Tokenizes `input`, also reporting the 1-based line of each token.
///
/// Stops at end of input. The only errors are unterminated constructs; a
/// malformed number is a word, not an error.
pub fn tokenize_with_lines(
    name: &str,
    input: &str,
) -> Result<(DynList<Token>, Vec<u32>), ParseError> {
    let bytes = input.as_bytes();
    let mut tokens: DynList<Token> = DynList::new();
    let mut lines: Vec<u32> = Vec::new();
    let mut pos = 0usize;
    let mut line = 1u32;

    while pos < bytes.len() {
        let b = bytes[pos];

        if b == b'\n' {
            line += 1;
            pos += 1;
            continue;
        }
        if b.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        // Line comment: skip to end of line.
        if b == b'/' && bytes.get(pos + 1) == Some(&b'/') {
            match memchr(b'\n', &bytes[pos..]) {
                Some(off) => {
                    pos += off + 1;
                    line += 1;
                }
                None => pos = bytes.len(),
            }
            continue;
        }

        // Block comment: skip to the closing marker, counting lines.
        if b == b'/' && bytes.get(pos + 1) == Some(&b'*') {
            let body = &bytes[pos + 2..];
            match memmem::find(body, b"*/") {
                Some(off) => {
                    line += memchr_iter(b'\n', &body[..off]).count() as u32;
                    pos += 2 + off + 2;
                }
                None => {
                    return Err(ParseError::new(name, line, ParseErrorKind::UnterminatedComment));
                }
            }
            continue;
        }

        if is_punct_byte(b) {
            lines.push(line);
            tokens.push(Token::Punct(b as char));
            pos += 1;
            continue;
        }

        // Quoted string with escapes.
        if b == b'"' {
            let start_line = line;
            let mut out = String::new();
            let mut i = pos + 1;
            let mut terminated = false;
            while i < bytes.len() {
                let c = bytes[i];
                match c {
                    b'"' => {
                        i += 1;
                        terminated = true;
                        break;
                    }
                    b'\\' => match bytes.get(i + 1) {
                        Some(&b'"') => {
                            out.push('"');
                            i += 2;
                        }
                        Some(&b'\\') => {
                            out.push('\\');
                            i += 2;
                        }
                        Some(&b'n') => {
                            out.push('\n');
                            i += 2;
                        }
                        Some(&b't') => {
                            out.push('\t');
                            i += 2;
                        }
                        Some(&b'r') => {
                            out.push('\r');
                            i += 2;
                        }
                        // Unknown escape: keep the backslash, reprocess the
                        // following character normally.
                        Some(_) => {
                            out.push('\\');
                            i += 1;
                        }
                        None => break,
                    },
                    b'\n' => {
                        line += 1;
                        out.push('\n');
                        i += 1;
                    }
                    _ if c < 0x80 => {
                        out.push(c as char);
                        i += 1;
                    }
                    _ => {
                        // Multi-byte UTF-8: take the whole char.
                        let ch = input[i..].chars().next().expect("valid utf-8");
                        out.push(ch);
                        i += ch.len_utf8();
                    }
                }
            }
            if !terminated {
                return Err(ParseError::new(
                    name,
                    start_line,
                    ParseErrorKind::UnterminatedString,
                ));
            }
            lines.push(start_line);
            tokens.push(Token::Str(out));
            pos = i;
            continue;
        }

        // `${...}` reference: one word up to the matching brace.
        if b == b'$' && bytes.get(pos + 1) == Some(&b'{') {
            let start_line = line;
            let mut depth = 0usize;
            let mut i = pos + 1;
            let mut end = None;
            while i < bytes.len() {
                match bytes[i] {
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(i);
                            break;
                        }
                    }
                    b'\n' => line += 1,
                    _ => {}
                }
                i += 1;
            }
            let Some(end) = end else {
                return Err(ParseError::new(
                    name,
                    start_line,
                    ParseErrorKind::UnterminatedReference,
                ));
            };
            lines.push(start_line);
            tokens.push(Token::Word(input[pos..=end].to_string()));
            pos = end + 1;
            continue;
        }

        // Word / number chunk.
        let start = pos;
        let mut i = pos;
        while i < bytes.len() && !ends_word(bytes, i) {
            i += 1;
        }
        debug_assert!(i > start);
        lines.push(line);
        tokens.push(classify(&input[start..i]));
        pos = i;
    }

    debug_assert_eq!(tokens.len(), lines.len());
    Ok((tokens, lines))
}

/// Tokenizes `input`, discarding line information.
pub fn tokenize(name: &str, input: &str) -> Result<DynList<Token>, ParseError> {
    tokenize_with_lines(name, input).map(|(tokens, _)| tokens)
}
