//! Lazy tokenizer for single-line Newick trees.
//!
//! # Overview
//! The tokenizer never builds a tree. It walks the line once and yields the
//! structural tokens the bipartition extractor needs:
//!
//! ```text
//! (A:0.1,(B:0.2,C:0.3)0.95:0.4);
//! → Open Name(A) Open Name(B) Name(C) Close Close End
//! ```
//!
//! Branch lengths (`:` up to the next structural character) and internal
//! node labels / support values (the text right after `)`) are dropped by
//! the default stripped variant. [`Tokenizer::annotated`] yields them as
//! [`Token::Length`] and [`Token::Label`] instead.
//!
//! Square-bracket comments such as BEAST `[&rate=0.1,height=2]` are opaque
//! wherever they appear: a `,` or `)` inside a comment does not end the
//! field it is attached to.

use std::borrow::Cow;
use std::fmt;

/// One structural token of a Newick line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `(`
    Open,
    /// `)`
    Close,
    /// `;`
    End,
    /// A leaf name, trimmed of surrounding whitespace.
    Name(Cow<'a, str>),
    /// Internal node label or support value (annotated variant only).
    Label(Cow<'a, str>),
    /// Branch length text after `:` (annotated variant only).
    Length(Cow<'a, str>),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => write!(f, "'('"),
            Token::Close => write!(f, "')'"),
            Token::End => write!(f, "';'"),
            Token::Name(s) => write!(f, "name '{s}'"),
            Token::Label(s) => write!(f, "label '{s}'"),
            Token::Length(s) => write!(f, "branch length '{s}'"),
        }
    }
}

/// Characters that end a name or label.
const NAME_STOP: &[u8] = b",:;()";
/// Characters that end a branch length.
const LENGTH_STOP: &[u8] = b",;()";

/// Iterator over the [`Token`]s of one tree line.
///
/// End of stream is signalled by exhaustion. Unbalanced parentheses are not
/// rejected here; callers see whatever tokens the line contains.
///
/// # Example
/// ```
/// # use fast_mrp::tokenizer::{Token, Tokenizer};
/// let tokens: Vec<_> = Tokenizer::new("(A:1,B)x;").collect();
/// assert_eq!(
///     tokens,
///     [Token::Open, Token::Name("A".into()), Token::Name("B".into()), Token::Close, Token::End]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    annotated: bool,
    pending: Option<Token<'a>>,
}

impl<'a> Tokenizer<'a> {
    /// Stripped tokenizer: lengths and internal labels are discarded.
    pub fn new(input: &'a str) -> Self {
        Tokenizer { input, pos: 0, annotated: false, pending: None }
    }

    /// Tokenizer that also yields [`Token::Label`] and [`Token::Length`].
    pub fn annotated(input: &'a str) -> Self {
        Tokenizer { input, pos: 0, annotated: true, pending: None }
    }

    /// Scan a field starting at `self.pos` until one of `stop`.
    ///
    /// Comments inside the field are dropped and the text around them is
    /// joined, so `A[x]B` reads as `AB`. The result is trimmed and only
    /// allocates when a comment split the field.
    fn field(&mut self, stop: &[u8]) -> Cow<'a, str> {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut start = self.pos;
        let mut joined: Option<String> = None;
        while self.pos < bytes.len() && !stop.contains(&bytes[self.pos]) {
            if bytes[self.pos] == b'[' {
                joined.get_or_insert_with(String::new).push_str(&input[start..self.pos]);
                self.skip_comment();
                start = self.pos;
            } else {
                self.pos += 1;
            }
        }
        match joined {
            None => Cow::Borrowed(input[start..self.pos].trim()),
            Some(mut text) => {
                text.push_str(&input[start..self.pos]);
                Cow::Owned(text.trim().to_string())
            }
        }
    }

    /// Skip a `[...]` comment. An unterminated comment runs to end of line.
    fn skip_comment(&mut self) {
        match self.input[self.pos..].find(']') {
            Some(off) => self.pos += off + 1,
            None => self.pos = self.input.len(),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(tok) = self.pending.take() {
            return Some(tok);
        }
        let input = self.input;
        let bytes = input.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'(' => {
                    self.pos += 1;
                    return Some(Token::Open);
                }
                b')' => {
                    self.pos += 1;
                    let label = self.field(NAME_STOP);
                    if self.annotated && !label.is_empty() {
                        self.pending = Some(Token::Label(label));
                    }
                    return Some(Token::Close);
                }
                b';' => {
                    self.pos += 1;
                    return Some(Token::End);
                }
                b':' => {
                    self.pos += 1;
                    let length = self.field(LENGTH_STOP);
                    if self.annotated && !length.is_empty() {
                        return Some(Token::Length(length));
                    }
                }
                b',' => self.pos += 1,
                b'[' => self.skip_comment(),
                _ => {
                    let name = self.field(NAME_STOP);
                    if !name.is_empty() {
                        return Some(Token::Name(name));
                    }
                }
            }
        }
        None
    }
}
