use std::{fmt, ops::Range};

#[derive(Copy, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    pub fn eof_for(src: &str) -> Token {
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0))
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap())
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    /// Returns a span covering from the start of `self` up to the end of
    /// `other`.
    pub fn to(self, other: Span) -> Span {
        let hi = other.lo + other.len as usize;
        Span::new_of_bounds(self.lo..hi)
    }

    pub fn substr(self, src: &str) -> &str {
        let hi = self.lo + self.len as usize;
        &src[self.lo..hi]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = lo + self.len as usize;
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

// Token kinds carry no payload; literal and identifier text is recovered
// from the source through the token's span (see `lexer::extract`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    If,
    Else,
    While,
    Var,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBrace,
    RBrace,
    /// `=`, the assignment operator.
    Equals,
    Semicolon,

    Identifier,
    Number,

    Newline,
    Whitespace,
    Eof,
    ErrorUnexpectedChar,
}

impl TokenKind {
    /// Trivia tokens are produced by the lexer but never consumed by any
    /// grammar production; the parser skips over them.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Newline)
    }

    pub fn is_error(self) -> bool {
        matches!(self, TokenKind::ErrorUnexpectedChar)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "var" => TokenKind::Var,
};
