use std::{iter::Peekable, num::ParseIntError};

use crate::token::{Span, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Lexes the provided string, producing the tokens into the provided buffer.
pub fn lex(src: &str, tokens: &mut Vec<Token>) {
    Lexer::new(src, tokens).lex();
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens);
    tokens
}

struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let next = self.scan_token_kind();
            let is_eof = matches!(next, TokenKind::Eof);
            self.produce(next);
            if is_eof {
                break;
            }
        }
    }

    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        match self.mark_advance() {
            '\0' => Eof,
            '+' => Plus,
            '-' => Minus,
            '*' => Star,
            '/' => Slash,
            '%' => Percent,
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '=' => Equals,
            ';' => Semicolon,
            '\n' => Newline,
            c if c.is_ascii_alphabetic() => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_whitespace() => self.whitespace(),
            _ => ErrorUnexpectedChar,
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_';
        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        match KEYWORDS.get(self.substr()).copied() {
            Some(keyword) => keyword,
            None => TokenKind::Identifier,
        }
    }

    fn number(&mut self) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        TokenKind::Number
    }

    // A line break is its own token kind, so whitespace runs stop at it.
    fn whitespace(&mut self) -> TokenKind {
        while self.peek().is_ascii_whitespace() && self.peek() != '\n' {
            self.advance();
        }
        TokenKind::Whitespace
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next character and advances the iterator.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.span()));
    }
}

pub mod extract {
    use super::*;

    pub fn int(token: Token, src: &str) -> Result<i32, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::Number);
        token.span().substr(src).parse()
    }

    pub fn ident<'src>(token: Token, src: &'src str) -> &'src str {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.span().substr(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tests_with_span() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "+-*/%" => [
                (Plus, 0..1),
                (Minus, 1..2),
                (Star, 2..3),
                (Slash, 3..4),
                (Percent, 4..5),
                (Eof, 5..5),
            ],
            "(1+20)*3" => [
                (LParen, 0..1),
                (Number, 1..2),
                (Plus, 2..3),
                (Number, 3..5),
                (RParen, 5..6),
                (Star, 6..7),
                (Number, 7..8),
                (Eof, 8..8),
            ],
            "if(x){1}else{2}" => [
                (If, 0..2),
                (LParen, 2..3),
                (Identifier, 3..4),
                (RParen, 4..5),
                (LBrace, 5..6),
                (Number, 6..7),
                (RBrace, 7..8),
                (Else, 8..12),
                (LBrace, 12..13),
                (Number, 13..14),
                (RBrace, 14..15),
                (Eof, 15..15),
            ],
            "var total; total = 0" => [
                (Var, 0..3),
                (Whitespace, 3..4),
                (Identifier, 4..9),
                (Semicolon, 9..10),
                (Whitespace, 10..11),
                (Identifier, 11..16),
                (Whitespace, 16..17),
                (Equals, 17..18),
                (Whitespace, 18..19),
                (Number, 19..20),
                (Eof, 20..20),
            ],
            // Keyword prefixes must still lex as plain identifiers.
            "iffy whiles vars elsewhere" => [
                (Identifier, 0..4),
                (Whitespace, 4..5),
                (Identifier, 5..11),
                (Whitespace, 11..12),
                (Identifier, 12..16),
                (Whitespace, 16..17),
                (Identifier, 17..26),
                (Eof, 26..26),
            ],
            "1 \t 2\n3" => [
                (Number, 0..1),
                (Whitespace, 1..4),
                (Number, 4..5),
                (Newline, 5..6),
                (Number, 6..7),
                (Eof, 7..7),
            ],
            "while (a_1) { 0 }" => [
                (While, 0..5),
                (Whitespace, 5..6),
                (LParen, 6..7),
                (Identifier, 7..10),
                (RParen, 10..11),
                (Whitespace, 11..12),
                (LBrace, 12..13),
                (Whitespace, 13..14),
                (Number, 14..15),
                (Whitespace, 15..16),
                (RBrace, 16..17),
                (Eof, 17..17),
            ],
            "1 $ 2" => [
                (Number, 0..1),
                (Whitespace, 1..2),
                (ErrorUnexpectedChar, 2..3),
                (Whitespace, 3..4),
                (Number, 4..5),
                (Eof, 5..5),
            ],
        });

        for (input, tokens) in cases {
            let lexed = lex_in_new(input);
            assert_eq!(lexed, tokens.as_slice());
        }
    }

    #[test]
    fn test_extract() {
        let src = "counter = 1024";
        let tokens = lex_in_new(src);
        assert_eq!(extract::ident(tokens[0], src), "counter");
        assert_eq!(extract::int(tokens[4], src), Ok(1024));
    }

    #[test]
    fn test_extract_int_out_of_bounds() {
        let src = "99999999999999999999";
        let tokens = lex_in_new(src);
        assert!(extract::int(tokens[0], src).is_err());
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![
                    $(Token::new($kind, Span::new_of_bounds($range.start..$range.end))),*
                ],
            )),*]
        }};
    }
    use cases;
}
