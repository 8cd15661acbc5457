use std::fmt;

use crate::{
    ast::{Ast, AstKind, BinOp, Ident},
    lexer::{self, extract},
    token::{Spanned, Token, TokenKind},
    util::intern::NameInterner,
};

type Result<T> = std::result::Result<T, Spanned<Error>>;

/// Parses a whole program: a semicolon-separated statement list.
///
/// The first unexpected token aborts the parse; there is no recovery and no
/// partial AST. The caller decides what to do with the failure (the driver
/// exits nonzero).
pub fn parse_program(
    src: &str,
    tokens: &mut Vec<Token>,
    interner: &mut NameInterner,
) -> Result<Ast> {
    let mut p = Parser::new(src, tokens, interner);
    if p.is(TokenKind::Eof) {
        return Err(p.peek().span().wrap(Error::EmptyProgram));
    }
    let ast = p.parse_stmt_list()?;
    p.consume(TokenKind::Eof)?;
    Ok(ast)
}

struct Parser<'src, 'tok, 'names> {
    src: &'src str,
    tokens: &'tok mut Vec<Token>,
    interner: &'names mut NameInterner,
    cursor: usize,
}

impl Parser<'_, '_, '_> {
    fn parse_stmt_list(&mut self) -> Result<Ast> {
        let stmt = self.parse_statement()?;
        let next = if self.take(TokenKind::Semicolon) {
            Some(Box::new(self.parse_stmt_list()?))
        } else {
            None
        };
        let span = match &next {
            Some(next) => stmt.span.to(next.span),
            None => stmt.span,
        };
        Ok(Ast {
            kind: AstKind::Seq {
                stmt: Box::new(stmt),
                next,
            },
            span,
        })
    }

    /// Dispatches on the lookahead token alone; anything which cannot start
    /// a statement is fatal.
    fn parse_statement(&mut self) -> Result<Ast> {
        match self.peek().kind {
            TokenKind::Var => self.parse_declare(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Number | TokenKind::Identifier | TokenKind::LParen => self.parse_add_sub(),
            TokenKind::ErrorUnexpectedChar => {
                Err(self.peek().span().wrap(Error::UnexpectedChar))
            }
            other => Err(self
                .peek()
                .span()
                .wrap(Error::UnexpectedTokenInStatement { token: other })),
        }
    }

    fn parse_declare(&mut self) -> Result<Ast> {
        let var = self.consume(TokenKind::Var)?;
        let ident = self.parse_ident()?;
        Ok(Ast {
            kind: AstKind::Declare(ident),
            span: var.span().to(ident.span),
        })
    }

    fn parse_if(&mut self) -> Result<Ast> {
        let start = self.consume(TokenKind::If)?;
        self.consume(TokenKind::LParen)?;
        let cond = self.parse_add_sub()?;
        self.consume(TokenKind::RParen)?;

        self.consume(TokenKind::LBrace)?;
        let then_arm = self.parse_add_sub()?;
        let then_end = self.consume(TokenKind::RBrace)?;

        let (else_arm, end_span) = if self.take(TokenKind::Else) {
            self.consume(TokenKind::LBrace)?;
            let else_arm = self.parse_add_sub()?;
            let end = self.consume(TokenKind::RBrace)?;
            (else_arm, end.span())
        } else {
            // A missing else arm yields the implicit zero, making every
            // conditional usable as an expression.
            let implicit = Ast {
                kind: AstKind::Number(0),
                span: then_end.span(),
            };
            (implicit, then_end.span())
        };

        Ok(Ast {
            kind: AstKind::If {
                cond: Box::new(cond),
                then_arm: Box::new(then_arm),
                else_arm: Box::new(else_arm),
            },
            span: start.span().to(end_span),
        })
    }

    fn parse_while(&mut self) -> Result<Ast> {
        let start = self.consume(TokenKind::While)?;
        self.consume(TokenKind::LParen)?;
        let cond = self.parse_add_sub()?;
        self.consume(TokenKind::RParen)?;

        self.consume(TokenKind::LBrace)?;
        let body = self.parse_stmt_list()?;
        let end = self.consume(TokenKind::RBrace)?;

        Ok(Ast {
            kind: AstKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            span: start.span().to(end.span()),
        })
    }

    /// `add_sub ::= mul_div_rem (('+' | '-') mul_div_rem)*`
    ///
    /// Left associativity falls out of the iterative accumulation: each
    /// operator folds the accumulator into the left operand of a new node.
    fn parse_add_sub(&mut self) -> Result<Ast> {
        let mut acc = self.parse_mul_div_rem()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul_div_rem()?;
            acc = binary(op, acc, rhs);
        }
        Ok(acc)
    }

    /// `mul_div_rem ::= term (('*' | '/' | '%') term)*`
    fn parse_mul_div_rem(&mut self) -> Result<Ast> {
        let mut acc = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            acc = binary(op, acc, rhs);
        }
        Ok(acc)
    }

    /// `term ::= NUMBER | ID ['=' add_sub] | '(' add_sub ')'`
    fn parse_term(&mut self) -> Result<Ast> {
        let token = self.peek();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let Ok(value) = extract::int(token, self.src) else {
                    return Err(token.span().wrap(Error::ParseInt));
                };
                Ok(Ast {
                    kind: AstKind::Number(value),
                    span: token.span(),
                })
            }
            TokenKind::Identifier => {
                let target = self.parse_ident()?;
                if self.take(TokenKind::Equals) {
                    let value = self.parse_add_sub()?;
                    let span = target.span.to(value.span);
                    Ok(Ast {
                        kind: AstKind::Assign {
                            target,
                            value: Box::new(value),
                        },
                        span,
                    })
                } else {
                    Ok(Ast {
                        kind: AstKind::Read(target),
                        span: target.span,
                    })
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_add_sub()?;
                self.consume(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::ErrorUnexpectedChar => Err(token.span().wrap(Error::UnexpectedChar)),
            other => Err(token
                .span()
                .wrap(Error::UnexpectedTokenInExpr { token: other })),
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: self.interner.intern(extract::ident(token, self.src)),
            span: token.span(),
        })
    }
}

impl Parser<'_, '_, '_> {
    fn new<'src, 'tok, 'names>(
        src: &'src str,
        tokens: &'tok mut Vec<Token>,
        interner: &'names mut NameInterner,
    ) -> Parser<'src, 'tok, 'names> {
        assert!(tokens.is_empty());
        lexer::lex(src, tokens);
        let mut p = Parser {
            src,
            tokens,
            interner,
            cursor: 0,
        };
        p.setup();
        p
    }

    /// Setups the parser, skipping any leading trivia.
    fn setup(&mut self) {
        while self.peek().kind.is_trivia() {
            self.cursor += 1;
        }
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => Token::eof_for(self.src),
        }
    }

    /// Returns the current token and advances past it. Skips any trivia.
    fn advance(&mut self) -> Token {
        let c = self.peek();
        while {
            self.cursor += 1;
            self.peek().kind.is_trivia()
        } {}
        c
    }

    /// Checks whether the current token matches the given kind.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided kind, returning
    /// true. If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances past the current token if it matches the provided kind.
    /// A mismatch is a fatal parse error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if c.kind.is_error() {
            return Err(c.span().wrap(Error::UnexpectedChar));
        }
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            Err(c.span().wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }))
        }
    }
}

fn binary(op: BinOp, lhs: Ast, rhs: Ast) -> Ast {
    let span = lhs.span.to(rhs.span);
    Ast {
        kind: AstKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedTokenInExpr {
        token: TokenKind,
    },
    UnexpectedTokenInStatement {
        token: TokenKind,
    },
    ParseInt,
    UnexpectedChar,
    EmptyProgram,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            Unexpected { actual, expected } => {
                write!(f, "expected token {expected:?}, but got {actual:?}")
            }
            UnexpectedTokenInExpr { token } => {
                write!(f, "unexpected token {token:?} in expression")
            }
            UnexpectedTokenInStatement { token } => {
                write!(f, "unexpected token {token:?} in statement")
            }
            ParseInt => write!(f, "parse int error, out of bounds"),
            UnexpectedChar => write!(f, "unexpected character"),
            EmptyProgram => write!(f, "empty program"),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::util::test_utils::{parse_program_err, parse_program_tree};

    #[track_caller]
    fn assert_tree(src: &str, expected: &str) {
        assert_eq!(parse_program_tree(src).trim(), expected.trim());
    }

    #[track_caller]
    fn assert_error(src: &str, expected: &str) {
        assert_eq!(parse_program_err(src), expected);
    }

    #[test]
    fn test_number_literal() {
        assert_tree(
            "42",
            indoc! {"
                seq (0..2)
                  number 42 (0..2)
            "},
        );
    }

    #[test]
    fn test_precedence_mul_over_add() {
        assert_tree(
            "2+3*4",
            indoc! {"
                seq (0..5)
                  binary Add (0..5)
                    number 2 (0..1)
                    binary Mul (2..5)
                      number 3 (2..3)
                      number 4 (4..5)
            "},
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        assert_tree(
            "(2+3)*4",
            indoc! {"
                seq (1..7)
                  binary Mul (1..7)
                    binary Add (1..4)
                      number 2 (1..2)
                      number 3 (3..4)
                    number 4 (6..7)
            "},
        );
    }

    #[test]
    fn test_left_associative_sub() {
        // (10 - 3) - 2, never 10 - (3 - 2).
        assert_tree(
            "10-3-2",
            indoc! {"
                seq (0..6)
                  binary Sub (0..6)
                    binary Sub (0..4)
                      number 10 (0..2)
                      number 3 (3..4)
                    number 2 (5..6)
            "},
        );
    }

    #[test]
    fn test_left_associative_div_rem() {
        assert_tree(
            "100/5%3",
            indoc! {"
                seq (0..7)
                  binary Rem (0..7)
                    binary Div (0..5)
                      number 100 (0..3)
                      number 5 (4..5)
                    number 3 (6..7)
            "},
        );
    }

    #[test]
    fn test_statement_chain_is_right_leaning() {
        assert_tree(
            "1;2;3",
            indoc! {"
                seq (0..5)
                  number 1 (0..1)
                  seq (2..5)
                    number 2 (2..3)
                    seq (4..5)
                      number 3 (4..5)
            "},
        );
    }

    #[test]
    fn test_declare_and_assign() {
        assert_tree(
            "var x; x = 1+2",
            indoc! {"
                seq (0..14)
                  declare x (0..5)
                  seq (7..14)
                    assign x (7..14)
                      binary Add (11..14)
                        number 1 (11..12)
                        number 2 (13..14)
            "},
        );
    }

    #[test]
    fn test_read_in_expression() {
        assert_tree(
            "x*2",
            indoc! {"
                seq (0..3)
                  binary Mul (0..3)
                    read x (0..1)
                    number 2 (2..3)
            "},
        );
    }

    #[test]
    fn test_if_with_else() {
        assert_tree(
            "if (1) {5} else {9}",
            indoc! {"
                seq (0..19)
                  if (0..19)
                    number 1 (4..5)
                    number 5 (8..9)
                    number 9 (17..18)
            "},
        );
    }

    #[test]
    fn test_if_without_else_defaults_to_zero() {
        assert_tree(
            "if (0) {5}",
            indoc! {"
                seq (0..10)
                  if (0..10)
                    number 0 (4..5)
                    number 5 (8..9)
                    number 0 (9..10)
            "},
        );
    }

    #[test]
    fn test_while_with_statement_body() {
        assert_tree(
            "while (x) { x = x - 1; 0 }",
            indoc! {"
                seq (0..26)
                  while (0..26)
                    read x (7..8)
                    seq (12..24)
                      assign x (12..21)
                        binary Sub (16..21)
                          read x (16..17)
                          number 1 (20..21)
                      seq (23..24)
                        number 0 (23..24)
            "},
        );
    }

    #[test]
    fn test_newlines_are_trivia() {
        assert_tree(
            "1 +\n2",
            indoc! {"
                seq (0..5)
                  binary Add (0..5)
                    number 1 (0..1)
                    number 2 (4..5)
            "},
        );
    }

    #[test]
    fn test_error_lone_delimiter() {
        assert_error(")", "0..1: unexpected token RParen in statement");
    }

    #[test]
    fn test_error_unmatched_paren() {
        assert_error("(1+2", "4..4: expected token RParen, but got Eof");
    }

    #[test]
    fn test_error_missing_if_braces() {
        assert_error("if (1) 5", "7..8: expected token LBrace, but got Number");
    }

    #[test]
    fn test_error_dangling_operator() {
        assert_error("1+", "2..2: unexpected token Eof in expression");
    }

    #[test]
    fn test_error_trailing_semicolon() {
        assert_error("1;", "2..2: unexpected token Eof in statement");
    }

    #[test]
    fn test_error_declare_without_name() {
        assert_error("var 1", "4..5: expected token Identifier, but got Number");
    }

    #[test]
    fn test_error_empty_program() {
        assert_error("", "0..0: empty program");
        assert_error(" \n ", "3..3: empty program");
    }

    #[test]
    fn test_error_unexpected_char() {
        assert_error("1 + $", "4..5: unexpected character");
    }

    #[test]
    fn test_error_int_out_of_bounds() {
        assert_error(
            "99999999999999999999",
            "0..20: parse int error, out of bounds",
        );
    }
}
