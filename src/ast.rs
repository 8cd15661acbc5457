// program    ::= stmt_list EOF
// stmt_list  ::= statement (';' statement)*
// statement  ::= 'var' ID
//              | if_stmt
//              | while_stmt
//              | add_sub
// if_stmt    ::= if '(' add_sub ')' '{' add_sub '}' [else '{' add_sub '}']
// while_stmt ::= while '(' add_sub ')' '{' stmt_list '}'
// add_sub    ::= mul_div_rem (('+' | '-') mul_div_rem)*
// mul_div_rem::= term (('*' | '/' | '%') term)*
// term       ::= NUMBER
//              | ID ['=' add_sub]
//              | '(' add_sub ')'

// Precedence (low to high)
//
// + -
// * / %

use crate::{token::Span, util::intern::Name};

#[derive(Debug, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum AstKind {
    Number(i32),
    /// Reads the current value of a global variable.
    Read(Ident),
    /// Declares a new zero-initialized global variable.
    Declare(Ident),
    Assign {
        target: Ident,
        value: Box<Ast>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
    /// `if` is an expression: a missing else arm is substituted with a
    /// `Number(0)` node at parse time, so every conditional yields a value.
    If {
        cond: Box<Ast>,
        then_arm: Box<Ast>,
        else_arm: Box<Ast>,
    },
    While {
        cond: Box<Ast>,
        body: Box<Ast>,
    },
    /// One link of the right-leaning statement chain. `next` is `None` for
    /// the last statement of a sequence.
    Seq {
        stmt: Box<Ast>,
        next: Option<Box<Ast>>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Name,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}
