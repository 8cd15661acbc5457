/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator takes the AST, lowering it into the IR module which is
/// handed to the backend.
pub mod codegen;

pub mod ast;
pub mod ir;
pub mod token;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
