use std::{
    fs,
    io::{self, Read},
    process::ExitCode,
};

use imprs::{codegen, lexer, parser, util::intern::NameInterner};

const OUTPUT_PATH: &str = "out.ir";

/// Single-pass pipeline over stdin. A parse error aborts with a nonzero
/// status before any IR exists; codegen diagnostics are printed but the
/// (possibly degraded) artifact is still written.
fn main() -> ExitCode {
    let mut src = String::new();
    if let Err(error) = io::stdin().read_to_string(&mut src) {
        eprintln!("failed to read input: {error}");
        return ExitCode::FAILURE;
    }

    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    let mut interner = NameInterner::with_capacity(16);

    let ast = match parser::parse_program(&src, &mut tokens, &mut interner) {
        Ok(ast) => ast,
        Err(error) => {
            eprintln!("{}: {}", error.span, error.inner);
            return ExitCode::FAILURE;
        }
    };

    let (module, errors) = codegen::generate(&ast, &interner);
    for error in &errors {
        eprintln!("{}: {}", error.span, error.inner);
    }

    let text = module.to_string();
    eprint!("{text}");
    if let Err(error) = fs::write(OUTPUT_PATH, &text) {
        eprintln!("failed to write {OUTPUT_PATH}: {error}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
