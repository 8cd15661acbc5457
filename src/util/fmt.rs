use std::io::Write;

use crate::{
    ast::{Ast, AstKind},
    util::intern::NameInterner,
};

const INDENT_WIDTH: usize = 2;

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

pub fn print_ast_string(interner: &NameInterner, ast: &Ast) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_ast(&mut buf, 0, interner, ast).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_ast(
    w: &mut impl Write,
    i: usize,
    interner: &NameInterner,
    ast: &Ast,
) -> std::io::Result<()> {
    sp(w, i)?;
    let span = ast.span;
    match &ast.kind {
        AstKind::Number(value) => {
            writeln!(w, "number {value} ({span})")?;
        }
        AstKind::Read(ident) => {
            writeln!(w, "read {} ({span})", interner.get(ident.name))?;
        }
        AstKind::Declare(ident) => {
            writeln!(w, "declare {} ({span})", interner.get(ident.name))?;
        }
        AstKind::Assign { target, value } => {
            writeln!(w, "assign {} ({span})", interner.get(target.name))?;
            print_ast(w, i + 1, interner, value)?;
        }
        AstKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_ast(w, i + 1, interner, lhs)?;
            print_ast(w, i + 1, interner, rhs)?;
        }
        AstKind::If {
            cond,
            then_arm,
            else_arm,
        } => {
            writeln!(w, "if ({span})")?;
            print_ast(w, i + 1, interner, cond)?;
            print_ast(w, i + 1, interner, then_arm)?;
            print_ast(w, i + 1, interner, else_arm)?;
        }
        AstKind::While { cond, body } => {
            writeln!(w, "while ({span})")?;
            print_ast(w, i + 1, interner, cond)?;
            print_ast(w, i + 1, interner, body)?;
        }
        AstKind::Seq { stmt, next } => {
            writeln!(w, "seq ({span})")?;
            print_ast(w, i + 1, interner, stmt)?;
            if let Some(next) = next {
                print_ast(w, i + 1, interner, next)?;
            }
        }
    }
    Ok(())
}
