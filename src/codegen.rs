use std::{collections::HashMap, fmt};

use crate::{
    ast::{self, Ast, AstKind, Ident},
    ir::{BinOp, Builder, Global, GlobalId, Inst, Module, Terminator, ValueId},
    token::Spanned,
    util::intern::{Name, NameInterner},
};

/// Lowers the AST into an IR module.
///
/// Semantic failures (unknown variables) do not abort the whole run: each is
/// reported as a diagnostic and poisons the enclosing subtree, which then
/// generates no value. An absent root value leaves the function without a
/// return, which the caller must treat as a degraded artifact.
pub fn generate(ast: &Ast, interner: &NameInterner) -> (Module, Vec<Spanned<Error>>) {
    let mut g = Generator {
        interner,
        builder: Builder::new("main"),
        globals: Vec::new(),
        global_ids: HashMap::new(),
        errors: Vec::new(),
    };

    let root = g.gen(ast);
    if let Some(value) = root {
        g.builder.term(Terminator::Ret { value });
    }

    let module = Module {
        globals: g.globals,
        func: g.builder.finish(),
    };
    (module, g.errors)
}

struct Generator<'names> {
    interner: &'names NameInterner,
    builder: Builder,
    globals: Vec<Global>,
    global_ids: HashMap<Name, GlobalId>,
    errors: Vec<Spanned<Error>>,
}

impl Generator<'_> {
    fn gen(&mut self, ast: &Ast) -> Option<ValueId> {
        match &ast.kind {
            AstKind::Number(value) => Some(self.const_i32(*value)),
            AstKind::Read(ident) => self.gen_read(*ident),
            AstKind::Declare(ident) => Some(self.gen_declare(*ident)),
            AstKind::Assign { target, value } => self.gen_assign(*target, value),
            AstKind::Binary { op, lhs, rhs } => self.gen_binary(*op, lhs, rhs),
            AstKind::If {
                cond,
                then_arm,
                else_arm,
            } => self.gen_if(cond, then_arm, else_arm),
            AstKind::While { cond, body } => self.gen_while(cond, body),
            AstKind::Seq { stmt, next } => self.gen_seq(stmt, next.as_deref()),
        }
    }

    /// Allocates fresh zero-initialized global storage and registers it
    /// under the declared name. Name resolution stays dynamic: a later
    /// declaration of the same name shadows the earlier storage for all
    /// subsequent reads and assignments.
    ///
    /// The declaration itself evaluates to zero, so it can stand as the
    /// last statement of a sequence.
    fn gen_declare(&mut self, ident: Ident) -> ValueId {
        let id = GlobalId(u32::try_from(self.globals.len()).unwrap());
        self.globals.push(Global {
            name: self.interner.get(ident.name).to_string(),
        });
        self.global_ids.insert(ident.name, id);
        self.const_i32(0)
    }

    fn gen_read(&mut self, ident: Ident) -> Option<ValueId> {
        let global = self.resolve(ident)?;
        let dst = self.builder.new_value();
        self.builder.emit(Inst::Load { dst, global });
        Some(dst)
    }

    fn gen_assign(&mut self, target: Ident, value: &Ast) -> Option<ValueId> {
        // The value is generated before the target is resolved; a failed
        // value aborts without attempting the store.
        let src = self.gen(value)?;
        let global = self.resolve(target)?;
        self.builder.emit(Inst::Store { global, src });
        Some(src)
    }

    fn gen_binary(&mut self, op: ast::BinOp, lhs: &Ast, rhs: &Ast) -> Option<ValueId> {
        // Both operands are generated unconditionally so that failures in
        // either side all get reported before the expression poisons.
        let a = self.gen(lhs);
        let b = self.gen(rhs);
        let (a, b) = (a?, b?);

        let op = match op {
            ast::BinOp::Add => BinOp::Add,
            ast::BinOp::Sub => BinOp::Sub,
            ast::BinOp::Mul => BinOp::Mul,
            ast::BinOp::Div => BinOp::Sdiv,
            ast::BinOp::Rem => BinOp::Srem,
        };
        let dst = self.builder.new_value();
        self.builder.emit(Inst::Bin { op, dst, a, b });
        Some(dst)
    }

    /// Lowers a conditional into then/else/merge blocks with a phi join, so
    /// the construct produces a value. Each arm's incoming edge is keyed by
    /// the block the arm ended in.
    fn gen_if(&mut self, cond: &Ast, then_arm: &Ast, else_arm: &Ast) -> Option<ValueId> {
        let cond_v = self.gen(cond)?;
        let cond_b = self.truthy(cond_v);

        let then_bb = self.builder.new_block(Some("then"));
        let else_bb = self.builder.new_block(Some("else"));
        let merge_bb = self.builder.new_block(Some("merge"));
        self.builder.term(Terminator::Br {
            cond: cond_b,
            then_tgt: then_bb,
            else_tgt: else_bb,
        });

        self.builder.set_block(then_bb);
        let then_v = self.gen(then_arm);
        let then_end = self.builder.cur_block();
        self.builder.term(Terminator::Jmp { target: merge_bb });

        self.builder.set_block(else_bb);
        let else_v = self.gen(else_arm);
        let else_end = self.builder.cur_block();
        self.builder.term(Terminator::Jmp { target: merge_bb });

        self.builder.set_block(merge_bb);
        let (then_v, else_v) = (then_v?, else_v?);
        let dst = self.builder.new_value();
        self.builder.emit(Inst::Phi {
            dst,
            incomings: vec![(then_end, then_v), (else_end, else_v)],
        });
        Some(dst)
    }

    /// Lowers a loop into header/body/exit blocks. The condition lives in
    /// the header and is re-evaluated on every iteration through the body's
    /// back-edge. The construct itself evaluates to zero.
    fn gen_while(&mut self, cond: &Ast, body: &Ast) -> Option<ValueId> {
        let header_bb = self.builder.new_block(Some("loop"));
        self.builder.term(Terminator::Jmp { target: header_bb });

        self.builder.set_block(header_bb);
        let cond_v = self.gen(cond)?;
        let cond_b = self.truthy(cond_v);
        let body_bb = self.builder.new_block(Some("body"));
        let exit_bb = self.builder.new_block(Some("endloop"));
        self.builder.term(Terminator::Br {
            cond: cond_b,
            then_tgt: body_bb,
            else_tgt: exit_bb,
        });

        self.builder.set_block(body_bb);
        self.gen(body)?;
        self.builder.term(Terminator::Jmp { target: header_bb });

        self.builder.set_block(exit_bb);
        Some(self.const_i32(0))
    }

    /// A failed statement aborts the whole chain without generating its
    /// successors. The sequence evaluates to its last statement's value.
    fn gen_seq(&mut self, stmt: &Ast, next: Option<&Ast>) -> Option<ValueId> {
        let value = self.gen(stmt)?;
        match next {
            Some(next) => self.gen(next),
            None => Some(value),
        }
    }

    fn resolve(&mut self, ident: Ident) -> Option<GlobalId> {
        match self.global_ids.get(&ident.name) {
            Some(id) => Some(*id),
            None => {
                self.errors.push(ident.span.wrap(Error::UnknownVariable {
                    name: self.interner.get(ident.name).to_string(),
                }));
                None
            }
        }
    }

    /// Compares a value against zero, yielding the branch condition.
    fn truthy(&mut self, value: ValueId) -> ValueId {
        let zero = self.const_i32(0);
        let dst = self.builder.new_value();
        self.builder.emit(Inst::CmpNe {
            dst,
            a: value,
            b: zero,
        });
        dst
    }

    fn const_i32(&mut self, imm: i32) -> ValueId {
        let dst = self.builder.new_value();
        self.builder.emit(Inst::ConstI32 { dst, imm });
        dst
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnknownVariable { name: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownVariable { name } => write!(f, "unknown variable {name}"),
        }
    }
}
