use crate::{
    codegen,
    ir::{BlockId, Inst, Module, Terminator},
    parser,
    util::{fmt, intern::NameInterner},
};

/// Runs lex + parse and renders the result tree. Panics on a parse error.
#[track_caller]
pub fn parse_program_tree(src: &str) -> String {
    let mut tokens = Vec::with_capacity(64);
    let mut interner = NameInterner::with_capacity(16);
    let ast = parser::parse_program(src, &mut tokens, &mut interner)
        .unwrap_or_else(|error| panic!("failed to parse: {}: {}", error.span, error.inner));
    fmt::print_ast_string(&interner, &ast)
}

/// Runs lex + parse and renders the error. Panics if the parse succeeds.
#[track_caller]
pub fn parse_program_err(src: &str) -> String {
    let mut tokens = Vec::with_capacity(64);
    let mut interner = NameInterner::with_capacity(16);
    match parser::parse_program(src, &mut tokens, &mut interner) {
        Ok(_) => panic!("expected a parse error"),
        Err(error) => format!("{}: {}", error.span, error.inner),
    }
}

/// Runs the whole pipeline, returning the module and formatted codegen
/// diagnostics. Panics on a parse error.
#[track_caller]
pub fn compile(src: &str) -> (Module, Vec<String>) {
    let mut tokens = Vec::with_capacity(64);
    let mut interner = NameInterner::with_capacity(16);
    let ast = parser::parse_program(src, &mut tokens, &mut interner)
        .unwrap_or_else(|error| panic!("failed to parse: {}: {}", error.span, error.inner));
    let (module, errors) = codegen::generate(&ast, &interner);
    let errors = errors
        .iter()
        .map(|error| format!("{}: {}", error.span, error.inner))
        .collect();
    (module, errors)
}

/// Compiles and evaluates, asserting a clean run.
#[track_caller]
pub fn run(src: &str) -> i32 {
    let (module, errors) = compile(src);
    assert_eq!(errors, Vec::<String>::new(), "unexpected codegen errors");
    eval(&module).expect("module has no return")
}

const EVAL_STEP_LIMIT: usize = 1_000_000;

/// A small reference evaluator for generated modules, used to assert the
/// observable semantics of lowered programs. Returns `None` when execution
/// falls into an unterminated block (degraded module).
pub fn eval(module: &Module) -> Option<i32> {
    let mut values = vec![0i32; module.func.value_count as usize];
    let mut globals = vec![0i32; module.globals.len()];

    let mut cur = module.func.entry;
    let mut prev: Option<BlockId> = None;
    for _ in 0..EVAL_STEP_LIMIT {
        let block = &module.func.blocks[cur.0 as usize];
        for inst in &block.insns {
            match inst {
                Inst::ConstI32 { dst, imm } => values[dst.0 as usize] = *imm,
                Inst::Bin { op, dst, a, b } => {
                    use crate::ir::BinOp::*;
                    let (a, b) = (values[a.0 as usize], values[b.0 as usize]);
                    values[dst.0 as usize] = match op {
                        Add => a.wrapping_add(b),
                        Sub => a.wrapping_sub(b),
                        Mul => a.wrapping_mul(b),
                        Sdiv => a.wrapping_div(b),
                        Srem => a.wrapping_rem(b),
                    };
                }
                Inst::Load { dst, global } => {
                    values[dst.0 as usize] = globals[global.0 as usize];
                }
                Inst::Store { global, src } => {
                    globals[global.0 as usize] = values[src.0 as usize];
                }
                Inst::CmpNe { dst, a, b } => {
                    let ne = values[a.0 as usize] != values[b.0 as usize];
                    values[dst.0 as usize] = i32::from(ne);
                }
                Inst::Phi { dst, incomings } => {
                    let prev = prev.expect("phi in entry block");
                    let (_, value) = incomings
                        .iter()
                        .find(|(block, _)| *block == prev)
                        .expect("phi misses predecessor");
                    values[dst.0 as usize] = values[value.0 as usize];
                }
            }
        }
        match block.term {
            Terminator::Jmp { target } => {
                prev = Some(cur);
                cur = target;
            }
            Terminator::Br {
                cond,
                then_tgt,
                else_tgt,
            } => {
                prev = Some(cur);
                cur = if values[cond.0 as usize] != 0 {
                    then_tgt
                } else {
                    else_tgt
                };
            }
            Terminator::Ret { value } => return Some(values[value.0 as usize]),
            Terminator::None => return None,
        }
    }
    panic!("evaluation exceeded step limit");
}
