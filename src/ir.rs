use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalId(pub u32);

/// The artifact handed to the backend: one entry function plus the global
/// variable storage it refers to. All storage and all values are i32.
pub struct Module {
    pub globals: Vec<Global>,
    pub func: Function,
}

pub struct Global {
    pub name: String,
}

pub struct Function {
    pub name: &'static str,
    pub entry: BlockId,
    pub blocks: Vec<Block>,
    pub value_count: u32,
}

pub struct Block {
    pub label: Option<&'static str>,
    pub insns: Vec<Inst>,
    pub term: Terminator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inst {
    ConstI32 { dst: ValueId, imm: i32 },
    Bin { op: BinOp, dst: ValueId, a: ValueId, b: ValueId },
    Load { dst: ValueId, global: GlobalId },
    Store { global: GlobalId, src: ValueId },
    /// Produces 1 when `a != b`, 0 otherwise. Used to turn an integer
    /// condition into a branchable boolean (C-style truthiness).
    CmpNe { dst: ValueId, a: ValueId, b: ValueId },
    /// Value join at a confluence point, keyed by predecessor block.
    Phi { dst: ValueId, incomings: Vec<(BlockId, ValueId)> },
}

/// Signed i32 arithmetic; division and remainder truncate toward zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Srem,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Sdiv => "sdiv",
            BinOp::Srem => "srem",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    Jmp { target: BlockId },
    Br { cond: ValueId, then_tgt: BlockId, else_tgt: BlockId },
    Ret { value: ValueId },
    /// A block which never received a terminator. Only present in degraded
    /// modules (a failed generation leaves the open block behind).
    None,
}

/// Incrementally builds the entry function, tracking the current insertion
/// point. Instructions always append to the current block.
pub struct Builder {
    func: Function,
    cur: BlockId,
}

impl Builder {
    pub fn new(name: &'static str) -> Builder {
        let entry = BlockId(0);
        Builder {
            func: Function {
                name,
                entry,
                blocks: vec![Block {
                    label: Some("entry"),
                    insns: Vec::new(),
                    term: Terminator::None,
                }],
                value_count: 0,
            },
            cur: entry,
        }
    }

    pub fn new_block(&mut self, label: Option<&'static str>) -> BlockId {
        let id = BlockId(u32::try_from(self.func.blocks.len()).unwrap());
        self.func.blocks.push(Block {
            label,
            insns: Vec::new(),
            term: Terminator::None,
        });
        id
    }

    pub fn set_block(&mut self, block: BlockId) {
        self.cur = block;
    }

    pub fn cur_block(&self) -> BlockId {
        self.cur
    }

    pub fn new_value(&mut self) -> ValueId {
        let id = ValueId(self.func.value_count);
        self.func.value_count += 1;
        id
    }

    pub fn emit(&mut self, inst: Inst) {
        self.func.blocks[self.cur.0 as usize].insns.push(inst);
    }

    pub fn term(&mut self, term: Terminator) {
        self.func.blocks[self.cur.0 as usize].term = term;
    }

    pub fn finish(self) -> Function {
        self.func
    }
}

// Textual serialization. Block and value numbering follow creation order,
// so identical input programs serialize to identical text.

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            writeln!(f, "global @{} = 0", global.name)?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        writeln!(f, "define i32 @{}() {{", self.func.name)?;
        for (i, block) in self.func.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match block.label {
                Some(label) => writeln!(f, "bb{i}:\t\t; {label}")?,
                None => writeln!(f, "bb{i}:")?,
            }
            for inst in &block.insns {
                self.fmt_inst(f, inst)?;
            }
            self.fmt_term(f, &block.term)?;
        }
        writeln!(f, "}}")
    }
}

impl Module {
    fn fmt_inst(&self, f: &mut fmt::Formatter<'_>, inst: &Inst) -> fmt::Result {
        write!(f, "  ")?;
        match inst {
            Inst::ConstI32 { dst, imm } => writeln!(f, "%{} = const.i32 {imm}", dst.0),
            Inst::Bin { op, dst, a, b } => {
                writeln!(f, "%{} = {}.i32 %{}, %{}", dst.0, op.mnemonic(), a.0, b.0)
            }
            Inst::Load { dst, global } => {
                writeln!(f, "%{} = load @{}", dst.0, self.globals[global.0 as usize].name)
            }
            Inst::Store { global, src } => {
                writeln!(f, "store @{}, %{}", self.globals[global.0 as usize].name, src.0)
            }
            Inst::CmpNe { dst, a, b } => writeln!(f, "%{} = cmp.ne %{}, %{}", dst.0, a.0, b.0),
            Inst::Phi { dst, incomings } => {
                write!(f, "%{} = phi ", dst.0)?;
                for (i, (block, value)) in incomings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[bb{}, %{}]", block.0, value.0)?;
                }
                writeln!(f)
            }
        }
    }

    fn fmt_term(&self, f: &mut fmt::Formatter<'_>, term: &Terminator) -> fmt::Result {
        match term {
            Terminator::Jmp { target } => writeln!(f, "  jmp bb{}", target.0),
            Terminator::Br {
                cond,
                then_tgt,
                else_tgt,
            } => writeln!(f, "  br %{}, bb{}, bb{}", cond.0, then_tgt.0, else_tgt.0),
            Terminator::Ret { value } => writeln!(f, "  ret %{}", value.0),
            Terminator::None => writeln!(f, "  ; unterminated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn builder_tracks_insertion_point() {
        let mut b = Builder::new("main");
        let v0 = b.new_value();
        b.emit(Inst::ConstI32 { dst: v0, imm: 7 });

        let other = b.new_block(Some("then"));
        b.set_block(other);
        assert_eq!(b.cur_block(), other);
        let v1 = b.new_value();
        b.emit(Inst::ConstI32 { dst: v1, imm: 8 });
        b.term(Terminator::Ret { value: v1 });

        let func = b.finish();
        assert_eq!(func.blocks.len(), 2);
        assert_eq!(func.blocks[0].insns.len(), 1);
        assert_eq!(func.blocks[1].term, Terminator::Ret { value: v1 });
        assert_eq!(func.blocks[0].term, Terminator::None);
    }

    #[test]
    fn display_round() {
        let mut b = Builder::new("main");
        let v0 = b.new_value();
        b.emit(Inst::ConstI32 { dst: v0, imm: 2 });
        let v1 = b.new_value();
        b.emit(Inst::ConstI32 { dst: v1, imm: 3 });
        let v2 = b.new_value();
        b.emit(Inst::Bin {
            op: BinOp::Add,
            dst: v2,
            a: v0,
            b: v1,
        });
        b.term(Terminator::Ret { value: v2 });

        let module = Module {
            globals: vec![Global {
                name: "x".to_string(),
            }],
            func: b.finish(),
        };

        assert_eq!(
            module.to_string(),
            indoc! {"
                global @x = 0

                define i32 @main() {
                bb0:\t\t; entry
                  %0 = const.i32 2
                  %1 = const.i32 3
                  %2 = add.i32 %0, %1
                  ret %2
                }
            "}
        );
    }
}
