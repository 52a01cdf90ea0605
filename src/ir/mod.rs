//! Control flow graph IR. Loops and conditionals are reduced to basic blocks
//! connected by branches and jumps, and expression trees are flattened into
//! instructions producing SSA values. Mutable variables live in stack slots
//! that are read with `load` and written with `store`, so no phi nodes are
//! needed. The textual form is LLVM IR.

use std::collections::BTreeSet;

use crate::{index::IndexVec, simple_index};

pub mod builder;
pub mod eval;
pub mod pretty_print;
pub mod verify;

pub use builder::FunctionBuilder;

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    /// Stack slots backing the mutable variables of the function
    pub slots: IndexVec<SlotId, Slot>,
    /// SSA values defined by instructions
    pub values: IndexVec<ValueId, Value>,
    pub blocks: IndexVec<BlockId, Block>,
}

impl Function {
    pub const ENTRY: BlockId = BlockId::ENTRY;

    pub fn entry(&self) -> &Block {
        &self.blocks[Self::ENTRY]
    }

    pub fn slot_named(&self, name: &str) -> Option<SlotId> {
        self.slots.iter().find(|s| s.name == name).map(|s| s.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub label: BlockLabel,
    pub instructions: Vec<Instruction>,
    pub predecessors: BTreeSet<BlockId>,
}

impl Block {
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator().is_some()
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator()
            .map(Instruction::successors)
            .unwrap_or_default()
    }

    /// The label the block is printed with. Only the entry block goes without
    /// a numeric suffix.
    pub fn name(&self) -> String {
        match self.label {
            BlockLabel::Entry => self.label.to_string(),
            _ => format!("{}{}", self.label, self.id.0),
        }
    }
}

simple_index! {
    /// Identifies a basic block within a function
    pub struct BlockId;
}

impl BlockId {
    pub const ENTRY: Self = Self(0);
}

impl core::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// What a block was created for. Used to name the block in printed IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BlockLabel {
    Entry,
    Then,
    Else,
    IfCont,
    LoopCond,
    LoopBody,
    LoopExit,
    /// Holds whatever follows a `break` in the same source block
    Unreachable,
}

simple_index! {
    /// Identifies an SSA value
    pub struct ValueId;
}

impl core::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value {
    pub id: ValueId,
    pub ty: Type,
}

simple_index! {
    /// Identifies a stack slot holding a variable
    pub struct SlotId;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: SlotId,
    /// Source level variable stored in this slot
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Type {
    /// The single numeric type every source value is represented with
    #[strum(to_string = "float")]
    Float,
    /// Result of a comparison, only used as a branch condition or before
    /// being widened back to `Float`
    #[strum(to_string = "i1")]
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Constant(f32),
    Value(ValueId),
}

impl Operand {
    pub const ZERO: Self = Self::Constant(0.0);

    pub fn as_value(self) -> Option<ValueId> {
        match self {
            Self::Value(v) => Some(v),
            Self::Constant(_) => None,
        }
    }
}

impl From<ValueId> for Operand {
    fn from(value: ValueId) -> Self {
        Self::Value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FloatOperator {
    FAdd,
    FSub,
    FMul,
    FDiv,
}

/// Ordered `fcmp` predicates. A NaN operand makes every one of them false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FloatPredicate {
    Oeq,
    One,
    Ogt,
    Oge,
    Olt,
    Ole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Alloca {
        slot: SlotId,
    },
    Load {
        destination: ValueId,
        slot: SlotId,
    },
    Store {
        slot: SlotId,
        value: Operand,
    },
    Binary {
        operator: FloatOperator,
        destination: ValueId,
        lhs: Operand,
        rhs: Operand,
    },
    Compare {
        predicate: FloatPredicate,
        destination: ValueId,
        lhs: Operand,
        rhs: Operand,
    },
    Logical {
        operator: LogicalOperator,
        destination: ValueId,
        lhs: ValueId,
        rhs: ValueId,
    },
    /// `uitofp i1 -> float`, turning a comparison result into 0.0 or 1.0
    Widen {
        destination: ValueId,
        operand: ValueId,
    },
    Branch {
        condition: ValueId,
        positive: BlockId,
        negative: BlockId,
    },
    Jump {
        destination: BlockId,
    },
    Return {
        value: Operand,
    },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Branch { .. } | Self::Jump { .. } | Self::Return { .. }
        )
    }

    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Self::Branch {
                positive, negative, ..
            } => vec![*positive, *negative],
            Self::Jump { destination } => vec![*destination],
            _ => Vec::new(),
        }
    }

    /// The value this instruction defines, if any
    pub fn destination(&self) -> Option<ValueId> {
        match self {
            Self::Load { destination, .. }
            | Self::Binary { destination, .. }
            | Self::Compare { destination, .. }
            | Self::Logical { destination, .. }
            | Self::Widen { destination, .. } => Some(*destination),
            Self::Alloca { .. }
            | Self::Store { .. }
            | Self::Branch { .. }
            | Self::Jump { .. }
            | Self::Return { .. } => None,
        }
    }

    /// Values read by this instruction, in operand order
    pub fn uses(&self) -> Vec<ValueId> {
        match self {
            Self::Store { value, .. } | Self::Return { value } => value.as_value().into_iter().collect(),
            Self::Binary { lhs, rhs, .. } | Self::Compare { lhs, rhs, .. } => {
                [lhs, rhs].into_iter().filter_map(|o| o.as_value()).collect()
            }
            Self::Logical { lhs, rhs, .. } => vec![*lhs, *rhs],
            Self::Widen { operand, .. } => vec![*operand],
            Self::Branch { condition, .. } => vec![*condition],
            Self::Alloca { .. } | Self::Load { .. } | Self::Jump { .. } => Vec::new(),
        }
    }
}
