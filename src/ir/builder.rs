use std::collections::BTreeSet;

use tracing::trace;

use super::{
    Block, BlockId, BlockLabel, FloatOperator, FloatPredicate, Function, Instruction,
    LogicalOperator, Operand, Slot, SlotId, Type, Value, ValueId,
};
use crate::index::IndexVec;

/// Appends instructions to a function under construction. Instructions go to
/// the end of the block the builder is positioned at, except for allocas which
/// are hoisted to the top of the entry block.
#[derive(Debug)]
pub struct FunctionBuilder {
    function: Function,
    insertion_block: BlockId,
    /// Number of allocas (and their initializing stores) at the head of the
    /// entry block
    prologue_len: usize,
}

impl FunctionBuilder {
    /// Creates an empty function and positions the builder in its entry block
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        let mut function = Function {
            name: name.into(),
            return_type,
            slots: IndexVec::new(),
            values: IndexVec::new(),
            blocks: IndexVec::new(),
        };

        let entry = function.blocks.push(Block {
            id: BlockId::ENTRY,
            label: BlockLabel::Entry,
            instructions: Vec::new(),
            predecessors: BTreeSet::new(),
        });

        Self {
            function,
            insertion_block: entry,
            prologue_len: 0,
        }
    }

    pub fn create_block(&mut self, label: BlockLabel) -> BlockId {
        let id = self.function.blocks.next_index();
        self.function.blocks.push(Block {
            id,
            label,
            instructions: Vec::new(),
            predecessors: BTreeSet::new(),
        })
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.insertion_block = block;
    }

    /// Whether the current block already ends in a branch, jump or return
    pub fn is_terminated(&self) -> bool {
        self.function.blocks[self.insertion_block].is_terminated()
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn finish(self) -> Function {
        self.function
    }

    fn create_value(&mut self, ty: Type) -> ValueId {
        let id = self.function.values.next_index();
        self.function.values.push(Value { id, ty })
    }

    fn push_instruction(&mut self, instruction: Instruction) {
        let block = &mut self.function.blocks[self.insertion_block];
        debug_assert!(
            !block.is_terminated(),
            "instruction pushed after the terminator of {}",
            block.id
        );

        trace!(block = %block.id, ?instruction, "emit");
        block.instructions.push(instruction);
    }

    fn add_edge(&mut self, to: BlockId) {
        let from = self.insertion_block;
        self.function.blocks[to].predecessors.insert(from);
    }

    /// Allocates a stack slot at the top of the entry block. An initializer is
    /// stored right after the alloca, before any other code runs.
    pub fn build_alloca(&mut self, name: impl Into<String>, initializer: Option<Operand>) -> SlotId {
        let id = self.function.slots.next_index();
        let slot = self.function.slots.push(Slot {
            id,
            name: name.into(),
        });

        let mut prologue = vec![Instruction::Alloca { slot }];
        if let Some(value) = initializer {
            prologue.push(Instruction::Store { slot, value });
        }

        let entry = &mut self.function.blocks[BlockId::ENTRY];
        let at = self.prologue_len;
        self.prologue_len += prologue.len();
        entry.instructions.splice(at..at, prologue);

        slot
    }

    pub fn build_load(&mut self, slot: SlotId) -> ValueId {
        let destination = self.create_value(Type::Float);
        self.push_instruction(Instruction::Load { destination, slot });
        destination
    }

    pub fn build_store(&mut self, slot: SlotId, value: Operand) {
        self.push_instruction(Instruction::Store { slot, value });
    }

    pub fn build_binary(&mut self, operator: FloatOperator, lhs: Operand, rhs: Operand) -> ValueId {
        let destination = self.create_value(Type::Float);
        self.push_instruction(Instruction::Binary {
            operator,
            destination,
            lhs,
            rhs,
        });
        destination
    }

    pub fn build_compare(
        &mut self,
        predicate: FloatPredicate,
        lhs: Operand,
        rhs: Operand,
    ) -> ValueId {
        let destination = self.create_value(Type::Bool);
        self.push_instruction(Instruction::Compare {
            predicate,
            destination,
            lhs,
            rhs,
        });
        destination
    }

    pub fn build_logical(
        &mut self,
        operator: LogicalOperator,
        lhs: ValueId,
        rhs: ValueId,
    ) -> ValueId {
        let destination = self.create_value(Type::Bool);
        self.push_instruction(Instruction::Logical {
            operator,
            destination,
            lhs,
            rhs,
        });
        destination
    }

    pub fn build_widen(&mut self, operand: ValueId) -> ValueId {
        let destination = self.create_value(Type::Float);
        self.push_instruction(Instruction::Widen {
            destination,
            operand,
        });
        destination
    }

    pub fn build_branch(&mut self, condition: ValueId, positive: BlockId, negative: BlockId) {
        self.add_edge(positive);
        self.add_edge(negative);
        self.push_instruction(Instruction::Branch {
            condition,
            positive,
            negative,
        });
    }

    pub fn build_jump(&mut self, destination: BlockId) {
        self.add_edge(destination);
        self.push_instruction(Instruction::Jump { destination });
    }

    pub fn build_return(&mut self, value: Operand) {
        self.push_instruction(Instruction::Return { value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocas_are_hoisted_into_entry_block() {
        let mut builder = FunctionBuilder::new("main", Type::Float);
        let body = builder.create_block(BlockLabel::LoopBody);

        builder.build_jump(body);
        builder.position_at_end(body);

        let x = builder.build_alloca("x", None);
        builder.build_store(x, Operand::Constant(1.0));
        let y = builder.build_alloca("y", Some(Operand::ZERO));
        builder.build_return(Operand::ZERO);

        let function = builder.finish();

        assert_eq!(
            function.entry().instructions,
            vec![
                Instruction::Alloca { slot: x },
                Instruction::Alloca { slot: y },
                Instruction::Store {
                    slot: y,
                    value: Operand::ZERO
                },
                Instruction::Jump { destination: body },
            ]
        );
        assert_eq!(
            function.blocks[body].predecessors,
            BTreeSet::from([BlockId::ENTRY])
        );
    }

    #[test]
    fn branch_records_both_edges() {
        let mut builder = FunctionBuilder::new("main", Type::Float);
        let then_block = builder.create_block(BlockLabel::Then);
        let merge = builder.create_block(BlockLabel::IfCont);

        let condition =
            builder.build_compare(FloatPredicate::One, Operand::Constant(1.0), Operand::ZERO);
        builder.build_branch(condition, then_block, merge);

        assert!(builder.is_terminated());
        assert_eq!(builder.function().values[condition].ty, Type::Bool);
        assert!(builder.function().blocks[merge].predecessors.contains(&BlockId::ENTRY));
        assert!(builder.function().blocks[then_block].predecessors.contains(&BlockId::ENTRY));
    }
}
