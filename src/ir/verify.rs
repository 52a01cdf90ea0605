//! Structural checks run on every lowered function before it is handed to the
//! external toolchain. They catch the same class of mistakes the LLVM
//! verifier would reject, but report them against our own block ids.

use std::collections::{BTreeMap, BTreeSet};

use super::{BlockId, Function, Instruction, Operand, Type, ValueId};
use crate::{
    error::{CompileError, Result},
    index::Index,
};

pub fn verify_function(function: &Function) -> Result<()> {
    let definitions = collect_definitions(function)?;

    for block in function.blocks.iter() {
        let error = |message: String| CompileError::Verification {
            block: block.id,
            message,
        };

        let Some((last, body)) = block.instructions.split_last() else {
            return Err(error("block is empty".to_string()));
        };

        if !last.is_terminator() {
            return Err(error("block does not end with a terminator".to_string()));
        }

        if body.iter().any(Instruction::is_terminator) {
            return Err(error("terminator in the middle of the block".to_string()));
        }

        for instruction in &block.instructions {
            if matches!(instruction, Instruction::Alloca { .. }) && block.id != BlockId::ENTRY {
                return Err(error("alloca outside of the entry block".to_string()));
            }

            for target in instruction.successors() {
                if function.blocks.get(target).is_none() {
                    return Err(error(format!("jump to missing block {target}")));
                }
            }

            check_operand_types(function, instruction).map_err(error)?;
        }
    }

    check_predecessors(function)?;
    check_dominance(function, &definitions)?;

    Ok(())
}

/// Maps every value to the block and position defining it
fn collect_definitions(function: &Function) -> Result<BTreeMap<ValueId, (BlockId, usize)>> {
    let mut definitions = BTreeMap::new();

    for block in function.blocks.iter() {
        for (position, instruction) in block.instructions.iter().enumerate() {
            if let Some(destination) = instruction.destination()
                && definitions
                    .insert(destination, (block.id, position))
                    .is_some()
            {
                return Err(CompileError::Verification {
                    block: block.id,
                    message: format!("{destination} is defined more than once"),
                });
            }
        }
    }

    Ok(definitions)
}

fn check_operand_types(function: &Function, instruction: &Instruction) -> Result<(), String> {
    let expect = |value: ValueId, ty: Type| match function.values.get(value) {
        Some(v) if v.ty == ty => Ok(()),
        Some(v) => Err(format!("{value} has type {} but {ty} is required", v.ty)),
        None => Err(format!("{value} is not a value of this function")),
    };
    let expect_float = |operand: Operand| match operand {
        Operand::Constant(_) => Ok(()),
        Operand::Value(value) => expect(value, Type::Float),
    };

    match instruction {
        Instruction::Alloca { slot } | Instruction::Load { slot, .. } => {
            if function.slots.get(*slot).is_none() {
                return Err(format!("slot {} does not exist", slot.index()));
            }
            Ok(())
        }
        Instruction::Store { slot, value } => {
            if function.slots.get(*slot).is_none() {
                return Err(format!("slot {} does not exist", slot.index()));
            }
            expect_float(*value)
        }
        Instruction::Binary { lhs, rhs, .. } | Instruction::Compare { lhs, rhs, .. } => {
            expect_float(*lhs)?;
            expect_float(*rhs)
        }
        Instruction::Logical { lhs, rhs, .. } => {
            expect(*lhs, Type::Bool)?;
            expect(*rhs, Type::Bool)
        }
        Instruction::Widen { operand, .. } => expect(*operand, Type::Bool),
        Instruction::Branch { condition, .. } => expect(*condition, Type::Bool),
        Instruction::Return { value } => expect_float(*value),
        Instruction::Jump { .. } => Ok(()),
    }
}

fn check_predecessors(function: &Function) -> Result<()> {
    let mut expected: BTreeMap<BlockId, BTreeSet<BlockId>> = function
        .blocks
        .indices()
        .map(|id| (id, BTreeSet::new()))
        .collect();

    for block in function.blocks.iter() {
        for successor in block.successors() {
            expected.entry(successor).or_default().insert(block.id);
        }
    }

    for block in function.blocks.iter() {
        if block.predecessors != expected[&block.id] {
            return Err(CompileError::Verification {
                block: block.id,
                message: "recorded predecessors do not match the incoming edges".to_string(),
            });
        }
    }

    Ok(())
}

/// Blocks reachable from the entry block
pub fn reachable_blocks(function: &Function) -> BTreeSet<BlockId> {
    let mut reachable = BTreeSet::new();
    let mut worklist = vec![BlockId::ENTRY];

    while let Some(id) = worklist.pop() {
        if reachable.insert(id) {
            worklist.extend(function.blocks[id].successors());
        }
    }

    reachable
}

/// Dominator sets of the reachable blocks, computed with the classic
/// iterative data flow formulation
fn dominators(
    function: &Function,
    reachable: &BTreeSet<BlockId>,
) -> BTreeMap<BlockId, BTreeSet<BlockId>> {
    let mut dominators: BTreeMap<BlockId, BTreeSet<BlockId>> = reachable
        .iter()
        .map(|id| {
            let set = if *id == BlockId::ENTRY {
                BTreeSet::from([BlockId::ENTRY])
            } else {
                reachable.clone()
            };
            (*id, set)
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;

        for id in reachable.iter().filter(|id| **id != BlockId::ENTRY) {
            let mut set = function.blocks[*id]
                .predecessors
                .iter()
                .filter(|p| reachable.contains(p))
                .map(|p| dominators[p].clone())
                .reduce(|a, b| a.intersection(&b).copied().collect())
                .unwrap_or_default();
            set.insert(*id);

            if set != dominators[id] {
                dominators.insert(*id, set);
                changed = true;
            }
        }
    }

    dominators
}

fn check_dominance(
    function: &Function,
    definitions: &BTreeMap<ValueId, (BlockId, usize)>,
) -> Result<()> {
    let reachable = reachable_blocks(function);
    let dominators = dominators(function, &reachable);

    for block in function.blocks.iter() {
        for (position, instruction) in block.instructions.iter().enumerate() {
            for used in instruction.uses() {
                let error = |message: String| CompileError::Verification {
                    block: block.id,
                    message,
                };

                let Some(&(defining_block, defining_position)) = definitions.get(&used) else {
                    return Err(error(format!("{used} is used but never defined")));
                };

                let dominated = if defining_block == block.id {
                    defining_position < position
                } else {
                    // Anything goes in unreachable code
                    !reachable.contains(&block.id) || dominators[&block.id].contains(&defining_block)
                };

                if !dominated {
                    return Err(error(format!("{used} does not dominate its use")));
                }
            }
        }
    }

    Ok(())
}
