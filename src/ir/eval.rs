//! Reference evaluator for lowered functions. It executes the IR directly,
//! block by block, which lets tests and `flowc --run` observe what a program
//! computes without going through the native toolchain.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use super::{
    BlockId, FloatOperator, FloatPredicate, Function, Instruction, LogicalOperator, Operand,
    SlotId, ValueId,
};
use crate::index::IndexVec;

pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("execution did not finish within {limit} instructions")]
    StepLimitExceeded { limit: usize },

    #[error("variable `{name}` is read before anything was stored in it")]
    UninitializedSlot { name: String },

    #[error("{value} is read before it is defined")]
    UndefinedValue { value: ValueId },

    #[error("control fell off the end of {block}")]
    MissingTerminator { block: BlockId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RuntimeValue {
    Float(f32),
    Bool(bool),
}

impl RuntimeValue {
    fn as_float(self) -> f32 {
        match self {
            Self::Float(v) => v,
            Self::Bool(b) => b as u8 as f32,
        }
    }

    fn as_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Float(v) => v != 0.0,
        }
    }
}

/// Everything observable about one run of a function
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub return_value: f32,
    /// Blocks in the order control entered them
    pub visited: Vec<BlockId>,
    /// Every store performed, in order, as (variable, value)
    pub stores: Vec<(String, f32)>,
    /// Final contents of every variable that was written
    pub variables: BTreeMap<String, f32>,
    pub steps: usize,
}

impl Execution {
    pub fn variable(&self, name: &str) -> Option<f32> {
        self.variables.get(name).copied()
    }
}

pub fn evaluate(function: &Function, step_limit: usize) -> Result<Execution, EvalError> {
    let mut values: IndexVec<ValueId, Option<RuntimeValue>> =
        IndexVec::from_raw(vec![None; function.values.len()]);
    let mut slots: IndexVec<SlotId, Option<f32>> =
        IndexVec::from_raw(vec![None; function.slots.len()]);

    let mut visited = Vec::new();
    let mut stores = Vec::new();
    let mut steps = 0;

    let read = |values: &IndexVec<ValueId, Option<RuntimeValue>>, value: ValueId| {
        values[value].ok_or(EvalError::UndefinedValue { value })
    };
    let operand = |values: &IndexVec<ValueId, Option<RuntimeValue>>, operand: Operand| {
        match operand {
            Operand::Constant(c) => Ok(c),
            Operand::Value(v) => read(values, v).map(RuntimeValue::as_float),
        }
    };

    let mut current = BlockId::ENTRY;

    let return_value = 'run: loop {
        visited.push(current);
        trace!(block = %current, "enter");

        for instruction in &function.blocks[current].instructions {
            steps += 1;
            if steps > step_limit {
                return Err(EvalError::StepLimitExceeded { limit: step_limit });
            }

            match instruction {
                Instruction::Alloca { .. } => {}
                Instruction::Load { destination, slot } => {
                    let value = slots[*slot].ok_or_else(|| EvalError::UninitializedSlot {
                        name: function.slots[*slot].name.clone(),
                    })?;
                    values[*destination] = Some(RuntimeValue::Float(value));
                }
                Instruction::Store { slot, value } => {
                    let value = operand(&values, *value)?;
                    slots[*slot] = Some(value);
                    stores.push((function.slots[*slot].name.clone(), value));
                }
                Instruction::Binary {
                    operator,
                    destination,
                    lhs,
                    rhs,
                } => {
                    let (lhs, rhs) = (operand(&values, *lhs)?, operand(&values, *rhs)?);
                    let result = match operator {
                        FloatOperator::FAdd => lhs + rhs,
                        FloatOperator::FSub => lhs - rhs,
                        FloatOperator::FMul => lhs * rhs,
                        FloatOperator::FDiv => lhs / rhs,
                    };
                    values[*destination] = Some(RuntimeValue::Float(result));
                }
                Instruction::Compare {
                    predicate,
                    destination,
                    lhs,
                    rhs,
                } => {
                    let (lhs, rhs) = (operand(&values, *lhs)?, operand(&values, *rhs)?);
                    let ordered = !lhs.is_nan() && !rhs.is_nan();
                    let result = ordered
                        && match predicate {
                            FloatPredicate::Oeq => lhs == rhs,
                            FloatPredicate::One => lhs != rhs,
                            FloatPredicate::Ogt => lhs > rhs,
                            FloatPredicate::Oge => lhs >= rhs,
                            FloatPredicate::Olt => lhs < rhs,
                            FloatPredicate::Ole => lhs <= rhs,
                        };
                    values[*destination] = Some(RuntimeValue::Bool(result));
                }
                Instruction::Logical {
                    operator,
                    destination,
                    lhs,
                    rhs,
                } => {
                    let lhs = read(&values, *lhs)?.as_bool();
                    let rhs = read(&values, *rhs)?.as_bool();
                    let result = match operator {
                        LogicalOperator::And => lhs & rhs,
                        LogicalOperator::Or => lhs | rhs,
                    };
                    values[*destination] = Some(RuntimeValue::Bool(result));
                }
                Instruction::Widen {
                    destination,
                    operand,
                } => {
                    let value = read(&values, *operand)?.as_float();
                    values[*destination] = Some(RuntimeValue::Float(value));
                }
                Instruction::Branch {
                    condition,
                    positive,
                    negative,
                } => {
                    current = if read(&values, *condition)?.as_bool() {
                        *positive
                    } else {
                        *negative
                    };
                    continue 'run;
                }
                Instruction::Jump { destination } => {
                    current = *destination;
                    continue 'run;
                }
                Instruction::Return { value } => break 'run operand(&values, *value)?,
            }
        }

        return Err(EvalError::MissingTerminator { block: current });
    };

    let variables = function
        .slots
        .iter()
        .filter_map(|slot| slots[slot.id].map(|value| (slot.name.clone(), value)))
        .collect();

    Ok(Execution {
        return_value,
        visited,
        stores,
        variables,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BlockLabel, FunctionBuilder, Type};

    #[test]
    fn runs_a_counting_loop() {
        // i = 0; while (i < 3) { i = i + 1 }; return i
        let mut builder = FunctionBuilder::new("main", Type::Float);
        let condition_block = builder.create_block(BlockLabel::LoopCond);
        let body = builder.create_block(BlockLabel::LoopBody);
        let exit = builder.create_block(BlockLabel::LoopExit);

        let i = builder.build_alloca("i", None);
        builder.build_store(i, Operand::ZERO);
        builder.build_jump(condition_block);

        builder.position_at_end(condition_block);
        let current = builder.build_load(i);
        let condition =
            builder.build_compare(FloatPredicate::Olt, current.into(), Operand::Constant(3.0));
        builder.build_branch(condition, body, exit);

        builder.position_at_end(body);
        let current = builder.build_load(i);
        let next = builder.build_binary(FloatOperator::FAdd, current.into(), Operand::Constant(1.0));
        builder.build_store(i, next.into());
        builder.build_jump(condition_block);

        builder.position_at_end(exit);
        let result = builder.build_load(i);
        builder.build_return(result.into());

        let execution = evaluate(&builder.finish(), DEFAULT_STEP_LIMIT).unwrap();

        assert_eq!(execution.return_value, 3.0);
        assert_eq!(execution.variable("i"), Some(3.0));
        assert_eq!(execution.stores.len(), 4);
        assert_eq!(execution.visited.last(), Some(&exit));
    }

    #[test]
    fn stops_at_the_step_limit() {
        let mut builder = FunctionBuilder::new("main", Type::Float);
        let spin = builder.create_block(BlockLabel::LoopBody);
        builder.build_jump(spin);
        builder.position_at_end(spin);
        builder.build_jump(spin);

        assert_eq!(
            evaluate(&builder.finish(), 100),
            Err(EvalError::StepLimitExceeded { limit: 100 })
        );
    }

    #[test]
    fn ordered_comparisons_are_false_for_nan() {
        let mut builder = FunctionBuilder::new("main", Type::Float);
        let condition = builder.build_compare(
            FloatPredicate::One,
            Operand::Constant(f32::NAN),
            Operand::ZERO,
        );
        let widened = builder.build_widen(condition);
        builder.build_return(widened.into());

        let execution = evaluate(&builder.finish(), DEFAULT_STEP_LIMIT).unwrap();

        assert_eq!(execution.return_value, 0.0);
    }
}
