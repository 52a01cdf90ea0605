use tracing::trace;

use super::{Generator, OperatorLowering};
use crate::{
    ast::{BinaryOperatorKind, Expression},
    error::{CompileError, Result},
    ir::{FloatPredicate, Operand, ValueId},
};

impl Generator<'_> {
    /// Lowers an expression to the operand holding its value. Every source
    /// value is a `float`; comparisons and logical operators are widened to
    /// 0.0 or 1.0 before they are handed back.
    pub fn lower_expression(&mut self, expression: &Expression) -> Result<Operand> {
        match expression {
            Expression::Identifier { name } => {
                let slot = self
                    .symbols
                    .get(name)
                    .ok_or_else(|| CompileError::UndeclaredIdentifier { name: name.clone() })?;

                Ok(self.builder.build_load(slot).into())
            }
            Expression::Float { value } => Ok(Operand::Constant(*value)),
            Expression::Integer { value } => Ok(Operand::Constant(*value as f32)),
            Expression::Boolean { value } => Ok(Operand::Constant(if *value { 1.0 } else { 0.0 })),
            Expression::Binary { operator, lhs, rhs } => {
                // Both sides are always evaluated, left first
                let lhs = self.lower_expression(lhs)?;
                let rhs = self.lower_expression(rhs)?;

                self.lower_binary(*operator, lhs, rhs)
            }
        }
    }

    fn lower_binary(
        &mut self,
        operator: BinaryOperatorKind,
        lhs: Operand,
        rhs: Operand,
    ) -> Result<Operand> {
        let lowering = self
            .options
            .operator_lowering(operator)
            .ok_or(CompileError::UnsupportedOperator { operator })?;
        trace!(%operator, ?lowering, "binary operator");

        let result = match lowering {
            OperatorLowering::Arithmetic(op) => self.builder.build_binary(op, lhs, rhs),
            OperatorLowering::Comparison(predicate) => {
                let condition = self.builder.build_compare(predicate, lhs, rhs);
                self.builder.build_widen(condition)
            }
            OperatorLowering::Logical(op) => {
                let lhs = self.truthiness(lhs);
                let rhs = self.truthiness(rhs);
                let condition = self.builder.build_logical(op, lhs, rhs);
                self.builder.build_widen(condition)
            }
        };

        Ok(result.into())
    }

    /// `i1` that is true when `operand` is non-zero. NaN counts as false.
    pub(super) fn truthiness(&mut self, operand: Operand) -> ValueId {
        self.builder
            .build_compare(FloatPredicate::One, operand, Operand::ZERO)
    }
}
