//! Constructors used by tree producers (the parser and the tests). Each one
//! takes ownership of its children, so a malformed node cannot be built.

use super::{BinaryOperatorKind, Block, Expression, Statement};
use crate::error::{CompileError, Result};

pub fn id_expr(name: impl Into<String>) -> Expression {
    Expression::Identifier { name: name.into() }
}

pub fn float_expr(value: f32) -> Expression {
    Expression::Float { value }
}

pub fn int_expr(value: i32) -> Expression {
    Expression::Integer { value }
}

pub fn bool_expr(value: bool) -> Expression {
    Expression::Boolean { value }
}

pub fn binop_expr(operator: BinaryOperatorKind, lhs: Expression, rhs: Expression) -> Expression {
    Expression::Binary {
        operator,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

pub fn assign_stmt(name: impl Into<String>, value: Expression) -> Statement {
    Statement::Assign {
        name: name.into(),
        value,
    }
}

pub fn if_stmt(condition: Expression, positive: Block, negative: Option<Block>) -> Statement {
    Statement::If {
        condition,
        positive,
        negative,
    }
}

pub fn while_stmt(condition: Expression, body: Block) -> Statement {
    Statement::While { condition, body }
}

pub fn break_stmt() -> Statement {
    Statement::Break
}

pub fn block(statements: impl IntoIterator<Item = Statement>) -> Block {
    statements.into_iter().collect()
}

/// Accumulates the statements of a block in source order.
///
/// Producers that must keep blocks small can set a capacity. Going past it
/// is reported as [`CompileError::BlockCapacityExceeded`] and leaves the
/// builder untouched, so the caller decides whether to give up.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    statements: Vec<Statement>,
    capacity: Option<usize>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            statements: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn append(&mut self, statement: Statement) -> Result<&mut Self> {
        if let Some(capacity) = self.capacity
            && self.statements.len() >= capacity
        {
            return Err(CompileError::BlockCapacityExceeded { capacity });
        }

        self.statements.push(statement);

        Ok(self)
    }

    pub fn finish(self) -> Block {
        Block::new(self.statements)
    }
}
