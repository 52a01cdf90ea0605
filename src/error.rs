use thiserror::Error;

use crate::{ast::BinaryOperatorKind, ir::BlockId};

/// Everything that can go wrong while building a tree or lowering it to IR.
/// Lowering stops at the first error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("use of undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String },

    #[error("`break` statement can only be used within loops")]
    BreakOutsideLoop,

    #[error("operator {operator} has no instruction mapping")]
    UnsupportedOperator { operator: BinaryOperatorKind },

    #[error("block cannot hold more than {capacity} statements")]
    BlockCapacityExceeded { capacity: usize },

    #[error("`{name}` is not a valid return variable name")]
    InvalidReturnVariable { name: String },

    #[error("malformed IR in {block}: {message}")]
    Verification { block: BlockId, message: String },
}

pub type Result<T, E = CompileError> = std::result::Result<T, E>;
