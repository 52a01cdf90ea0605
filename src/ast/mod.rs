//! Syntax tree handed to the backend by the external parser. The tree is
//! split into expressions, which produce a value, and statements, which are
//! executed for their effect. Both are closed sets so every consumer matches
//! them exhaustively.

use serde::{Deserialize, Serialize};

pub mod build;

pub use build::BlockBuilder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Identifier {
        name: String,
    },
    Float {
        value: f32,
    },
    Integer {
        value: i32,
    },
    Boolean {
        value: bool,
    },
    Binary {
        operator: BinaryOperatorKind,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Assign {
        name: String,
        value: Expression,
    },
    If {
        condition: Expression,
        positive: Block,
        negative: Option<Block>,
    },
    While {
        condition: Expression,
        body: Block,
    },
    Break,
    Block(Block),
}

/// An ordered sequence of statements. Blocks do not introduce a scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl FromIterator<Statement> for Block {
    fn from_iter<T: IntoIterator<Item = Statement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Operator tags as the parser names them. Parsing from a string also accepts
/// the symbolic spelling.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum BinaryOperatorKind {
    #[strum(to_string = "PLUS", serialize = "+")]
    #[serde(rename = "PLUS", alias = "+")]
    Add,
    #[strum(to_string = "MINUS", serialize = "-")]
    #[serde(rename = "MINUS", alias = "-")]
    Subtract,
    #[strum(to_string = "TIMES", serialize = "*")]
    #[serde(rename = "TIMES", alias = "*")]
    Multiply,
    #[strum(to_string = "DIVIDEDBY", serialize = "/")]
    #[serde(rename = "DIVIDEDBY", alias = "/")]
    Divide,
    #[strum(to_string = "EQ", serialize = "==")]
    #[serde(rename = "EQ", alias = "==")]
    Equals,
    #[strum(to_string = "NEQ", serialize = "!=")]
    #[serde(rename = "NEQ", alias = "!=")]
    NotEquals,
    #[strum(to_string = "GT", serialize = ">")]
    #[serde(rename = "GT", alias = ">")]
    GreaterThan,
    #[strum(to_string = "GTE", serialize = ">=")]
    #[serde(rename = "GTE", alias = ">=")]
    GreaterThanOrEqualTo,
    #[strum(to_string = "LT", serialize = "<")]
    #[serde(rename = "LT", alias = "<")]
    LessThan,
    #[strum(to_string = "LTE", serialize = "<=")]
    #[serde(rename = "LTE", alias = "<=")]
    LessThanOrEqualTo,
    #[strum(to_string = "AND", serialize = "&&")]
    #[serde(rename = "AND", alias = "&&")]
    LogicalAnd,
    #[strum(to_string = "OR", serialize = "||")]
    #[serde(rename = "OR", alias = "||")]
    LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperatorClass {
    Arithmetic,
    Comparison,
    Logical,
}

impl BinaryOperatorKind {
    pub fn class(self) -> BinaryOperatorClass {
        match self {
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => {
                BinaryOperatorClass::Arithmetic
            }
            Self::Equals
            | Self::NotEquals
            | Self::GreaterThan
            | Self::GreaterThanOrEqualTo
            | Self::LessThan
            | Self::LessThanOrEqualTo => BinaryOperatorClass::Comparison,
            Self::LogicalAnd | Self::LogicalOr => BinaryOperatorClass::Logical,
        }
    }
}
