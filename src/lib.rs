//! `flowc` lowers the syntax tree of a small imperative language into an
//! LLVM style control flow graph and hands it to the LLVM toolchain.
//!
//! ```
//! use flowc::{
//!     ast::{BinaryOperatorKind, build::*},
//!     codegen::{CodegenOptions, lower_program},
//!     ir::eval::{DEFAULT_STEP_LIMIT, evaluate},
//! };
//!
//! let program = block([assign_stmt(
//!     "return_value",
//!     binop_expr(BinaryOperatorKind::Multiply, int_expr(6), float_expr(7.0)),
//! )]);
//!
//! let module = lower_program(&program, &CodegenOptions::default()).unwrap();
//! let execution = evaluate(&module.functions[0], DEFAULT_STEP_LIMIT).unwrap();
//! assert_eq!(execution.return_value, 42.0);
//! ```

pub mod ast;
pub mod backend;
pub mod codegen;
pub mod error;
pub mod graphviz;
pub mod index;
pub mod ir;
pub mod logger;
pub mod symbol_table;

pub use error::{CompileError, Result};
