//! Lowers the tree to a control flow graph. The whole program becomes one
//! parameterless function returning `float`, whose result is whatever the
//! program left in its return variable.

mod expr;
mod stmt;

use tracing::{debug, info};

use crate::{
    ast::{self, BinaryOperatorClass, BinaryOperatorKind},
    error::{CompileError, Result},
    ir::{
        self, BlockId, BlockLabel, FloatOperator, FloatPredicate, FunctionBuilder,
        LogicalOperator, Operand, SlotId, Type,
        verify::verify_function,
    },
    symbol_table::SymbolTable,
};

/// How `&&` and `||` are lowered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum LogicalOperators {
    /// Both operands are always evaluated, then their truthiness is
    /// combined and widened back to 0.0 or 1.0
    #[default]
    Eager,
    /// Any logical operator fails with [`CompileError::UnsupportedOperator`]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodegenOptions {
    pub module_name: String,
    pub function_name: String,
    /// Variable whose final value the function returns. A program that never
    /// assigns it returns 0.0.
    pub return_variable: String,
    pub logical_operators: LogicalOperators,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            module_name: "flow".to_string(),
            function_name: "main".to_string(),
            return_variable: "return_value".to_string(),
            logical_operators: LogicalOperators::default(),
        }
    }
}

impl CodegenOptions {
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.return_variable) {
            return Err(CompileError::InvalidReturnVariable {
                name: self.return_variable.clone(),
            });
        }

        Ok(())
    }

    /// The instruction an operator lowers to, or `None` when it has no
    /// mapping under these options
    pub fn operator_lowering(&self, operator: BinaryOperatorKind) -> Option<OperatorLowering> {
        use BinaryOperatorKind::*;

        let lowering = match operator {
            Add => OperatorLowering::Arithmetic(FloatOperator::FAdd),
            Subtract => OperatorLowering::Arithmetic(FloatOperator::FSub),
            Multiply => OperatorLowering::Arithmetic(FloatOperator::FMul),
            Divide => OperatorLowering::Arithmetic(FloatOperator::FDiv),
            Equals => OperatorLowering::Comparison(FloatPredicate::Oeq),
            NotEquals => OperatorLowering::Comparison(FloatPredicate::One),
            GreaterThan => OperatorLowering::Comparison(FloatPredicate::Ogt),
            GreaterThanOrEqualTo => OperatorLowering::Comparison(FloatPredicate::Oge),
            LessThan => OperatorLowering::Comparison(FloatPredicate::Olt),
            LessThanOrEqualTo => OperatorLowering::Comparison(FloatPredicate::Ole),
            LogicalAnd => OperatorLowering::Logical(LogicalOperator::And),
            LogicalOr => OperatorLowering::Logical(LogicalOperator::Or),
        };

        match (operator.class(), self.logical_operators) {
            (BinaryOperatorClass::Logical, LogicalOperators::Unsupported) => None,
            _ => Some(lowering),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorLowering {
    Arithmetic(FloatOperator),
    /// An ordered comparison widened to 0.0 or 1.0
    Comparison(FloatPredicate),
    /// Combines the truthiness of both operands
    Logical(LogicalOperator),
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// State of one compilation: the function being built, the variables seen so
/// far and the loop a `break` currently leaves.
pub struct Generator<'options> {
    options: &'options CodegenOptions,
    builder: FunctionBuilder,
    symbols: SymbolTable,
    break_target: Option<BlockId>,
}

impl<'options> Generator<'options> {
    pub fn new(options: &'options CodegenOptions) -> Self {
        Self {
            options,
            builder: FunctionBuilder::new(options.function_name.clone(), Type::Float),
            symbols: SymbolTable::new(),
            break_target: None,
        }
    }

    pub fn break_target(&self) -> Option<BlockId> {
        self.break_target
    }

    fn create_block(&mut self, label: BlockLabel) -> BlockId {
        let id = self.builder.create_block(label);
        debug!(block = %id, %label, "created block");
        id
    }

    /// Runs `f` with `target` as the destination of `break`, restoring the
    /// previous destination afterwards whether or not `f` succeeded
    fn with_break_target<R>(&mut self, target: BlockId, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.break_target.replace(target);
        let result = f(self);
        self.break_target = previous;
        result
    }

    /// Slot of `name`, allocating it on first assignment. The return variable
    /// starts out as 0.0 so that a path that never assigns it still returns
    /// a defined value.
    fn variable_slot(&mut self, name: &str) -> SlotId {
        let initializer = (name == self.options.return_variable).then_some(Operand::ZERO);
        let builder = &mut self.builder;

        self.symbols.get_or_insert_with(name, || {
            let slot = builder.build_alloca(name, initializer);
            debug!(variable = name, "allocated slot");
            slot
        })
    }

    /// Gives the builder a block that can still take instructions. After a
    /// `break` the current block is closed, and whatever follows goes into a
    /// fresh block nothing jumps to.
    fn ensure_open_block(&mut self) {
        if self.builder.is_terminated() {
            let block = self.create_block(BlockLabel::Unreachable);
            self.builder.position_at_end(block);
        }
    }

    /// Closes the current block with a jump to `destination`, unless it is
    /// already terminated
    fn fall_through(&mut self, destination: BlockId) {
        if !self.builder.is_terminated() {
            self.builder.build_jump(destination);
        }
    }

    /// Emits the return of the function and hands it over
    pub fn finish_function(mut self) -> ir::Function {
        self.ensure_open_block();

        let value = match self.symbols.get(&self.options.return_variable) {
            Some(slot) => Operand::Value(self.builder.build_load(slot)),
            None => Operand::ZERO,
        };
        self.builder.build_return(value);

        self.builder.finish()
    }
}

/// Lowers `root` into a module holding a single verified function
pub fn lower_program(root: &ast::Block, options: &CodegenOptions) -> Result<ir::Module> {
    options.validate()?;

    let mut generator = Generator::new(options);
    generator.lower_block(root)?;

    let function = generator.finish_function();
    verify_function(&function)?;

    info!(
        function = %function.name,
        blocks = function.blocks.len(),
        slots = function.slots.len(),
        "lowered program"
    );

    Ok(ir::Module {
        name: options.module_name.clone(),
        functions: vec![function],
    })
}
