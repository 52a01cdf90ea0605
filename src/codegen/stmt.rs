use tracing::debug;

use super::Generator;
use crate::{
    ast::{Block, Expression, Statement},
    error::{CompileError, Result},
    ir::BlockLabel,
};

impl Generator<'_> {
    /// Lowers the statements of `block` in order. Blocks do not open a scope.
    pub fn lower_block(&mut self, block: &Block) -> Result<()> {
        for statement in &block.statements {
            self.lower_statement(statement)?;
        }

        Ok(())
    }

    pub fn lower_statement(&mut self, statement: &Statement) -> Result<()> {
        self.ensure_open_block();

        match statement {
            Statement::Assign { name, value } => self.lower_assign(name, value),
            Statement::If {
                condition,
                positive,
                negative,
            } => self.lower_if(condition, positive, negative.as_ref()),
            Statement::While { condition, body } => self.lower_while(condition, body),
            Statement::Break => self.lower_break(),
            Statement::Block(block) => self.lower_block(block),
        }
    }

    fn lower_assign(&mut self, name: &str, value: &Expression) -> Result<()> {
        // The right hand side is evaluated before the variable exists, so
        // `x = x` on a fresh `x` is an undeclared identifier
        let value = self.lower_expression(value)?;
        let slot = self.variable_slot(name);
        self.builder.build_store(slot, value);

        Ok(())
    }

    fn lower_if(
        &mut self,
        condition: &Expression,
        positive: &Block,
        negative: Option<&Block>,
    ) -> Result<()> {
        let condition = self.lower_expression(condition)?;
        let condition = self.truthiness(condition);

        let then_block = self.create_block(BlockLabel::Then);
        let else_block = negative.map(|_| self.create_block(BlockLabel::Else));
        let merge_block = self.create_block(BlockLabel::IfCont);

        // Without an else branch the false edge goes straight to the merge
        self.builder
            .build_branch(condition, then_block, else_block.unwrap_or(merge_block));

        self.builder.position_at_end(then_block);
        self.lower_block(positive)?;
        self.fall_through(merge_block);

        if let (Some(else_block), Some(negative)) = (else_block, negative) {
            self.builder.position_at_end(else_block);
            self.lower_block(negative)?;
            self.fall_through(merge_block);
        }

        self.builder.position_at_end(merge_block);

        Ok(())
    }

    fn lower_while(&mut self, condition: &Expression, body: &Block) -> Result<()> {
        let condition_block = self.create_block(BlockLabel::LoopCond);
        let body_block = self.create_block(BlockLabel::LoopBody);
        let exit_block = self.create_block(BlockLabel::LoopExit);

        self.builder.build_jump(condition_block);

        // The condition is evaluated again on every iteration
        self.builder.position_at_end(condition_block);
        let condition = self.lower_expression(condition)?;
        let condition = self.truthiness(condition);
        self.builder.build_branch(condition, body_block, exit_block);

        debug!(exit = %exit_block, "entering loop body");
        self.with_break_target(exit_block, |this| {
            this.builder.position_at_end(body_block);
            this.lower_block(body)?;
            this.fall_through(condition_block);
            Ok::<_, CompileError>(())
        })?;

        self.builder.position_at_end(exit_block);

        Ok(())
    }

    fn lower_break(&mut self) -> Result<()> {
        let target = self.break_target.ok_or(CompileError::BreakOutsideLoop)?;
        self.builder.build_jump(target);

        Ok(())
    }
}
