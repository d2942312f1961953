// src/ir/generator.rs
//! AST → CFG lowering.
//!
//! The generator walks statements in source order, keeping a cursor on the
//! block under construction and a pair of stacks with the innermost loop's
//! break and continue targets. The produced IR is pre-SSA: operands are
//! source names or `%k` temporaries, and every control transfer links the
//! graph edge alongside the emitted jump.

use super::basic_block::BasicBlock;
use super::cfg::Cfg;
use super::function::Function;
use super::instruction::{Instruction, JumpKind, Operation};
use super::module::Module;
use super::value::{Operand, SsaValue};
use crate::error::compile_error::{CompileError, IrError};
use crate::parser::ast::{Block, Expr, FunctionDecl, Program, Stmt};
use std::sync::Arc;

pub struct IrGenerator {
    block_counter: u32,
    tmp_counter: u32,
    current: Arc<str>,
    cfg: Cfg,
    break_targets: Vec<Arc<str>>,
    continue_targets: Vec<Arc<str>>,
}

impl IrGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            block_counter: 0,
            tmp_counter: 0,
            current: Arc::from(""),
            cfg: Cfg::new("BB0", "BB1"),
            break_targets: Vec::new(),
            continue_targets: Vec::new(),
        }
    }

    /// Lowers every function of the program.
    pub fn generate(&mut self, program: &Program) -> Result<Module, CompileError> {
        let mut functions = Vec::with_capacity(program.functions.len());
        for func in &program.functions {
            let function = self
                .build_function(func)
                .map_err(|source| CompileError::IrError { function: func.name.clone(), source })?;
            functions.push(function);
        }
        Ok(Module::new(functions))
    }

    fn build_function(&mut self, func: &FunctionDecl) -> Result<Function, IrError> {
        self.block_counter = 2;
        self.tmp_counter = 0;
        self.break_targets.clear();
        self.continue_targets.clear();

        let mut cfg = Cfg::new("BB0", "BB1");
        cfg.add_block(BasicBlock::new("BB0", Some("entry")));
        cfg.add_block(BasicBlock::new("BB1", Some("exit")));
        self.current = cfg.entry_label.clone();
        self.cfg = cfg;

        self.build_block(&func.body)?;

        // A body that falls off its end returns implicitly.
        if !self.current_block()?.has_terminator() {
            self.emit(Instruction::Return { value: None })?;
            self.link_to(&self.cfg.exit_label.clone())?;
        }

        let mut cfg = std::mem::replace(&mut self.cfg, Cfg::new("BB0", "BB1"));
        // The finished CFG holds reachable blocks only (plus the exit
        // sentinel); dead cursor blocks from break/continue/return vanish.
        cfg.remove_unreachable_blocks();

        let params = func.parameters.iter().map(|p| Arc::from(p.name.as_str())).collect();
        Ok(Function::new(&func.name, params, func.return_type.into(), cfg))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn build_block(&mut self, block: &Block) -> Result<(), IrError> {
        for stmt in &block.statements {
            self.build_statement(stmt)?;
        }
        Ok(())
    }

    fn build_statement(&mut self, stmt: &Stmt) -> Result<(), IrError> {
        match stmt {
            Stmt::Declaration { name, value, .. } | Stmt::Assignment { name, value, .. } => {
                self.build_assignment(name, value)
            }
            Stmt::Call { name, args, .. } => self.build_call_statement(name, args),
            Stmt::If { condition, then_block, else_block, .. } => {
                self.build_condition(condition, then_block, else_block.as_ref())
            }
            Stmt::For { init, condition, update, body, .. } => self.build_for_loop(init, condition, update, body),
            Stmt::Loop { body, .. } => self.build_unconditional_loop(body),
            Stmt::Return { value, .. } => self.build_return(value.as_ref()),
            Stmt::Break { .. } => self.build_loop_exit("break", &self.break_targets.last().cloned()),
            Stmt::Continue { .. } => self.build_loop_exit("continue", &self.continue_targets.last().cloned()),
            Stmt::Block(block) => self.build_block(block),
        }
    }

    fn build_assignment(&mut self, name: &str, value: &Expr) -> Result<(), IrError> {
        let rhs = self.lower_operation(value)?;
        self.emit(Instruction::Assign { lhs: SsaValue::named(name), rhs })
    }

    /// A bare call statement still defines a temporary for its result.
    fn build_call_statement(&mut self, name: &str, args: &[Expr]) -> Result<(), IrError> {
        let mut operands = Vec::with_capacity(args.len());
        for arg in args {
            operands.push(self.lower_expr(arg)?);
        }
        let tmp = self.fresh_temp();
        self.emit(Instruction::Assign { lhs: tmp, rhs: Operation::Call { func: Arc::from(name), args: operands } })
    }

    fn build_condition(&mut self, condition: &Expr, then_block: &Block, else_block: Option<&Block>) -> Result<(), IrError> {
        let cond = self.lower_expr(condition)?;

        let then_label = self.new_block(Some("then"));
        let merge_label = self.new_block(Some("merge"));
        let else_label = if else_block.is_some() { Some(self.new_block(Some("else"))) } else { None };
        let false_label = else_label.clone().unwrap_or_else(|| merge_label.clone());

        self.emit(Instruction::Cmp { left: cond, right: Operand::Const(1) })?;
        self.emit(Instruction::Jump { kind: JumpKind::Jnz, target: then_label.clone() })?;
        self.emit(Instruction::Jump { kind: JumpKind::Jz, target: false_label.clone() })?;
        self.link_to(&then_label)?;
        self.link_to(&false_label)?;

        self.current = then_label;
        self.build_block(then_block)?;
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: merge_label.clone() })?;
        self.link_to(&merge_label)?;

        if let (Some(else_label), Some(else_block)) = (else_label, else_block) {
            self.current = else_label;
            self.build_block(else_block)?;
            self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: merge_label.clone() })?;
            self.link_to(&merge_label)?;
        }

        self.current = merge_label;
        Ok(())
    }

    fn build_for_loop(&mut self, init: &Stmt, condition: &Expr, update: &Stmt, body: &Block) -> Result<(), IrError> {
        let init_label = self.new_block(Some("loop init"));
        let header_label = self.new_block(Some("loop header"));
        let exit_label = self.new_block(Some("loop exit"));
        let body_label = self.new_block(Some("loop body"));
        let update_label = self.new_block(Some("loop update"));

        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: init_label.clone() })?;
        self.link_to(&init_label)?;

        self.current = init_label;
        self.build_statement(init)?;
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: header_label.clone() })?;
        self.link_to(&header_label)?;

        self.current = header_label.clone();
        let cond = self.lower_expr(condition)?;
        self.emit(Instruction::Cmp { left: cond, right: Operand::Const(1) })?;
        self.emit(Instruction::Jump { kind: JumpKind::Jnz, target: body_label.clone() })?;
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: exit_label.clone() })?;
        self.link_to(&body_label)?;
        self.link_to(&exit_label)?;

        self.break_targets.push(exit_label.clone());
        self.continue_targets.push(update_label.clone());

        self.current = body_label;
        self.build_block(body)?;
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: update_label.clone() })?;
        self.link_to(&update_label)?;

        self.current = update_label;
        self.build_statement(update)?;
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: header_label.clone() })?;
        self.link_to(&header_label)?;

        self.break_targets.pop();
        self.continue_targets.pop();
        self.current = exit_label;
        Ok(())
    }

    fn build_unconditional_loop(&mut self, body: &Block) -> Result<(), IrError> {
        let init_label = self.new_block(Some("loop init"));
        let body_label = self.new_block(Some("loop body"));
        let exit_label = self.new_block(Some("loop exit"));

        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: init_label.clone() })?;
        self.link_to(&init_label)?;

        self.current = init_label.clone();
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: body_label.clone() })?;
        self.link_to(&body_label)?;

        self.break_targets.push(exit_label.clone());
        self.continue_targets.push(init_label);

        self.current = body_label.clone();
        self.build_block(body)?;
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: body_label.clone() })?;
        self.link_to(&body_label)?;

        self.break_targets.pop();
        self.continue_targets.pop();
        self.current = exit_label;
        Ok(())
    }

    fn build_return(&mut self, value: Option<&Expr>) -> Result<(), IrError> {
        let operand = match value {
            Some(expr) => Some(self.lower_expr(expr)?),
            None => None,
        };
        self.emit(Instruction::Return { value: operand })?;
        self.link_to(&self.cfg.exit_label.clone())?;
        // Anything lowered after the return lands in a fresh, unreferenced
        // block and is dropped by the reachability cleanup.
        self.current = self.new_block(None);
        Ok(())
    }

    fn build_loop_exit(&mut self, keyword: &str, target: &Option<Arc<str>>) -> Result<(), IrError> {
        let Some(target) = target else {
            return Err(IrError::InputContractViolation(format!("'{keyword}' outside of a loop")));
        };
        self.emit(Instruction::Jump { kind: JumpKind::Jmp, target: target.clone() })?;
        self.link_to(target)?;
        self.current = self.new_block(None);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Lowers an expression used as the whole right-hand side of an
    /// assignment. Literals and identifiers become a `Store` instead of
    /// burning a temporary.
    fn lower_operation(&mut self, expr: &Expr) -> Result<Operation, IrError> {
        match expr {
            Expr::Literal { value, .. } => Ok(Operation::Store(Operand::Const(*value))),
            Expr::Variable { name, .. } => Ok(Operation::Store(Operand::Value(SsaValue::named(name)))),
            Expr::Binary { op, left, right, .. } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                Ok(Operation::Binary { op: (*op).into(), left, right })
            }
            Expr::Unary { op, expr, .. } => {
                let operand = self.lower_expr(expr)?;
                Ok(Operation::Unary { op: (*op).into(), operand })
            }
            Expr::Call { name, args, .. } => {
                let mut operands = Vec::with_capacity(args.len());
                for arg in args {
                    operands.push(self.lower_expr(arg)?);
                }
                Ok(Operation::Call { func: Arc::from(name.as_str()), args: operands })
            }
        }
    }

    /// Lowers a subexpression to an operand. Literals stay inline,
    /// identifiers are used by name, anything compound lands in a fresh
    /// `%k` temporary.
    fn lower_expr(&mut self, expr: &Expr) -> Result<Operand, IrError> {
        match expr {
            Expr::Literal { value, .. } => Ok(Operand::Const(*value)),
            Expr::Variable { name, .. } => Ok(Operand::Value(SsaValue::named(name))),
            compound => {
                let rhs = self.lower_operation(compound)?;
                let tmp = self.fresh_temp();
                self.emit(Instruction::Assign { lhs: tmp.clone(), rhs })?;
                Ok(Operand::Value(tmp))
            }
        }
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn fresh_temp(&mut self) -> SsaValue {
        let tmp = SsaValue::named(&format!("%{}", self.tmp_counter));
        self.tmp_counter += 1;
        tmp
    }

    fn new_block(&mut self, tag: Option<&'static str>) -> Arc<str> {
        let label = format!("BB{}", self.block_counter);
        self.block_counter += 1;
        self.cfg.add_block(BasicBlock::new(&label, tag));
        Arc::from(label)
    }

    fn current_block(&self) -> Result<&BasicBlock, IrError> {
        self.cfg
            .get_block(&self.current)
            .ok_or_else(|| IrError::InvariantViolation(format!("unknown block '{}'", self.current)))
    }

    fn emit(&mut self, instruction: Instruction) -> Result<(), IrError> {
        let label = self.current.clone();
        self.cfg
            .get_block_mut(&label)
            .ok_or_else(|| IrError::InvariantViolation(format!("unknown block '{label}'")))?
            .append(instruction);
        Ok(())
    }

    /// Adds the CFG edge for a control transfer out of the cursor block.
    fn link_to(&mut self, target: &Arc<str>) -> Result<(), IrError> {
        let current = self.current.clone();
        if self.cfg.connect(&current, target) {
            Ok(())
        } else {
            Err(IrError::InvariantViolation(format!("edge {current} -> {target} names an unknown block")))
        }
    }
}

impl Default for IrGenerator {
    fn default() -> Self {
        Self::new()
    }
}
