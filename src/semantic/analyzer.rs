// src/semantic/analyzer.rs
//! Semantic analysis: name resolution, arity checking and return-type
//! compatibility.
//!
//! Runs in two passes so functions may call each other regardless of
//! definition order: the first pass records every function signature, the
//! second checks bodies against them. All diagnostics are collected; the
//! analyzer never aborts early.

use crate::error::compile_error::CompileError;
use crate::location::source_span::SourceSpan;
use crate::parser::ast::*;
use crate::semantic::symbol_table::{FunctionSymbol, SymbolTable, VariableSymbol};

pub struct SemanticAnalyzer {
    symbol_table: SymbolTable,
    errors: Vec<CompileError>,
    current_function: Option<FunctionSymbol>,
    loop_depth: usize,
}

impl SemanticAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self { symbol_table: SymbolTable::new(), errors: Vec::new(), current_function: None, loop_depth: 0 }
    }

    /// Analyzes a program and returns all semantic errors found.
    pub fn analyze(&mut self, program: &Program) -> Vec<CompileError> {
        // First pass: declare every function signature.
        for func in &program.functions {
            let symbol = FunctionSymbol {
                name: func.name.clone(),
                param_count: func.parameters.len(),
                return_type: func.return_type,
                defined_at: func.span.clone(),
            };
            if self.symbol_table.declare_function(symbol).is_some() {
                self.error(format!("Function '{}' already declared", func.name), &func.span);
            }
        }

        // Second pass: check bodies.
        for func in &program.functions {
            self.check_function(func);
        }

        std::mem::take(&mut self.errors)
    }

    fn check_function(&mut self, func: &FunctionDecl) {
        self.current_function = self.symbol_table.lookup_function(&func.name).cloned();
        self.loop_depth = 0;

        self.symbol_table.push_scope();
        for param in &func.parameters {
            let symbol =
                VariableSymbol { name: param.name.clone(), ty: param.ty, defined_at: param.span.clone() };
            if !self.symbol_table.declare_variable(symbol) {
                self.error(format!("Variable '{}' already declared in this scope", param.name), &param.span);
            }
        }
        self.check_block_statements(&func.body);
        self.symbol_table.pop_scope();

        self.current_function = None;
    }

    /// Checks a block's statements in the current scope.
    fn check_block_statements(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.check_statement(stmt);
        }
    }

    /// Checks a block inside a scope of its own.
    fn check_scoped_block(&mut self, block: &Block) {
        self.symbol_table.push_scope();
        self.check_block_statements(block);
        self.symbol_table.pop_scope();
    }

    fn check_statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declaration { name, ty, value, span } => {
                self.check_expression(value);
                let symbol = VariableSymbol { name: name.clone(), ty: *ty, defined_at: span.clone() };
                if !self.symbol_table.declare_variable(symbol) {
                    self.error(format!("Variable '{name}' already declared in this scope"), span);
                }
            }
            Stmt::Assignment { name, value, span } => {
                if self.symbol_table.lookup_variable(name).is_none() {
                    self.error(format!("Variable '{name}' is not declared"), span);
                }
                self.check_expression(value);
            }
            Stmt::Call { name, args, span } => {
                self.check_call(name, args, span);
            }
            Stmt::If { condition, then_block, else_block, .. } => {
                self.check_expression(condition);
                self.check_scoped_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_scoped_block(else_block);
                }
            }
            Stmt::For { init, condition, update, body, .. } => {
                // The init scope covers condition, update and body.
                self.symbol_table.push_scope();
                self.check_statement(init);
                self.check_expression(condition);
                self.check_statement(update);
                self.loop_depth += 1;
                self.check_scoped_block(body);
                self.loop_depth -= 1;
                self.symbol_table.pop_scope();
            }
            Stmt::Loop { body, .. } => {
                self.loop_depth += 1;
                self.check_scoped_block(body);
                self.loop_depth -= 1;
            }
            Stmt::Return { value, span } => self.check_return(value.as_ref(), span),
            Stmt::Break { span } => {
                if self.loop_depth == 0 {
                    self.error("'break' used outside of a loop".to_string(), span);
                }
            }
            Stmt::Continue { span } => {
                if self.loop_depth == 0 {
                    self.error("'continue' used outside of a loop".to_string(), span);
                }
            }
            Stmt::Block(block) => self.check_scoped_block(block),
        }
    }

    fn check_return(&mut self, value: Option<&Expr>, span: &SourceSpan) {
        if let Some(expr) = value {
            self.check_expression(expr);
        }
        let Some(function) = self.current_function.clone() else {
            return;
        };
        match (function.return_type, value) {
            (Type::Void, Some(_)) => {
                self.error(format!("Function '{}' returns void, but return statement has a value", function.name), span);
            }
            (Type::Int, None) => {
                self.error(format!("Function '{}' expects return type int, but got void", function.name), span);
            }
            _ => {}
        }
    }

    fn check_call(&mut self, name: &str, args: &[Expr], span: &SourceSpan) {
        for arg in args {
            self.check_expression(arg);
        }
        match self.symbol_table.lookup_function(name) {
            None => self.error(format!("Function '{name}' is not declared"), span),
            Some(function) => {
                if function.param_count != args.len() {
                    let expected = function.param_count;
                    self.error(
                        format!("Function '{name}' expects {expected} arguments, but got {}", args.len()),
                        span,
                    );
                }
            }
        }
    }

    fn check_expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Binary { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
            Expr::Unary { expr, .. } => self.check_expression(expr),
            Expr::Literal { .. } => {}
            Expr::Variable { name, span } => {
                if self.symbol_table.lookup_variable(name).is_none() {
                    self.error(format!("Variable '{name}' is not declared"), span);
                }
            }
            Expr::Call { name, args, span } => self.check_call(name, args, span),
        }
    }

    fn error(&mut self, message: String, span: &SourceSpan) {
        self.errors.push(CompileError::SemanticError { message, span: span.clone() });
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
