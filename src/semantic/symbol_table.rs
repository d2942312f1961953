// src/semantic/symbol_table.rs
use crate::location::source_span::SourceSpan;
use crate::parser::ast::Type;
use std::collections::HashMap;

/// A declared function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSymbol {
    pub name: String,
    pub param_count: usize,
    pub return_type: Type,
    pub defined_at: SourceSpan,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSymbol {
    pub name: String,
    pub ty: Type,
    pub defined_at: SourceSpan,
}

/// Lexically scoped symbol table: one global function namespace plus a
/// stack of variable scopes.
#[derive(Debug, Default)]
pub struct SymbolTable {
    functions: HashMap<String, FunctionSymbol>,
    scopes: Vec<HashMap<String, VariableSymbol>>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function; returns the previous symbol if `name` was
    /// already declared.
    pub fn declare_function(&mut self, symbol: FunctionSymbol) -> Option<FunctionSymbol> {
        let existing = self.functions.get(&symbol.name).cloned();
        if existing.is_none() {
            self.functions.insert(symbol.name.clone(), symbol);
        }
        existing
    }

    #[must_use]
    pub fn lookup_function(&self, name: &str) -> Option<&FunctionSymbol> {
        self.functions.get(name)
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares a variable in the innermost scope; returns `false` if the
    /// name is already taken in that scope.
    pub fn declare_variable(&mut self, symbol: VariableSymbol) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return false;
        };
        if scope.contains_key(&symbol.name) {
            return false;
        }
        scope.insert(symbol.name.clone(), symbol);
        true
    }

    /// Looks a variable up through the scope stack, innermost first.
    #[must_use]
    pub fn lookup_variable(&self, name: &str) -> Option<&VariableSymbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}
