// src/ir/types.rs
use crate::parser::ast::Type;
use std::fmt;

/// IR-level types. Opal only distinguishes `int` results from `void`
/// functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    Int,
    Void,
}

impl From<Type> for IrType {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => IrType::Int,
            Type::Void => IrType::Void,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Int => f.write_str("int"),
            IrType::Void => f.write_str("void"),
        }
    }
}
