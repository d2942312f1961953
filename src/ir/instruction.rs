// src/ir/instruction.rs
use super::value::{Operand, SsaValue};
use crate::parser::ast::{BinaryOp, UnaryOp};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrBinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    ShiftLeft,
    ShiftRight,
}

impl From<BinaryOp> for IrBinaryOp {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => IrBinaryOp::Add,
            BinaryOp::Subtract => IrBinaryOp::Subtract,
            BinaryOp::Multiply => IrBinaryOp::Multiply,
            BinaryOp::Divide => IrBinaryOp::Divide,
            BinaryOp::Modulo => IrBinaryOp::Modulo,
            BinaryOp::Equal => IrBinaryOp::Equal,
            BinaryOp::NotEqual => IrBinaryOp::NotEqual,
            BinaryOp::Less => IrBinaryOp::Less,
            BinaryOp::LessEqual => IrBinaryOp::LessEqual,
            BinaryOp::Greater => IrBinaryOp::Greater,
            BinaryOp::GreaterEqual => IrBinaryOp::GreaterEqual,
            BinaryOp::And => IrBinaryOp::And,
            BinaryOp::Or => IrBinaryOp::Or,
            BinaryOp::BitwiseAnd => IrBinaryOp::BitwiseAnd,
            BinaryOp::BitwiseOr => IrBinaryOp::BitwiseOr,
            BinaryOp::BitwiseXor => IrBinaryOp::BitwiseXor,
            BinaryOp::ShiftLeft => IrBinaryOp::ShiftLeft,
            BinaryOp::ShiftRight => IrBinaryOp::ShiftRight,
        }
    }
}

impl fmt::Display for IrBinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrBinaryOp::Add => f.write_str("+"),
            IrBinaryOp::Subtract => f.write_str("-"),
            IrBinaryOp::Multiply => f.write_str("*"),
            IrBinaryOp::Divide => f.write_str("/"),
            IrBinaryOp::Modulo => f.write_str("%"),
            IrBinaryOp::Equal => f.write_str("=="),
            IrBinaryOp::NotEqual => f.write_str("!="),
            IrBinaryOp::Less => f.write_str("<"),
            IrBinaryOp::LessEqual => f.write_str("<="),
            IrBinaryOp::Greater => f.write_str(">"),
            IrBinaryOp::GreaterEqual => f.write_str(">="),
            IrBinaryOp::And => f.write_str("&&"),
            IrBinaryOp::Or => f.write_str("||"),
            IrBinaryOp::BitwiseAnd => f.write_str("&"),
            IrBinaryOp::BitwiseOr => f.write_str("|"),
            IrBinaryOp::BitwiseXor => f.write_str("^"),
            IrBinaryOp::ShiftLeft => f.write_str("<<"),
            IrBinaryOp::ShiftRight => f.write_str(">>"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrUnaryOp {
    Negate,
    Not,
}

impl From<UnaryOp> for IrUnaryOp {
    fn from(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Negate => IrUnaryOp::Negate,
            UnaryOp::Not => IrUnaryOp::Not,
        }
    }
}

impl fmt::Display for IrUnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrUnaryOp::Negate => f.write_str("-"),
            IrUnaryOp::Not => f.write_str("!"),
        }
    }
}

/// The right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Materializes a constant or copies a value. Prints as the bare
    /// operand (`a_v1 = 0`).
    Store(Operand),
    Binary { op: IrBinaryOp, left: Operand, right: Operand },
    Unary { op: IrUnaryOp, operand: Operand },
    /// Function call; may have side effects and is never removed by DCE.
    Call { func: Arc<str>, args: Vec<Operand> },
}

impl Operation {
    /// Calls are the only impure operation in the IR.
    #[must_use]
    pub const fn is_pure(&self) -> bool {
        !matches!(self, Operation::Call { .. })
    }

    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Operation::Store(operand) | Operation::Unary { operand, .. } => vec![operand],
            Operation::Binary { left, right, .. } => vec![left, right],
            Operation::Call { args, .. } => args.iter().collect(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Operand> {
        match self {
            Operation::Store(operand) | Operation::Unary { operand, .. } => vec![operand],
            Operation::Binary { left, right, .. } => vec![left, right],
            Operation::Call { args, .. } => args.iter_mut().collect(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Store(operand) => operand.fmt(f),
            Operation::Binary { op, left, right } => write!(f, "{left} {op} {right}"),
            Operation::Unary { op, operand } => write!(f, "{op}{operand}"),
            Operation::Call { func, args } => {
                let args_str = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "{func}({args_str})")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    /// Unconditional jump.
    Jmp,
    /// Jump if the condition flag is set.
    Jnz,
    /// Jump if the condition flag is clear.
    Jz,
}

impl fmt::Display for JumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpKind::Jmp => f.write_str("jmp"),
            JumpKind::Jnz => f.write_str("jnz"),
            JumpKind::Jz => f.write_str("jz"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `lhs = rhs`; the unique definition of `lhs` once in SSA form.
    Assign { lhs: SsaValue, rhs: Operation },
    /// Sets the condition flag to `left == right`, consumed by the next
    /// conditional jump.
    Cmp { left: Operand, right: Operand },
    Jump { kind: JumpKind, target: Arc<str> },
    Return { value: Option<Operand> },
}

impl Instruction {
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Jump { .. } | Instruction::Return { .. })
    }

    /// The value this instruction defines, if any.
    #[must_use]
    pub const fn defined_value(&self) -> Option<&SsaValue> {
        match self {
            Instruction::Assign { lhs, .. } => Some(lhs),
            _ => None,
        }
    }

    pub fn operands(&self) -> Vec<&Operand> {
        match self {
            Instruction::Assign { rhs, .. } => rhs.operands(),
            Instruction::Cmp { left, right } => vec![left, right],
            Instruction::Jump { .. } => Vec::new(),
            Instruction::Return { value } => value.iter().collect(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Operand> {
        match self {
            Instruction::Assign { rhs, .. } => rhs.operands_mut(),
            Instruction::Cmp { left, right } => vec![left, right],
            Instruction::Jump { .. } => Vec::new(),
            Instruction::Return { value } => value.iter_mut().collect(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { lhs, rhs } => write!(f, "{lhs} = {rhs}"),
            Instruction::Cmp { left, right } => write!(f, "cmp({left}, {right})"),
            Instruction::Jump { kind, target } => write!(f, "{kind} {target}"),
            Instruction::Return { value: Some(v) } => write!(f, "return({v})"),
            Instruction::Return { value: None } => f.write_str("return"),
        }
    }
}

/// A φ-function. Lives in a block's phi list rather than its instruction
/// list and logically executes on block entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiNode {
    pub lhs: SsaValue,
    /// One `(predecessor label, operand)` entry per predecessor, in the
    /// order renaming visited the predecessors.
    pub incoming: Vec<(Arc<str>, Operand)>,
}

impl PhiNode {
    #[must_use]
    pub fn new(base: &str) -> Self {
        Self { lhs: SsaValue::named(base), incoming: Vec::new() }
    }

    /// Records or overwrites the operand flowing in from `pred`.
    pub fn set_incoming(&mut self, pred: Arc<str>, operand: Operand) {
        if let Some(entry) = self.incoming.iter_mut().find(|(label, _)| *label == pred) {
            entry.1 = operand;
        } else {
            self.incoming.push((pred, operand));
        }
    }
}

impl fmt::Display for PhiNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let incoming_str =
            self.incoming.iter().map(|(label, v)| format!("{label}: {v}")).collect::<Vec<_>>().join(", ");
        write!(f, "{} = ϕ({incoming_str})", self.lhs)
    }
}
