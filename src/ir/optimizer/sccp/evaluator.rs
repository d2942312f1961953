// src/ir/optimizer/sccp/evaluator.rs
//! Constant folding of single operations.
//!
//! Integer semantics are two's-complement `i64` with wrapping overflow.
//! Division and modulo by zero return `None` so the caller leaves the
//! instruction alone and runtime behavior is preserved.

use crate::ir::{IrBinaryOp, IrUnaryOp};

#[must_use]
pub fn fold_binary(op: IrBinaryOp, left: i64, right: i64) -> Option<i64> {
    let result = match op {
        IrBinaryOp::Add => left.wrapping_add(right),
        IrBinaryOp::Subtract => left.wrapping_sub(right),
        IrBinaryOp::Multiply => left.wrapping_mul(right),
        IrBinaryOp::Divide => {
            if right == 0 {
                return None;
            }
            left.wrapping_div(right)
        }
        IrBinaryOp::Modulo => {
            if right == 0 {
                return None;
            }
            left.wrapping_rem(right)
        }
        IrBinaryOp::Equal => i64::from(left == right),
        IrBinaryOp::NotEqual => i64::from(left != right),
        IrBinaryOp::Less => i64::from(left < right),
        IrBinaryOp::LessEqual => i64::from(left <= right),
        IrBinaryOp::Greater => i64::from(left > right),
        IrBinaryOp::GreaterEqual => i64::from(left >= right),
        // Logical operators are eager: 0/1 from the operands' truth values.
        IrBinaryOp::And => i64::from(left != 0 && right != 0),
        IrBinaryOp::Or => i64::from(left != 0 || right != 0),
        IrBinaryOp::BitwiseAnd => left & right,
        IrBinaryOp::BitwiseOr => left | right,
        IrBinaryOp::BitwiseXor => left ^ right,
        // The shift amount is masked to 0..63, like the hardware would.
        IrBinaryOp::ShiftLeft => left.wrapping_shl(right as u32),
        IrBinaryOp::ShiftRight => left.wrapping_shr(right as u32),
    };
    Some(result)
}

#[must_use]
pub const fn fold_unary(op: IrUnaryOp, operand: i64) -> i64 {
    match op {
        IrUnaryOp::Negate => operand.wrapping_neg(),
        IrUnaryOp::Not => (operand == 0) as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_arithmetic() {
        assert_eq!(fold_binary(IrBinaryOp::Add, 2, 3), Some(5));
        assert_eq!(fold_binary(IrBinaryOp::Multiply, 7, 3), Some(21));
        assert_eq!(fold_binary(IrBinaryOp::Subtract, 2, 5), Some(-3));
        assert_eq!(fold_binary(IrBinaryOp::Modulo, 9, 4), Some(1));
    }

    #[test]
    fn comparisons_yield_zero_or_one() {
        assert_eq!(fold_binary(IrBinaryOp::Less, 0, 0), Some(0));
        assert_eq!(fold_binary(IrBinaryOp::Equal, 5, 5), Some(1));
        assert_eq!(fold_binary(IrBinaryOp::GreaterEqual, 4, 5), Some(0));
    }

    #[test]
    fn logical_operators_are_eager_truth_tables() {
        assert_eq!(fold_binary(IrBinaryOp::And, 2, 3), Some(1));
        assert_eq!(fold_binary(IrBinaryOp::And, 2, 0), Some(0));
        assert_eq!(fold_binary(IrBinaryOp::Or, 0, 0), Some(0));
        assert_eq!(fold_binary(IrBinaryOp::Or, 0, 9), Some(1));
    }

    #[test]
    fn division_by_zero_never_folds() {
        assert_eq!(fold_binary(IrBinaryOp::Divide, 1, 0), None);
        assert_eq!(fold_binary(IrBinaryOp::Modulo, 1, 0), None);
    }

    #[test]
    fn overflow_wraps() {
        assert_eq!(fold_binary(IrBinaryOp::Add, i64::MAX, 1), Some(i64::MIN));
        assert_eq!(fold_unary(IrUnaryOp::Negate, i64::MIN), i64::MIN);
    }

    #[test]
    fn unary_not_is_logical() {
        assert_eq!(fold_unary(IrUnaryOp::Not, 0), 1);
        assert_eq!(fold_unary(IrUnaryOp::Not, 42), 0);
    }
}
