// src/parser/precedence.rs
use crate::tokens::token_kind::TokenKind;

/// Binding powers for infix operators, Pratt style.
///
/// Left-associative operators have `left < right`, so the parser consumes
/// runs of the same operator left to right. A result of `(0, 0)` means the
/// token is not an infix operator.
#[must_use]
pub const fn binding_power(kind: &TokenKind) -> (u8, u8) {
    match kind {
        // Logical OR
        TokenKind::OrOr => (1, 2),

        // Logical AND
        TokenKind::AndAnd => (3, 4),

        // Equality
        TokenKind::EqualEqual | TokenKind::NotEqual => (5, 6),

        // Comparison
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => (7, 8),

        // Bitwise OR
        TokenKind::Or => (9, 10),

        // Bitwise XOR
        TokenKind::Xor => (11, 12),

        // Bitwise AND
        TokenKind::And => (13, 14),

        // Shift
        TokenKind::ShiftLeft | TokenKind::ShiftRight => (15, 16),

        // Add/Subtract
        TokenKind::Plus | TokenKind::Minus => (17, 18),

        // Multiply/Divide/Mod
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (19, 20),

        _ => (0, 0),
    }
}

/// Right binding power of prefix operators (`-`, `!`).
#[must_use]
pub const fn unary_binding_power(kind: &TokenKind) -> u8 {
    match kind {
        TokenKind::Not | TokenKind::Minus => 21,
        _ => 0,
    }
}
