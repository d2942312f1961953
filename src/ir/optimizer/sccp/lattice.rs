// src/ir/optimizer/sccp/lattice.rs
//! Lattice cells for sparse conditional constant propagation.

use std::fmt;

/// The compile-time state of an SSA value.
///
/// Cells only ever descend Top → Constant → Bottom, which bounds the
/// propagation at two moves per value and guarantees termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatticeValue {
    /// Not yet observed on any executable path.
    Top,
    /// Proven compile-time constant.
    Constant(i64),
    /// Known to vary at runtime (or opaque, like a call result).
    Bottom,
}

impl LatticeValue {
    /// Meet of two cells:
    /// - `Top ⊓ x = x`
    /// - `Bottom ⊓ x = Bottom`
    /// - `Const(a) ⊓ Const(a) = Const(a)`, differing constants collapse to
    ///   `Bottom`.
    #[must_use]
    pub const fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::Top, x) | (x, Self::Top) => x,
            (Self::Bottom, _) | (_, Self::Bottom) => Self::Bottom,
            (Self::Constant(a), Self::Constant(b)) => {
                if a == b { Self::Constant(a) } else { Self::Bottom }
            }
        }
    }

    #[must_use]
    pub const fn as_constant(self) -> Option<i64> {
        match self {
            Self::Constant(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_bottom(self) -> bool {
        matches!(self, Self::Bottom)
    }

    #[must_use]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::Top)
    }
}

impl fmt::Display for LatticeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("⊤"),
            Self::Constant(c) => write!(f, "const({c})"),
            Self::Bottom => f.write_str("⊥"),
        }
    }
}
