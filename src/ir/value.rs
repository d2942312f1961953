// src/ir/value.rs
use std::fmt;
use std::sync::Arc;

/// A named IR value.
///
/// Before SSA construction a value is just a base name: a source variable
/// (`a`) or a compiler temporary (`%0`). Renaming attaches a version, after
/// which identity is the `(base, version)` pair and each value has exactly
/// one defining instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SsaValue {
    pub base: Arc<str>,
    pub version: Option<u32>,
}

/// Sentinel base name for operands whose renaming stack was empty.
pub const UNDEF: &str = "undef";

impl SsaValue {
    #[must_use]
    pub fn named(base: &str) -> Self {
        Self { base: Arc::from(base), version: None }
    }

    #[must_use]
    pub const fn versioned(base: Arc<str>, version: u32) -> Self {
        Self { base, version: Some(version) }
    }

    /// The `undef` sentinel used for phi operands on paths that never
    /// define the variable.
    #[must_use]
    pub fn undef() -> Self {
        Self::named(UNDEF)
    }

    #[must_use]
    pub fn is_undef(&self) -> bool {
        self.base.as_ref() == UNDEF
    }

    /// Compiler temporaries are spelled `%k`.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.base.starts_with('%')
    }

    /// Returns the same value carrying `version`.
    #[must_use]
    pub fn with_version(&self, version: u32) -> Self {
        Self { base: self.base.clone(), version: Some(version) }
    }
}

impl fmt::Display for SsaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}_v{}", self.base, version),
            None => f.write_str(&self.base),
        }
    }
}

/// An instruction operand: an inline integer constant or a named value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Const(i64),
    Value(SsaValue),
}

impl Operand {
    #[must_use]
    pub const fn as_value(&self) -> Option<&SsaValue> {
        match self {
            Operand::Value(v) => Some(v),
            Operand::Const(_) => None,
        }
    }

    #[must_use]
    pub const fn as_const(&self) -> Option<i64> {
        match self {
            Operand::Const(c) => Some(*c),
            Operand::Value(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(c) => write!(f, "{c}"),
            Operand::Value(v) => v.fmt(f),
        }
    }
}
