// src/ir/optimizer/sccp/mod.rs
//! Sparse Conditional Constant Propagation.
//!
//! The Wegman–Zadeck algorithm combines constant folding with reachability:
//! a three-point lattice (`Top`, `Constant`, `Bottom`) per SSA value and an
//! executable flag per CFG edge descend monotonically to a fixed point,
//! after which the rewriter folds definitions, substitutes uses, resolves
//! branches and deletes unreachable blocks.
//!
//! The pass is idempotent: a second run finds nothing left to do.

pub mod evaluator;
pub mod lattice;
pub mod propagator;
pub mod rewriter;

pub use lattice::LatticeValue;
pub use propagator::{SccpAnalysis, SccpPropagator};

use super::Pass;
use crate::error::compile_error::IrError;
use crate::ir::Function;
use rewriter::SccpRewriter;
use std::fmt;

/// Counters describing one run of the pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SccpStats {
    /// Definitions replaced by a constant `Store`.
    pub constants_folded: usize,
    /// Conditional branches collapsed to plain jumps.
    pub branches_resolved: usize,
    /// Blocks deleted as unreachable.
    pub blocks_removed: usize,
    /// Blocks whose phi incoming maps lost entries.
    pub phi_entries_pruned: usize,
}

impl fmt::Display for SccpStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} constants folded, {} branches resolved, {} blocks removed",
            self.constants_folded, self.branches_resolved, self.blocks_removed
        )
    }
}

#[derive(Debug, Default)]
pub struct Sccp {
    pub stats: SccpStats,
}

impl Sccp {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for Sccp {
    fn name(&self) -> &'static str {
        "sccp"
    }

    fn run(&mut self, func: &mut Function) -> Result<bool, IrError> {
        let analysis = SccpPropagator::new(&func.cfg, &func.params).analyze();
        let changed = SccpRewriter::new(&analysis).rewrite(func, &mut self.stats);
        Ok(changed)
    }
}
