// src/ir/optimizer/mod.rs
//! The optimization pipeline.
//!
//! Passes implement [`Pass`] and report whether they changed the IR; the
//! driver runs SCCP → LICM → DCE rounds per function until a full round is
//! quiet, bounded by [`PipelineConfig::max_iterations`]. A failure in one
//! function is reported and does not stop the others.

pub mod dce;
pub mod licm;
pub mod sccp;

pub use dce::DeadCodeElimination;
pub use licm::Licm;
pub use sccp::Sccp;

use super::function::Function;
use super::module::Module;
use super::verifier;
use crate::error::compile_error::{CompileError, IrError};

pub trait Pass {
    fn name(&self) -> &'static str;
    /// Runs the pass; `Ok(true)` means the IR changed.
    fn run(&mut self, func: &mut Function) -> Result<bool, IrError>;
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Upper bound on pass rounds per function.
    pub max_iterations: usize,
    /// Re-verify the SSA invariants after every pass.
    pub verify: bool,
    /// Report per-pass statistics to stderr.
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_iterations: 4, verify: false, verbose: false }
    }
}

/// Optimizes one function to a fixed point. Returns the number of rounds
/// run.
pub fn optimize_function(func: &mut Function, config: &PipelineConfig) -> Result<usize, IrError> {
    let mut sccp = Sccp::new();
    let mut licm = Licm::new();
    let mut dce = DeadCodeElimination::new();

    let mut rounds = 0;
    while rounds < config.max_iterations {
        rounds += 1;
        let mut changed = false;
        let passes: [&mut dyn Pass; 3] = [&mut sccp, &mut licm, &mut dce];
        for pass in passes {
            changed |= pass.run(func)?;
            if config.verify {
                verifier::verify_ssa(func)?;
            }
        }
        if !changed {
            break;
        }
    }

    if config.verbose {
        eprintln!("[opt] {}: {} round(s); sccp: {}; licm: {}; dce: {}", func.name, rounds, sccp.stats, licm.stats, dce.stats);
    }
    Ok(rounds)
}

/// Optimizes every function of the module, collecting per-function
/// failures instead of aborting the whole compilation.
pub fn optimize_module(module: &mut Module, config: &PipelineConfig) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for func in &mut module.functions {
        if let Err(source) = optimize_function(func, config) {
            errors.push(CompileError::IrError { function: func.name.clone(), source });
        }
    }
    errors
}
