// src/ir/verifier.rs
//! Optional IR verifier.
//!
//! Checks the structural and SSA invariants the passes rely on; tests run
//! it after every pass and the CLI enables it with `--verify`. A violation
//! is a compiler bug, so failures are fail-fast [`IrError`]s, never user
//! diagnostics.

use super::cfg::Cfg;
use super::dominance::DominanceInfo;
use super::function::Function;
use super::instruction::Instruction;
use super::value::{Operand, SsaValue};
use crate::error::compile_error::IrError;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefSite {
    /// Function parameter, defined on entry to the function.
    Param(NodeIndex),
    Phi(NodeIndex),
    Inst(NodeIndex, usize),
}

/// Structural CFG checks, valid before and after SSA construction:
/// terminators present, jump targets resolved, edges and jumps consistent.
pub fn verify_cfg(func: &Function) -> Result<(), IrError> {
    let cfg = &func.cfg;
    if cfg.entry_index().is_none() {
        return violation(func, "CFG has no entry block");
    }
    let exit = cfg.exit_index();

    let labels: HashSet<Arc<str>> = cfg.blocks().map(|b| b.label.clone()).collect();

    for idx in cfg.graph().node_indices() {
        let block = cfg.block(idx);
        if Some(idx) != exit && !block.has_terminator() {
            return violation(func, &format!("block '{}' has no terminator", block.label));
        }
        for target in block.jump_targets() {
            if !labels.contains(&target) {
                return violation(func, &format!("block '{}' jumps to unknown block '{target}'", block.label));
            }
            let target_idx = cfg.find_block_by_label(&target);
            if target_idx.is_none_or(|t| cfg.graph().find_edge(idx, t).is_none()) {
                return violation(func, &format!("jump {} -> {target} has no CFG edge", block.label));
            }
        }
        // Every outgoing edge is justified by a jump, or by a return for
        // the edge into the exit block.
        for succ in cfg.succs(idx) {
            let succ_label = cfg.block(succ).label.clone();
            let jumps_there = block.jump_targets().contains(&succ_label);
            let returns_there = Some(succ) == exit
                && matches!(block.instructions.last(), Some(Instruction::Return { .. }));
            if !jumps_there && !returns_there {
                return violation(
                    func,
                    &format!("edge {} -> {succ_label} has no matching terminator", block.label),
                );
            }
        }
    }
    Ok(())
}

/// Full SSA invariants on top of [`verify_cfg`]: single definitions,
/// phi completeness, and every use dominated by its definition.
pub fn verify_ssa(func: &Function) -> Result<(), IrError> {
    verify_cfg(func)?;

    let cfg = &func.cfg;
    let dominance = DominanceInfo::compute(cfg)?;
    let reachable: Vec<NodeIndex> = cfg.bfs_order();

    // Invariant 1: exactly one definition per value. Parameters count as
    // entry-block definitions with version 1.
    let mut defs: HashMap<SsaValue, DefSite> = HashMap::new();
    if let Some(entry) = cfg.entry_index() {
        for param in &func.params {
            defs.insert(SsaValue::versioned(param.clone(), 1), DefSite::Param(entry));
        }
    }
    for &idx in &reachable {
        let block = cfg.block(idx);
        for phi in &block.phi_nodes {
            if phi.lhs.version.is_none() {
                return violation(func, &format!("phi '{}' in '{}' was never renamed", phi.lhs, block.label));
            }
            if defs.insert(phi.lhs.clone(), DefSite::Phi(idx)).is_some() {
                return violation(func, &format!("value '{}' has multiple definitions", phi.lhs));
            }
        }
        for (pos, inst) in block.instructions.iter().enumerate() {
            if let Some(lhs) = inst.defined_value() {
                if lhs.version.is_none() {
                    return violation(func, &format!("value '{lhs}' in '{}' was never renamed", block.label));
                }
                if defs.insert(lhs.clone(), DefSite::Inst(idx, pos)).is_some() {
                    return violation(func, &format!("value '{lhs}' has multiple definitions"));
                }
            }
        }
    }

    // Invariant 3: one phi entry per predecessor, no strays.
    for &idx in &reachable {
        let block = cfg.block(idx);
        let pred_labels: HashSet<Arc<str>> =
            cfg.preds(idx).into_iter().map(|p| cfg.block(p).label.clone()).collect();
        for phi in &block.phi_nodes {
            let incoming: HashSet<Arc<str>> = phi.incoming.iter().map(|(label, _)| label.clone()).collect();
            if incoming.len() != phi.incoming.len() {
                return violation(func, &format!("phi '{}' has duplicate incoming labels", phi.lhs));
            }
            if incoming != pred_labels {
                return violation(
                    func,
                    &format!(
                        "phi '{}' in '{}' covers [{}] but predecessors are [{}]",
                        phi.lhs,
                        block.label,
                        join_labels(&incoming),
                        join_labels(&pred_labels)
                    ),
                );
            }
        }
    }

    // Invariant 2: uses dominated by definitions.
    for &idx in &reachable {
        let block = cfg.block(idx);
        for phi in &block.phi_nodes {
            for (pred_label, operand) in &phi.incoming {
                let Some(value) = used_value(operand) else { continue };
                let Some(pred) = cfg.find_block_by_label(pred_label) else { continue };
                match defs.get(value) {
                    None => return violation(func, &format!("phi operand '{value}' has no definition")),
                    Some(site) => {
                        // The operand for predecessor P must be available at
                        // the end of P.
                        if !dominance.dominates(site_block(site), pred) {
                            return violation(
                                func,
                                &format!("phi operand '{value}' does not dominate predecessor '{pred_label}'"),
                            );
                        }
                    }
                }
            }
        }
        for (pos, inst) in block.instructions.iter().enumerate() {
            for operand in inst.operands() {
                let Some(value) = used_value(operand) else { continue };
                match defs.get(value) {
                    None => return violation(func, &format!("use of undefined value '{value}'")),
                    Some(DefSite::Phi(def_block) | DefSite::Param(def_block)) => {
                        if !dominance.dominates(*def_block, idx) {
                            return violation(func, &format!("use of '{value}' not dominated by its definition"));
                        }
                    }
                    Some(DefSite::Inst(def_block, def_pos)) => {
                        let ok = if *def_block == idx { *def_pos < pos } else { dominance.dominates(*def_block, idx) };
                        if !ok {
                            return violation(func, &format!("use of '{value}' not dominated by its definition"));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn used_value(operand: &Operand) -> Option<&SsaValue> {
    operand.as_value().filter(|v| !v.is_undef())
}

const fn site_block(site: &DefSite) -> NodeIndex {
    match site {
        DefSite::Param(idx) | DefSite::Phi(idx) | DefSite::Inst(idx, _) => *idx,
    }
}

fn join_labels(labels: &HashSet<Arc<str>>) -> String {
    let mut sorted: Vec<&str> = labels.iter().map(AsRef::as_ref).collect();
    sorted.sort_by_key(|label| Cfg::block_number(label));
    sorted.join(", ")
}

fn violation(func: &Function, message: &str) -> Result<(), IrError> {
    Err(IrError::InvariantViolation(format!("{}: {message}", func.name)))
}
