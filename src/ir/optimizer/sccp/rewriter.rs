// src/ir/optimizer/sccp/rewriter.rs
//! IR rewriting after the SCCP fixed point.
//!
//! Folded definitions become `Store(const)`, constant values are
//! substituted at their use sites, decided branches collapse to plain
//! jumps, and blocks without an executable in-edge are deleted. Phi
//! incoming maps drop every entry whose edge went away, so phi
//! completeness survives the pruning.

use super::SccpStats;
use super::propagator::SccpAnalysis;
use crate::ir::{Cfg, Function, Instruction, JumpKind, Operand, Operation, TerminatorView};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use std::sync::Arc;

pub struct SccpRewriter<'a> {
    analysis: &'a SccpAnalysis,
    changed: bool,
}

impl<'a> SccpRewriter<'a> {
    #[must_use]
    pub const fn new(analysis: &'a SccpAnalysis) -> Self {
        Self { analysis, changed: false }
    }

    /// Applies the analysis to the function. Returns whether the IR
    /// changed.
    pub fn rewrite(mut self, func: &mut Function, stats: &mut SccpStats) -> bool {
        let visited: Vec<NodeIndex> =
            func.cfg.graph().node_indices().filter(|idx| self.analysis.visited.contains(idx)).collect();

        for idx in visited {
            self.rewrite_phis(&mut func.cfg, idx, stats);
            self.rewrite_instructions(&mut func.cfg, idx, stats);
            self.rewrite_terminator(&mut func.cfg, idx, stats);
        }

        self.remove_unreachable(&mut func.cfg, stats);
        self.changed
    }

    /// Prunes non-executable incoming entries and substitutes constants in
    /// the ones that stay.
    fn rewrite_phis(&mut self, cfg: &mut Cfg, idx: NodeIndex, stats: &mut SccpStats) {
        let executable_preds: HashSet<Arc<str>> = cfg
            .preds(idx)
            .into_iter()
            .filter(|&p| self.analysis.executable_edges.contains(&(p, idx)))
            .map(|p| cfg.block(p).label.clone())
            .collect();

        let analysis = self.analysis;
        let mut changed = false;
        if let Some(block) = cfg.graph_mut().node_weight_mut(idx) {
            for phi in &mut block.phi_nodes {
                let before = phi.incoming.len();
                phi.incoming.retain(|(pred, _)| executable_preds.contains(pred));
                changed |= phi.incoming.len() != before;
                for (_, operand) in &mut phi.incoming {
                    changed |= substitute(analysis, operand);
                }
            }
        }
        if changed {
            stats.phi_entries_pruned += 1;
            self.changed = true;
        }
    }

    fn rewrite_instructions(&mut self, cfg: &mut Cfg, idx: NodeIndex, stats: &mut SccpStats) {
        let analysis = self.analysis;
        let mut folded = 0usize;
        let mut changed = false;
        if let Some(block) = cfg.graph_mut().node_weight_mut(idx) {
            for inst in &mut block.instructions {
                if let Instruction::Assign { lhs, rhs } = inst {
                    if let Some(constant) = analysis.cell(lhs).as_constant() {
                        let store = Operation::Store(Operand::Const(constant));
                        if *rhs != store {
                            *rhs = store;
                            folded += 1;
                        }
                        continue;
                    }
                }
                for operand in inst.operands_mut() {
                    changed |= substitute(analysis, operand);
                }
            }
        }
        if folded > 0 || changed {
            stats.constants_folded += folded;
            self.changed = true;
        }
    }

    /// Collapses a decided two-way branch into a plain `jmp`, dropping the
    /// `cmp` and the dead edge.
    fn rewrite_terminator(&mut self, cfg: &mut Cfg, idx: NodeIndex, stats: &mut SccpStats) {
        let TerminatorView::Branch { cmp_index, true_target, false_target } = cfg.block(idx).terminator() else {
            return;
        };
        let (true_idx, false_idx) =
            match (cfg.find_block_by_label(&true_target), cfg.find_block_by_label(&false_target)) {
                (Some(t), Some(f)) => (t, f),
                _ => return,
            };
        let true_live = self.analysis.executable_edges.contains(&(idx, true_idx));
        let false_live = self.analysis.executable_edges.contains(&(idx, false_idx));
        // Both sides live: the branch stays. Neither side live can only
        // mean the condition never left Top; leave the block alone.
        if true_live == false_live {
            return;
        }

        let (taken_label, taken_idx, dead_idx) =
            if true_live { (true_target, true_idx, false_idx) } else { (false_target, false_idx, true_idx) };

        if let Some(block) = cfg.graph_mut().node_weight_mut(idx) {
            // Drop the jnz/jz pair and the governing cmp.
            block.instructions.truncate(block.instructions.len() - 2);
            if let Some(i) = cmp_index {
                block.instructions.remove(i);
            }
            block.append(Instruction::Jump { kind: JumpKind::Jmp, target: taken_label });
        }
        if dead_idx != taken_idx {
            cfg.remove_edge(idx, dead_idx);
        }
        stats.branches_resolved += 1;
        self.changed = true;
    }

    /// Deletes blocks no executable edge reaches. The entry and exit
    /// blocks always stay.
    fn remove_unreachable(&mut self, cfg: &mut Cfg, stats: &mut SccpStats) {
        let keep: HashSet<NodeIndex> =
            [cfg.entry_index(), cfg.exit_index()].into_iter().flatten().collect();
        let doomed: HashSet<Arc<str>> = cfg
            .graph()
            .node_indices()
            .filter(|idx| !self.analysis.visited.contains(idx) && !keep.contains(idx))
            .map(|idx| cfg.block(idx).label.clone())
            .collect();
        if doomed.is_empty() {
            return;
        }
        stats.blocks_removed += doomed.len();
        cfg.remove_blocks(&doomed);
        self.changed = true;
    }
}

/// Replaces an operand whose value is a proven constant. Returns whether a
/// substitution happened.
fn substitute(analysis: &SccpAnalysis, operand: &mut Operand) -> bool {
    if let Operand::Value(value) = operand {
        if let Some(constant) = analysis.cell(value).as_constant() {
            *operand = Operand::Const(constant);
            return true;
        }
    }
    false
}
