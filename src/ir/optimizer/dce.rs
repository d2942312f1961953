// src/ir/optimizer/dce.rs
//! Dead Code Elimination.
//!
//! Mark–sweep over SSA. Returns, jumps, comparisons and calls are
//! essential by definition; everything a transitive operand chain connects
//! to them is marked live through a backward worklist. The sweep drops
//! unmarked pure assignments and phi nodes, then removes blocks that lost
//! their last predecessor (entry and exit stay), pruning their entries
//! from successor phis. Terminators are never deleted.

use super::Pass;
use crate::error::compile_error::IrError;
use crate::ir::{Function, Instruction, Operand, SsaValue};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct DceStats {
    pub instructions_removed: usize,
    pub phis_removed: usize,
    pub blocks_removed: usize,
}

impl fmt::Display for DceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} instructions removed, {} phis removed, {} blocks removed",
            self.instructions_removed, self.phis_removed, self.blocks_removed
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum DefSite {
    Phi(NodeIndex, usize),
    Inst(NodeIndex, usize),
}

#[derive(Debug, Default)]
pub struct DeadCodeElimination {
    pub stats: DceStats,
}

impl DeadCodeElimination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every value reachable from an essential instruction.
    fn mark_live(func: &Function) -> HashSet<SsaValue> {
        let cfg = &func.cfg;
        let mut defs: HashMap<SsaValue, DefSite> = HashMap::new();
        let mut worklist: VecDeque<SsaValue> = VecDeque::new();

        for idx in cfg.graph().node_indices() {
            let block = cfg.block(idx);
            for (pos, phi) in block.phi_nodes.iter().enumerate() {
                defs.insert(phi.lhs.clone(), DefSite::Phi(idx, pos));
            }
            for (pos, inst) in block.instructions.iter().enumerate() {
                if let Some(lhs) = inst.defined_value() {
                    defs.insert(lhs.clone(), DefSite::Inst(idx, pos));
                }
                // Essential instructions seed the backward walk.
                let essential = match inst {
                    Instruction::Return { .. } | Instruction::Cmp { .. } | Instruction::Jump { .. } => true,
                    Instruction::Assign { rhs, .. } => !rhs.is_pure(),
                };
                if essential {
                    for operand in inst.operands() {
                        enqueue(operand, &mut worklist);
                    }
                }
            }
        }

        let mut live: HashSet<SsaValue> = HashSet::new();
        while let Some(value) = worklist.pop_front() {
            if !live.insert(value.clone()) {
                continue;
            }
            match defs.get(&value) {
                Some(DefSite::Phi(idx, pos)) => {
                    for (_, operand) in &cfg.block(*idx).phi_nodes[*pos].incoming {
                        enqueue(operand, &mut worklist);
                    }
                }
                Some(DefSite::Inst(idx, pos)) => {
                    for operand in cfg.block(*idx).instructions[*pos].operands() {
                        enqueue(operand, &mut worklist);
                    }
                }
                // Parameters and undef have no defining instruction.
                None => {}
            }
        }
        live
    }

    fn sweep(&mut self, func: &mut Function, live: &HashSet<SsaValue>) -> bool {
        let mut changed = false;
        for block in func.cfg.blocks_mut() {
            let phis_before = block.phi_nodes.len();
            block.phi_nodes.retain(|phi| live.contains(&phi.lhs));
            self.stats.phis_removed += phis_before - block.phi_nodes.len();

            let insts_before = block.instructions.len();
            block.instructions.retain(|inst| match inst {
                Instruction::Assign { lhs, rhs } => !rhs.is_pure() || live.contains(lhs),
                // Terminators, cmps and calls always survive the sweep.
                _ => true,
            });
            self.stats.instructions_removed += insts_before - block.instructions.len();

            changed |= phis_before != block.phi_nodes.len() || insts_before != block.instructions.len();
        }
        changed
    }

    /// Drops blocks that ended up without predecessors and scrubs their
    /// phi contributions.
    fn remove_orphan_blocks(&mut self, func: &mut Function) -> bool {
        let removed = func.cfg.remove_unreachable_blocks();
        if removed.is_empty() {
            return false;
        }
        self.stats.blocks_removed += removed.len();
        let gone: HashSet<Arc<str>> = removed.into_iter().collect();
        for block in func.cfg.blocks_mut() {
            for phi in &mut block.phi_nodes {
                phi.incoming.retain(|(pred, _)| !gone.contains(pred));
            }
        }
        true
    }
}

fn enqueue(operand: &Operand, worklist: &mut VecDeque<SsaValue>) {
    if let Operand::Value(value) = operand {
        if !value.is_undef() {
            worklist.push_back(value.clone());
        }
    }
}

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn run(&mut self, func: &mut Function) -> Result<bool, IrError> {
        let live = Self::mark_live(func);
        let mut changed = self.sweep(func, &live);
        changed |= self.remove_orphan_blocks(func);
        Ok(changed)
    }
}
