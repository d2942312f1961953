// src/ir/ssa.rs
//! Static Single Assignment construction.
//!
//! Two phases over the pre-SSA CFG (Cytron et al.):
//! 1. φ placement: for every base name defined in at least two blocks,
//!    insert an empty phi node in each block of the iterated dominance
//!    frontier of its definition set.
//! 2. Renaming: a preorder walk of the dominator tree maintaining a
//!    version stack per base name; operands read the stack top, definitions
//!    push a fresh version, and successor phis record the incoming value
//!    for the edge from the visited block.
//!
//! Function parameters count as definitions in the entry block and receive
//! version 1 before the walk starts.

use super::cfg::Cfg;
use super::dominance::DominanceInfo;
use super::function::Function;
use super::instruction::Instruction;
use super::value::{Operand, SsaValue};
use crate::error::compile_error::IrError;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct SsaBuilder {
    /// Current version stack per base name.
    stacks: HashMap<Arc<str>, Vec<u32>>,
    /// Monotonic version counter per base name.
    counters: HashMap<Arc<str>, u32>,
}

impl SsaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `func` to SSA form in place.
    pub fn build(&mut self, func: &mut Function) -> Result<(), IrError> {
        self.stacks.clear();
        self.counters.clear();

        let dominance = DominanceInfo::compute(&func.cfg)?;
        let entry = func
            .cfg
            .entry_index()
            .ok_or_else(|| IrError::InvariantViolation("CFG has no entry block".to_string()))?;

        self.place_phis(func, &dominance, entry);

        // Parameters are defined on function entry.
        for param in func.params.clone() {
            let version = self.allocate_version(&param);
            self.stacks.entry(param).or_default().push(version);
        }
        self.rename_block(&mut func.cfg, &dominance, entry)?;

        func.version_counters = std::mem::take(&mut self.counters);
        Ok(())
    }

    /// Phase 1: φ placement on iterated dominance frontiers.
    ///
    /// Bases defined in a single block never need a phi here: lexical
    /// scoping confines their uses to the dominated region.
    fn place_phis(&self, func: &mut Function, dominance: &DominanceInfo, entry: NodeIndex) {
        for (base, def_blocks) in Self::collect_definitions(&func.cfg, &func.params, entry) {
            if def_blocks.len() < 2 {
                continue;
            }
            for idx in dominance.iterated_dominance_frontier(&def_blocks) {
                if let Some(block) = func.cfg.graph_mut().node_weight_mut(idx) {
                    block.insert_phi(&base);
                }
            }
        }
    }

    /// Definition blocks per base name, ordered by first definition
    /// (parameters first) so φ insertion is deterministic.
    fn collect_definitions(cfg: &Cfg, params: &[Arc<str>], entry: NodeIndex) -> Vec<(Arc<str>, HashSet<NodeIndex>)> {
        let mut order: Vec<Arc<str>> = Vec::new();
        let mut defs: HashMap<Arc<str>, HashSet<NodeIndex>> = HashMap::new();

        for param in params {
            order.push(param.clone());
            defs.entry(param.clone()).or_default().insert(entry);
        }

        let mut creation_order: Vec<NodeIndex> = cfg.bfs_order();
        creation_order.sort_by_key(|&idx| Cfg::block_number(&cfg.graph()[idx].label));
        for idx in creation_order {
            for inst in &cfg.graph()[idx].instructions {
                if let Some(lhs) = inst.defined_value() {
                    let entry_set = defs.entry(lhs.base.clone()).or_insert_with(|| {
                        order.push(lhs.base.clone());
                        HashSet::new()
                    });
                    entry_set.insert(idx);
                }
            }
        }

        order.into_iter().map(|base| { let set = defs[&base].clone(); (base, set) }).collect()
    }

    /// Phase 2: renaming, one dominator-tree node at a time.
    fn rename_block(&mut self, cfg: &mut Cfg, dominance: &DominanceInfo, idx: NodeIndex) -> Result<(), IrError> {
        let mut pushed: Vec<Arc<str>> = Vec::new();
        let label = cfg.graph()[idx].label.clone();

        // Phi definitions first: they execute on block entry.
        if let Some(block) = cfg.graph_mut().node_weight_mut(idx) {
            for phi in &mut block.phi_nodes {
                let base = phi.lhs.base.clone();
                let version = self.allocate_version(&base);
                phi.lhs = phi.lhs.with_version(version);
                self.stacks.entry(base.clone()).or_default().push(version);
                pushed.push(base);
            }

            for inst in &mut block.instructions {
                for operand in inst.operands_mut() {
                    Self::rewrite_operand(&self.stacks, operand);
                }
                if let Instruction::Assign { lhs, .. } = inst {
                    let base = lhs.base.clone();
                    let version = self.allocate_version(&base);
                    *lhs = lhs.with_version(version);
                    self.stacks.entry(base.clone()).or_default().push(version);
                    pushed.push(base);
                }
            }
        }

        // Tell every successor phi which value flows along our edge.
        for succ in cfg.succs(idx) {
            if let Some(block) = cfg.graph_mut().node_weight_mut(succ) {
                for phi in &mut block.phi_nodes {
                    let operand = match self.stacks.get(&phi.lhs.base).and_then(|s| s.last()) {
                        Some(&version) => {
                            Operand::Value(SsaValue::versioned(phi.lhs.base.clone(), version))
                        }
                        None => Operand::Value(SsaValue::undef()),
                    };
                    phi.set_incoming(label.clone(), operand);
                }
            }
        }

        for &child in dominance.dominator_tree_children(idx) {
            self.rename_block(cfg, dominance, child)?;
        }

        for base in pushed.into_iter().rev() {
            self.stacks.get_mut(&base).and_then(Vec::pop);
        }
        Ok(())
    }

    fn rewrite_operand(stacks: &HashMap<Arc<str>, Vec<u32>>, operand: &mut Operand) {
        if let Operand::Value(value) = operand {
            if value.version.is_some() || value.is_undef() {
                return;
            }
            *operand = match stacks.get(&value.base).and_then(|s| s.last()) {
                Some(&version) => Operand::Value(value.with_version(version)),
                None => Operand::Value(SsaValue::undef()),
            };
        }
    }

    fn allocate_version(&mut self, base: &Arc<str>) -> u32 {
        let counter = self.counters.entry(base.clone()).or_insert(0);
        *counter += 1;
        *counter
    }
}
