// src/ir/optimizer/licm.rs
//! Loop-Invariant Code Motion.
//!
//! Natural loops are found from back-edges `(t → h)` where `h` dominates
//! `t`: the loop body is everything that reaches `t` without passing `h`,
//! plus `h` itself. Loops sharing a header are merged. Each loop gets a
//! pre-header (the counted-loop init block already qualifies; otherwise one
//! is synthesized by splitting the outside edges into the header), and
//! invariant pure instructions migrate to its end, innermost loops first.

use super::Pass;
use crate::error::compile_error::IrError;
use crate::ir::dominance::DominanceInfo;
use crate::ir::{
    BasicBlock, Cfg, Function, Instruction, IrBinaryOp, JumpKind, Operand, Operation, PhiNode, SsaValue,
};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct LicmStats {
    pub instructions_hoisted: usize,
    pub preheaders_synthesized: usize,
}

impl fmt::Display for LicmStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instructions hoisted, {} preheaders synthesized", self.instructions_hoisted, self.preheaders_synthesized)
    }
}

#[derive(Debug)]
struct NaturalLoop {
    header: NodeIndex,
    blocks: HashSet<NodeIndex>,
}

#[derive(Debug, Default)]
pub struct Licm {
    pub stats: LicmStats,
}

impl Licm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find_loops(cfg: &Cfg, dominance: &DominanceInfo) -> Vec<NaturalLoop> {
        let mut by_header: HashMap<NodeIndex, HashSet<NodeIndex>> = HashMap::new();

        for edge in cfg.graph().edge_indices() {
            let Some((tail, header)) = cfg.graph().edge_endpoints(edge) else { continue };
            if !dominance.is_reachable(tail) || !dominance.dominates(header, tail) {
                continue;
            }
            // Flood backwards from the tail, stopping at the header.
            let blocks = by_header.entry(header).or_insert_with(|| HashSet::from([header]));
            let mut stack = vec![tail];
            while let Some(node) = stack.pop() {
                if blocks.insert(node) {
                    stack.extend(cfg.preds(node));
                }
            }
        }

        let mut loops: Vec<NaturalLoop> =
            by_header.into_iter().map(|(header, blocks)| NaturalLoop { header, blocks }).collect();
        // Innermost first; ties broken by header number for determinism.
        loops.sort_by_key(|l| (l.blocks.len(), Cfg::block_number(&cfg.graph()[l.header].label)));
        loops
    }

    /// Finds or synthesizes the loop's pre-header and returns its node.
    fn ensure_preheader(
        &mut self,
        func: &mut Function,
        dominance: &DominanceInfo,
        lp: &NaturalLoop,
    ) -> Result<NodeIndex, IrError> {
        let header_label = func.cfg.graph()[lp.header].label.clone();
        let outside_preds: Vec<NodeIndex> =
            func.cfg.preds(lp.header).into_iter().filter(|p| !lp.blocks.contains(p)).collect();

        if outside_preds.is_empty() {
            return Err(IrError::InvariantViolation(format!("loop header '{header_label}' has no entry edge")));
        }
        if outside_preds.len() == 1 {
            let single = outside_preds[0];
            if func.cfg.succs(single).len() == 1 && dominance.dominates(single, lp.header) {
                return Ok(single);
            }
        }

        self.synthesize_preheader(func, lp, &header_label, &outside_preds)
    }

    /// Splits the outside edges into the header through a fresh block.
    fn synthesize_preheader(
        &mut self,
        func: &mut Function,
        lp: &NaturalLoop,
        header_label: &Arc<str>,
        outside_preds: &[NodeIndex],
    ) -> Result<NodeIndex, IrError> {
        let preheader_label: Arc<str> = Arc::from(func.cfg.fresh_label());
        let outside_labels: HashSet<Arc<str>> =
            outside_preds.iter().map(|&p| func.cfg.graph()[p].label.clone()).collect();

        // Siphon the outside entries out of the header phis first; each one
        // either renames to the preheader edge or merges through a fresh
        // phi in the preheader.
        let mut preheader_phis: Vec<PhiNode> = Vec::new();
        let mut header_patch: Vec<(usize, Operand)> = Vec::new();
        {
            let header_block = func
                .cfg
                .graph()
                .node_weight(lp.header)
                .ok_or_else(|| IrError::InvariantViolation("loop header vanished".to_string()))?;
            let outside_entries: Vec<(usize, Vec<(Arc<str>, Operand)>)> = header_block
                .phi_nodes
                .iter()
                .enumerate()
                .map(|(pos, phi)| {
                    (pos, phi.incoming.iter().filter(|(l, _)| outside_labels.contains(l)).cloned().collect())
                })
                .collect();
            for (pos, entries) in outside_entries {
                match entries.len() {
                    0 => {}
                    1 => header_patch.push((pos, entries[0].1.clone())),
                    _ => {
                        let base = func.cfg.graph()[lp.header].phi_nodes[pos].lhs.base.clone();
                        let merged = SsaValue { base: base.clone(), version: None };
                        preheader_phis.push(PhiNode { lhs: merged, incoming: entries });
                        header_patch.push((pos, Operand::Value(SsaValue { base, version: None })));
                    }
                }
            }
        }
        // Version the merged values outside the borrow of the graph.
        for phi in &mut preheader_phis {
            let versioned = func.allocate_version(&phi.lhs.base);
            phi.lhs = versioned;
        }
        for (_, operand) in &mut header_patch {
            if let Operand::Value(value) = operand {
                if value.version.is_none() {
                    let fresh = preheader_phis
                        .iter()
                        .find(|phi| phi.lhs.base == value.base)
                        .map(|phi| phi.lhs.clone())
                        .ok_or_else(|| IrError::InvariantViolation("preheader phi lookup failed".to_string()))?;
                    *operand = Operand::Value(fresh);
                }
            }
        }

        let mut preheader = BasicBlock::new(&preheader_label, Some("preheader"));
        preheader.phi_nodes = preheader_phis;
        preheader.append(Instruction::Jump { kind: JumpKind::Jmp, target: header_label.clone() });
        let preheader_idx = func.cfg.add_block(preheader);
        func.cfg.add_edge(preheader_idx, lp.header);

        // Redirect every outside edge and jump into the preheader.
        for &pred in outside_preds {
            if let Some(block) = func.cfg.graph_mut().node_weight_mut(pred) {
                for inst in &mut block.instructions {
                    if let Instruction::Jump { target, .. } = inst {
                        if target == header_label {
                            *target = preheader_label.clone();
                        }
                    }
                }
            }
            func.cfg.remove_edge(pred, lp.header);
            func.cfg.add_edge(pred, preheader_idx);
        }

        // Patch the header phis: outside entries collapse to the preheader
        // edge.
        if let Some(header_block) = func.cfg.graph_mut().node_weight_mut(lp.header) {
            for (pos, operand) in header_patch {
                let phi = &mut header_block.phi_nodes[pos];
                phi.incoming.retain(|(label, _)| !outside_labels.contains(label));
                phi.incoming.push((preheader_label.clone(), operand));
            }
        }

        self.stats.preheaders_synthesized += 1;
        Ok(preheader_idx)
    }

    /// Moves invariant instructions of one loop to its pre-header,
    /// repeating until nothing else qualifies.
    fn hoist_loop(
        &mut self,
        func: &mut Function,
        lp: &NaturalLoop,
        preheader: NodeIndex,
        dominance: &DominanceInfo,
        def_blocks: &mut HashMap<SsaValue, NodeIndex>,
    ) -> bool {
        let exits: Vec<NodeIndex> = lp
            .blocks
            .iter()
            .copied()
            .filter(|&b| func.cfg.succs(b).iter().any(|s| !lp.blocks.contains(s)))
            .collect();

        let mut body: Vec<NodeIndex> = lp.blocks.iter().copied().collect();
        body.sort_by_key(|&b| Cfg::block_number(&func.cfg.graph()[b].label));

        let mut changed = false;
        'retry: loop {
            for &block_idx in &body {
                let candidate = func.cfg.graph()[block_idx].instructions.iter().position(|inst| {
                    Self::is_hoistable(inst, block_idx, lp, &exits, dominance, def_blocks)
                });
                if let Some(pos) = candidate {
                    let inst = func
                        .cfg
                        .graph_mut()
                        .node_weight_mut(block_idx)
                        .map(|b| b.instructions.remove(pos));
                    if let Some(inst) = inst {
                        if let Some(lhs) = inst.defined_value() {
                            def_blocks.insert(lhs.clone(), preheader);
                        }
                        if let Some(target) = func.cfg.graph_mut().node_weight_mut(preheader) {
                            let at = target.terminator_start();
                            target.instructions.insert(at, inst);
                        }
                        self.stats.instructions_hoisted += 1;
                        changed = true;
                        continue 'retry;
                    }
                }
            }
            break;
        }
        changed
    }

    fn is_hoistable(
        inst: &Instruction,
        at: NodeIndex,
        lp: &NaturalLoop,
        exits: &[NodeIndex],
        dominance: &DominanceInfo,
        def_blocks: &HashMap<SsaValue, NodeIndex>,
    ) -> bool {
        let Instruction::Assign { rhs, .. } = inst else {
            return false;
        };
        if !rhs.is_pure() {
            return false;
        }

        // Every operand must be constant or defined outside the loop
        // (which includes previously hoisted definitions).
        let invariant = rhs.operands().iter().all(|operand| match operand {
            Operand::Const(_) => true,
            Operand::Value(value) => {
                value.is_undef() || def_blocks.get(value).is_none_or(|def| !lp.blocks.contains(def))
            }
        });
        if !invariant {
            return false;
        }

        // Safe to move if the operation cannot trap, or if its block would
        // have executed before every loop exit anyway.
        Self::speculatable(rhs) || exits.iter().all(|&exit| dominance.dominates(at, exit))
    }

    /// Pure arithmetic with no trap. Division and modulo only qualify with
    /// a divisor that is a nonzero constant.
    fn speculatable(operation: &Operation) -> bool {
        match operation {
            Operation::Binary { op: IrBinaryOp::Divide | IrBinaryOp::Modulo, right, .. } => {
                matches!(right, Operand::Const(c) if *c != 0)
            }
            Operation::Store(_) | Operation::Binary { .. } | Operation::Unary { .. } => true,
            Operation::Call { .. } => false,
        }
    }

    fn collect_def_blocks(cfg: &Cfg) -> HashMap<SsaValue, NodeIndex> {
        let mut defs = HashMap::new();
        for idx in cfg.graph().node_indices() {
            let block = cfg.block(idx);
            for phi in &block.phi_nodes {
                defs.insert(phi.lhs.clone(), idx);
            }
            for inst in &block.instructions {
                if let Some(lhs) = inst.defined_value() {
                    defs.insert(lhs.clone(), idx);
                }
            }
        }
        defs
    }
}

impl Pass for Licm {
    fn name(&self) -> &'static str {
        "licm"
    }

    fn run(&mut self, func: &mut Function) -> Result<bool, IrError> {
        let mut changed = false;
        let mut dominance = DominanceInfo::compute(&func.cfg)?;
        let loops = Self::find_loops(&func.cfg, &dominance);
        let mut def_blocks = Self::collect_def_blocks(&func.cfg);

        for lp in &loops {
            let synthesized_before = self.stats.preheaders_synthesized;
            let preheader = self.ensure_preheader(func, &dominance, lp)?;
            if self.stats.preheaders_synthesized > synthesized_before {
                // Synthesis reshaped the graph around the header.
                dominance = DominanceInfo::compute(&func.cfg)?;
                changed = true;
            }
            changed |= self.hoist_loop(func, lp, preheader, &dominance, &mut def_blocks);
        }
        Ok(changed)
    }
}
