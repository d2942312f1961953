// src/ir/optimizer/sccp/propagator.rs
//! The Wegman–Zadeck propagation engine.
//!
//! Two worklists drive the analysis: CFG edges becoming executable and SSA
//! values whose lattice cell descended. A block's instructions are
//! evaluated once, when its first executable in-edge appears; later edges
//! only re-evaluate its phis. Branch targets become executable only when
//! the governing `cmp` is decided, which is what lets constant conditions
//! hide entire regions from the analysis.

use super::evaluator::{fold_binary, fold_unary};
use super::lattice::LatticeValue;
use crate::ir::{Cfg, Instruction, Operand, Operation, SsaValue, TerminatorView};
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Where a value is used: an ordinary instruction or a phi operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UseSite {
    Inst(usize),
    Phi(usize),
}

/// Fixed-point result handed to the rewriter.
#[derive(Debug)]
pub struct SccpAnalysis {
    pub lattice: HashMap<SsaValue, LatticeValue>,
    pub executable_edges: HashSet<(NodeIndex, NodeIndex)>,
    /// Blocks reached by at least one executable edge (plus the entry).
    pub visited: HashSet<NodeIndex>,
}

impl SccpAnalysis {
    #[must_use]
    pub fn cell(&self, value: &SsaValue) -> LatticeValue {
        if value.is_undef() {
            return LatticeValue::Bottom;
        }
        self.lattice.get(value).copied().unwrap_or(LatticeValue::Top)
    }

    #[must_use]
    pub fn operand_cell(&self, operand: &Operand) -> LatticeValue {
        match operand {
            Operand::Const(c) => LatticeValue::Constant(*c),
            Operand::Value(v) => self.cell(v),
        }
    }
}

pub struct SccpPropagator<'a> {
    cfg: &'a Cfg,
    lattice: HashMap<SsaValue, LatticeValue>,
    executable_edges: HashSet<(NodeIndex, NodeIndex)>,
    visited: HashSet<NodeIndex>,
    edge_worklist: VecDeque<(NodeIndex, NodeIndex)>,
    value_worklist: VecDeque<SsaValue>,
    uses: HashMap<SsaValue, Vec<(NodeIndex, UseSite)>>,
}

impl<'a> SccpPropagator<'a> {
    #[must_use]
    pub fn new(cfg: &'a Cfg, params: &[Arc<str>]) -> Self {
        let mut propagator = Self {
            cfg,
            lattice: HashMap::new(),
            executable_edges: HashSet::new(),
            visited: HashSet::new(),
            edge_worklist: VecDeque::new(),
            value_worklist: VecDeque::new(),
            uses: HashMap::new(),
        };
        propagator.collect_uses();
        // Parameters are runtime inputs.
        for param in params {
            propagator.lattice.insert(SsaValue::versioned(param.clone(), 1), LatticeValue::Bottom);
        }
        propagator
    }

    /// Runs the propagation to its fixed point.
    #[must_use]
    pub fn analyze(mut self) -> SccpAnalysis {
        if let Some(entry) = self.cfg.entry_index() {
            // The entry block hangs off a virtual executable edge.
            self.visited.insert(entry);
            self.evaluate_block(entry);
        }

        loop {
            if let Some((from, to)) = self.edge_worklist.pop_front() {
                self.process_edge(from, to);
            } else if let Some(value) = self.value_worklist.pop_front() {
                self.process_value(&value);
            } else {
                break;
            }
        }

        SccpAnalysis { lattice: self.lattice, executable_edges: self.executable_edges, visited: self.visited }
    }

    fn collect_uses(&mut self) {
        for idx in self.cfg.graph().node_indices() {
            let block = self.cfg.block(idx);
            for (pos, phi) in block.phi_nodes.iter().enumerate() {
                for (_, operand) in &phi.incoming {
                    self.record_use(operand, idx, UseSite::Phi(pos));
                }
            }
            for (pos, inst) in block.instructions.iter().enumerate() {
                for operand in inst.operands() {
                    self.record_use(operand, idx, UseSite::Inst(pos));
                }
            }
        }
    }

    fn record_use(&mut self, operand: &Operand, idx: NodeIndex, site: UseSite) {
        if let Operand::Value(value) = operand {
            if !value.is_undef() {
                self.uses.entry(value.clone()).or_default().push((idx, site));
            }
        }
    }

    fn process_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.executable_edges.insert((from, to)) {
            return;
        }
        if self.visited.insert(to) {
            self.evaluate_block(to);
        } else {
            // Re-entry along a new edge only affects the phis.
            for pos in 0..self.cfg.block(to).phi_nodes.len() {
                self.evaluate_phi(to, pos);
            }
        }
    }

    fn process_value(&mut self, value: &SsaValue) {
        let Some(sites) = self.uses.get(value).cloned() else {
            return;
        };
        for (idx, site) in sites {
            if !self.visited.contains(&idx) {
                continue;
            }
            match site {
                UseSite::Phi(pos) => self.evaluate_phi(idx, pos),
                UseSite::Inst(pos) => match &self.cfg.block(idx).instructions[pos] {
                    Instruction::Assign { .. } => self.evaluate_instruction(idx, pos),
                    Instruction::Cmp { .. } => self.decide_terminator(idx),
                    _ => {}
                },
            }
        }
    }

    fn evaluate_block(&mut self, idx: NodeIndex) {
        for pos in 0..self.cfg.block(idx).phi_nodes.len() {
            self.evaluate_phi(idx, pos);
        }
        for pos in 0..self.cfg.block(idx).instructions.len() {
            self.evaluate_instruction(idx, pos);
        }
        self.decide_terminator(idx);
    }

    /// Meet over the operands arriving along executable edges; edges not
    /// (yet) executable contribute Top.
    fn evaluate_phi(&mut self, idx: NodeIndex, pos: usize) {
        let block = self.cfg.block(idx);
        let phi = &block.phi_nodes[pos];
        let mut result = LatticeValue::Top;
        for (pred_label, operand) in &phi.incoming {
            let Some(pred) = self.cfg.find_block_by_label(pred_label) else {
                continue;
            };
            if self.executable_edges.contains(&(pred, idx)) {
                result = result.meet(self.operand_cell(operand));
            }
        }
        let lhs = phi.lhs.clone();
        self.update_cell(lhs, result);
    }

    fn evaluate_instruction(&mut self, idx: NodeIndex, pos: usize) {
        let Instruction::Assign { lhs, rhs } = &self.cfg.block(idx).instructions[pos] else {
            return;
        };
        let result = self.evaluate_operation(rhs);
        let lhs = lhs.clone();
        self.update_cell(lhs, result);
    }

    fn evaluate_operation(&self, operation: &Operation) -> LatticeValue {
        match operation {
            Operation::Store(operand) => self.operand_cell(operand),
            Operation::Binary { op, left, right } => {
                match (self.operand_cell(left), self.operand_cell(right)) {
                    (LatticeValue::Bottom, _) | (_, LatticeValue::Bottom) => LatticeValue::Bottom,
                    (LatticeValue::Constant(a), LatticeValue::Constant(b)) => {
                        fold_binary(*op, a, b).map_or(LatticeValue::Bottom, LatticeValue::Constant)
                    }
                    _ => LatticeValue::Top,
                }
            }
            Operation::Unary { op, operand } => match self.operand_cell(operand) {
                LatticeValue::Bottom => LatticeValue::Bottom,
                LatticeValue::Constant(value) => LatticeValue::Constant(fold_unary(*op, value)),
                LatticeValue::Top => LatticeValue::Top,
            },
            // Calls are opaque.
            Operation::Call { .. } => LatticeValue::Bottom,
        }
    }

    /// Pushes outgoing edges once the block's control transfer is decided.
    fn decide_terminator(&mut self, idx: NodeIndex) {
        match self.cfg.block(idx).terminator() {
            TerminatorView::Goto(target) => self.push_edge_to(idx, &target),
            TerminatorView::Branch { cmp_index, true_target, false_target } => {
                let decision = cmp_index.map_or(
                    // No cmp in sight: be conservative, both sides run.
                    (true, true),
                    |i| {
                        let Instruction::Cmp { left, right } = &self.cfg.block(idx).instructions[i] else {
                            return (true, true);
                        };
                        match (self.operand_cell(left), self.operand_cell(right)) {
                            (LatticeValue::Bottom, _) | (_, LatticeValue::Bottom) => (true, true),
                            (LatticeValue::Constant(a), LatticeValue::Constant(b)) => (a == b, a != b),
                            // Still Top: neither side is known reachable.
                            _ => (false, false),
                        }
                    },
                );
                if decision.0 {
                    self.push_edge_to(idx, &true_target);
                }
                if decision.1 {
                    self.push_edge_to(idx, &false_target);
                }
            }
            TerminatorView::Return | TerminatorView::None => {}
        }
    }

    fn push_edge_to(&mut self, from: NodeIndex, target: &Arc<str>) {
        if let Some(to) = self.cfg.find_block_by_label(target) {
            if !self.executable_edges.contains(&(from, to)) {
                self.edge_worklist.push_back((from, to));
            }
        }
    }

    fn update_cell(&mut self, value: SsaValue, new: LatticeValue) {
        let old = self.lattice.get(&value).copied().unwrap_or(LatticeValue::Top);
        let merged = old.meet(new);
        if merged != old {
            self.lattice.insert(value.clone(), merged);
            self.value_worklist.push_back(value);
        }
    }

    fn cell(&self, value: &SsaValue) -> LatticeValue {
        if value.is_undef() {
            return LatticeValue::Bottom;
        }
        self.lattice.get(value).copied().unwrap_or(LatticeValue::Top)
    }

    fn operand_cell(&self, operand: &Operand) -> LatticeValue {
        match operand {
            Operand::Const(c) => LatticeValue::Constant(*c),
            Operand::Value(v) => self.cell(v),
        }
    }
}
