// src/ir/dominance.rs
//! Dominance analysis for control flow graphs.
//!
//! Immediate dominators come from the "A Simple, Fast Dominance Algorithm"
//! of Cooper, Harvey and Kennedy: iterate over the blocks in reverse
//! postorder, intersecting the dominator paths of processed predecessors,
//! until nothing changes. Dominance frontiers use the standard join-point
//! walk over the same structure.

use super::cfg::Cfg;
use crate::error::compile_error::IrError;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct DominanceInfo {
    /// Immediate dominator of each reachable block; the entry maps to
    /// itself.
    idom: HashMap<NodeIndex, NodeIndex>,
    /// Position of each reachable block in reverse postorder.
    rpo_number: HashMap<NodeIndex, usize>,
    dominance_frontiers: HashMap<NodeIndex, HashSet<NodeIndex>>,
    /// Children in the dominator tree, sorted by block number.
    dom_tree_children: HashMap<NodeIndex, Vec<NodeIndex>>,
    entry: NodeIndex,
}

impl DominanceInfo {
    /// Computes dominators and dominance frontiers for all blocks
    /// reachable from the entry.
    pub fn compute(cfg: &Cfg) -> Result<Self, IrError> {
        let entry = cfg
            .entry_index()
            .ok_or_else(|| IrError::InvariantViolation("CFG has no entry block".to_string()))?;

        let rpo = cfg.reverse_post_order();
        let rpo_number: HashMap<NodeIndex, usize> = rpo.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let mut info = Self {
            idom: HashMap::from([(entry, entry)]),
            rpo_number,
            dominance_frontiers: HashMap::new(),
            dom_tree_children: HashMap::new(),
            entry,
        };

        info.compute_dominators(cfg, &rpo);
        info.build_dominator_tree(cfg);
        info.compute_dominance_frontiers(cfg, &rpo);
        Ok(info)
    }

    fn compute_dominators(&mut self, cfg: &Cfg, rpo: &[NodeIndex]) {
        let mut changed = true;
        while changed {
            changed = false;

            for &node in rpo {
                if node == self.entry {
                    continue;
                }

                // Only predecessors that are reachable and already carry an
                // idom take part in the intersection.
                let preds: Vec<NodeIndex> = cfg
                    .preds(node)
                    .into_iter()
                    .filter(|p| self.rpo_number.contains_key(p) && self.idom.contains_key(p))
                    .collect();
                let Some((&first, rest)) = preds.split_first() else {
                    continue;
                };

                let mut new_idom = first;
                for &pred in rest {
                    new_idom = self.intersect(new_idom, pred);
                }

                if self.idom.get(&node) != Some(&new_idom) {
                    self.idom.insert(node, new_idom);
                    changed = true;
                }
            }
        }
    }

    /// Walks two dominator paths up to their common ancestor. The finger
    /// with the larger reverse-postorder number is behind and climbs first.
    fn intersect(&self, node1: NodeIndex, node2: NodeIndex) -> NodeIndex {
        let mut finger1 = node1;
        let mut finger2 = node2;
        while finger1 != finger2 {
            while self.rpo_number[&finger1] > self.rpo_number[&finger2] {
                finger1 = self.idom[&finger1];
            }
            while self.rpo_number[&finger2] > self.rpo_number[&finger1] {
                finger2 = self.idom[&finger2];
            }
        }
        finger1
    }

    fn build_dominator_tree(&mut self, cfg: &Cfg) {
        self.dom_tree_children.clear();
        for (&node, &idom) in &self.idom {
            if node != idom {
                self.dom_tree_children.entry(idom).or_default().push(node);
            }
        }
        for children in self.dom_tree_children.values_mut() {
            children.sort_by_key(|&c| Cfg::block_number(&cfg.graph()[c].label));
        }
    }

    fn compute_dominance_frontiers(&mut self, cfg: &Cfg, rpo: &[NodeIndex]) {
        self.dominance_frontiers.clear();
        for &node in rpo {
            let preds: Vec<NodeIndex> =
                cfg.preds(node).into_iter().filter(|p| self.idom.contains_key(p)).collect();
            if preds.len() < 2 {
                continue;
            }
            let idom = self.idom[&node];
            for &pred in &preds {
                let mut runner = pred;
                while runner != idom {
                    self.dominance_frontiers.entry(runner).or_default().insert(node);
                    runner = self.idom[&runner];
                }
            }
        }
    }

    /// Whether `node1` dominates `node2` (reflexively).
    #[must_use]
    pub fn dominates(&self, node1: NodeIndex, node2: NodeIndex) -> bool {
        let (Some(&target), Some(mut current)) = (self.rpo_number.get(&node1), self.rpo_number.get(&node2).map(|_| node2))
        else {
            return false;
        };
        // Idoms strictly decrease the RPO number, so the walk is bounded.
        while self.rpo_number[&current] > target {
            current = self.idom[&current];
        }
        current == node1
    }

    #[must_use]
    pub fn immediate_dominator(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.idom.get(&node).copied()
    }

    #[must_use]
    pub fn dominance_frontier(&self, node: NodeIndex) -> Option<&HashSet<NodeIndex>> {
        self.dominance_frontiers.get(&node)
    }

    #[must_use]
    pub fn dominator_tree_children(&self, node: NodeIndex) -> &[NodeIndex] {
        self.dom_tree_children.get(&node).map_or(&[], Vec::as_slice)
    }

    /// Iterated dominance frontier of a set of definition blocks: the
    /// classic worklist closure used for φ placement.
    #[must_use]
    pub fn iterated_dominance_frontier(&self, defs: &HashSet<NodeIndex>) -> HashSet<NodeIndex> {
        let mut result = HashSet::new();
        let mut worklist: Vec<NodeIndex> = defs.iter().copied().collect();
        while let Some(node) = worklist.pop() {
            if let Some(frontier) = self.dominance_frontiers.get(&node) {
                for &f in frontier {
                    if result.insert(f) {
                        worklist.push(f);
                    }
                }
            }
        }
        result
    }

    /// Is the node reachable from entry (and therefore analyzed)?
    #[must_use]
    pub fn is_reachable(&self, node: NodeIndex) -> bool {
        self.rpo_number.contains_key(&node)
    }
}
