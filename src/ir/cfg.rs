// src/ir/cfg.rs
use super::basic_block::BasicBlock;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Control flow graph of one function.
///
/// The graph owns the blocks; the edge relation *is* the
/// predecessor/successor sets, so the symmetry invariant holds by
/// construction. Blocks are addressed by their labels (`BB0`, `BB1`, …);
/// traversal orders sort successors by block number so every walk is
/// deterministic.
#[derive(Debug, Clone)]
pub struct Cfg {
    graph: DiGraph<BasicBlock, ()>,
    pub entry_label: Arc<str>,
    pub exit_label: Arc<str>,
}

impl Cfg {
    #[must_use]
    pub fn new(entry_label: &str, exit_label: &str) -> Self {
        Self { graph: DiGraph::new(), entry_label: Arc::from(entry_label), exit_label: Arc::from(exit_label) }
    }

    #[must_use]
    pub const fn graph(&self) -> &DiGraph<BasicBlock, ()> {
        &self.graph
    }

    pub const fn graph_mut(&mut self) -> &mut DiGraph<BasicBlock, ()> {
        &mut self.graph
    }

    /// Numeric suffix of a `BB<n>` label, used for deterministic ordering.
    #[must_use]
    pub fn block_number(label: &str) -> u32 {
        label.strip_prefix("BB").and_then(|n| n.parse().ok()).unwrap_or(u32::MAX)
    }

    pub fn add_block(&mut self, block: BasicBlock) -> NodeIndex {
        self.graph.add_node(block)
    }

    /// Adds the edge unless it already exists.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        self.graph.update_edge(from, to, ());
    }

    pub fn remove_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if let Some(edge) = self.graph.find_edge(from, to) {
            self.graph.remove_edge(edge);
        }
    }

    #[must_use]
    pub fn find_block_by_label(&self, label: &str) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&idx| self.graph[idx].label.as_ref() == label)
    }

    #[must_use]
    pub fn get_block(&self, label: &str) -> Option<&BasicBlock> {
        self.find_block_by_label(label).map(|idx| &self.graph[idx])
    }

    pub fn get_block_mut(&mut self, label: &str) -> Option<&mut BasicBlock> {
        self.find_block_by_label(label).and_then(|idx| self.graph.node_weight_mut(idx))
    }

    #[must_use]
    pub fn block(&self, idx: NodeIndex) -> &BasicBlock {
        &self.graph[idx]
    }

    #[must_use]
    pub fn entry_index(&self) -> Option<NodeIndex> {
        self.find_block_by_label(&self.entry_label)
    }

    #[must_use]
    pub fn exit_index(&self) -> Option<NodeIndex> {
        self.find_block_by_label(&self.exit_label)
    }

    pub fn connect(&mut self, from_label: &str, to_label: &str) -> bool {
        if let (Some(from), Some(to)) = (self.find_block_by_label(from_label), self.find_block_by_label(to_label)) {
            self.add_edge(from, to);
            true
        } else {
            false
        }
    }

    /// Predecessors sorted by block number.
    #[must_use]
    pub fn preds(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_neighbors(idx, Direction::Incoming)
    }

    /// Successors sorted by block number.
    #[must_use]
    pub fn succs(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_neighbors(idx, Direction::Outgoing)
    }

    fn sorted_neighbors(&self, idx: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(idx, dir).collect();
        neighbors.sort_by_key(|&n| Self::block_number(&self.graph[n].label));
        neighbors
    }

    #[must_use]
    pub fn pred_labels(&self, label: &str) -> Vec<Arc<str>> {
        self.find_block_by_label(label)
            .map(|idx| self.preds(idx).into_iter().map(|p| self.graph[p].label.clone()).collect())
            .unwrap_or_default()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.graph.node_weights()
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut BasicBlock> {
        self.graph.node_weights_mut()
    }

    /// Reverse postorder over the blocks reachable from entry.
    #[must_use]
    pub fn reverse_post_order(&self) -> Vec<NodeIndex> {
        let Some(entry) = self.entry_index() else {
            return Vec::new();
        };
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        self.postorder_visit(entry, &mut visited, &mut postorder);
        postorder.reverse();
        postorder
    }

    fn postorder_visit(&self, idx: NodeIndex, visited: &mut HashSet<NodeIndex>, out: &mut Vec<NodeIndex>) {
        if !visited.insert(idx) {
            return;
        }
        for succ in self.succs(idx) {
            self.postorder_visit(succ, visited, out);
        }
        out.push(idx);
    }

    /// Breadth-first order from entry; the canonical dump order.
    #[must_use]
    pub fn bfs_order(&self) -> Vec<NodeIndex> {
        let Some(entry) = self.entry_index() else {
            return Vec::new();
        };
        let mut visited = HashSet::from([entry]);
        let mut queue = VecDeque::from([entry]);
        let mut order = Vec::new();
        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for succ in self.succs(idx) {
                if visited.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        order
    }

    /// Removes every block the given set names, along with its edges.
    pub fn remove_blocks(&mut self, labels: &HashSet<Arc<str>>) {
        if labels.is_empty() {
            return;
        }
        self.graph.retain_nodes(|graph, idx| !labels.contains(&graph[idx].label));
    }

    /// Deletes blocks not reachable from the entry. The exit block is kept
    /// even when nothing returns (an infinite loop never reaches it).
    ///
    /// Returns the labels of the removed blocks.
    pub fn remove_unreachable_blocks(&mut self) -> Vec<Arc<str>> {
        let reachable: HashSet<NodeIndex> = self.bfs_order().into_iter().collect();
        let exit = self.exit_index();
        let doomed: HashSet<Arc<str>> = self
            .graph
            .node_indices()
            .filter(|idx| !reachable.contains(idx) && Some(*idx) != exit)
            .map(|idx| self.graph[idx].label.clone())
            .collect();
        let mut removed: Vec<Arc<str>> = doomed.iter().cloned().collect();
        removed.sort_by_key(|label| Self::block_number(label));
        self.remove_blocks(&doomed);
        removed
    }

    /// Next unused `BB<n>` label.
    #[must_use]
    pub fn fresh_label(&self) -> String {
        let next = self
            .blocks()
            .map(|b| Self::block_number(&b.label))
            .filter(|&n| n != u32::MAX)
            .max()
            .map_or(0, |n| n + 1);
        format!("BB{next}")
    }
}
