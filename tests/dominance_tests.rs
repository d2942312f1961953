// tests/dominance_tests.rs
//! Dominator tree and dominance frontier computation on hand-built CFGs.

use opalc::ir::dominance::DominanceInfo;
use opalc::ir::{BasicBlock, Cfg};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;

fn add_blocks(cfg: &mut Cfg, labels: &[&str]) -> Vec<NodeIndex> {
    labels.iter().map(|label| cfg.add_block(BasicBlock::new(label, None))).collect()
}

#[test]
fn linear_chain() {
    // BB0 -> BB2 -> BB3
    let mut cfg = Cfg::new("BB0", "BB1");
    let nodes = add_blocks(&mut cfg, &["BB0", "BB1", "BB2", "BB3"]);
    cfg.add_edge(nodes[0], nodes[2]);
    cfg.add_edge(nodes[2], nodes[3]);
    cfg.add_edge(nodes[3], nodes[1]);

    let dominance = DominanceInfo::compute(&cfg).expect("dominance");
    assert_eq!(dominance.immediate_dominator(nodes[0]), Some(nodes[0]));
    assert_eq!(dominance.immediate_dominator(nodes[2]), Some(nodes[0]));
    assert_eq!(dominance.immediate_dominator(nodes[3]), Some(nodes[2]));
    assert!(dominance.dominates(nodes[0], nodes[3]));
    assert!(dominance.dominates(nodes[2], nodes[3]));
    assert!(!dominance.dominates(nodes[3], nodes[2]));
}

#[test]
fn diamond() {
    // BB0 -> {BB2, BB3} -> BB4
    let mut cfg = Cfg::new("BB0", "BB1");
    let nodes = add_blocks(&mut cfg, &["BB0", "BB1", "BB2", "BB3", "BB4"]);
    cfg.add_edge(nodes[0], nodes[2]);
    cfg.add_edge(nodes[0], nodes[3]);
    cfg.add_edge(nodes[2], nodes[4]);
    cfg.add_edge(nodes[3], nodes[4]);
    cfg.add_edge(nodes[4], nodes[1]);

    let dominance = DominanceInfo::compute(&cfg).expect("dominance");
    assert_eq!(dominance.immediate_dominator(nodes[2]), Some(nodes[0]));
    assert_eq!(dominance.immediate_dominator(nodes[3]), Some(nodes[0]));
    // The join point is dominated by the fork, not by either arm.
    assert_eq!(dominance.immediate_dominator(nodes[4]), Some(nodes[0]));

    // Both arms have the join in their frontier; the fork does not.
    let df2: HashSet<NodeIndex> = dominance.dominance_frontier(nodes[2]).cloned().unwrap_or_default();
    let df3: HashSet<NodeIndex> = dominance.dominance_frontier(nodes[3]).cloned().unwrap_or_default();
    assert_eq!(df2, HashSet::from([nodes[4]]));
    assert_eq!(df3, HashSet::from([nodes[4]]));
    assert!(dominance.dominance_frontier(nodes[0]).is_none());
}

#[test]
fn loop_header_is_in_its_own_frontier() {
    // BB0 -> BB2(header) -> BB3(body) -> BB2, BB2 -> BB4(exit)
    let mut cfg = Cfg::new("BB0", "BB1");
    let nodes = add_blocks(&mut cfg, &["BB0", "BB1", "BB2", "BB3", "BB4"]);
    cfg.add_edge(nodes[0], nodes[2]);
    cfg.add_edge(nodes[2], nodes[3]);
    cfg.add_edge(nodes[3], nodes[2]);
    cfg.add_edge(nodes[2], nodes[4]);
    cfg.add_edge(nodes[4], nodes[1]);

    let dominance = DominanceInfo::compute(&cfg).expect("dominance");
    assert_eq!(dominance.immediate_dominator(nodes[3]), Some(nodes[2]));
    assert_eq!(dominance.immediate_dominator(nodes[4]), Some(nodes[2]));

    let df_body: HashSet<NodeIndex> = dominance.dominance_frontier(nodes[3]).cloned().unwrap_or_default();
    assert_eq!(df_body, HashSet::from([nodes[2]]), "the back edge puts the header in the body's frontier");
    let df_header: HashSet<NodeIndex> = dominance.dominance_frontier(nodes[2]).cloned().unwrap_or_default();
    assert_eq!(df_header, HashSet::from([nodes[2]]), "a loop header is in its own frontier");
}

#[test]
fn iterated_frontier_closes_over_chains() {
    // Two nested joins: defs in BB2 and BB3 require phis at BB4, and the
    // phi at BB4 is itself a definition requiring one at BB6.
    //
    // BB0 -> {BB2, BB3} -> BB4 -> BB6, BB0 -> BB5 -> BB6
    let mut cfg = Cfg::new("BB0", "BB1");
    let nodes = add_blocks(&mut cfg, &["BB0", "BB1", "BB2", "BB3", "BB4", "BB5", "BB6"]);
    cfg.add_edge(nodes[0], nodes[2]);
    cfg.add_edge(nodes[0], nodes[3]);
    cfg.add_edge(nodes[2], nodes[4]);
    cfg.add_edge(nodes[3], nodes[4]);
    cfg.add_edge(nodes[0], nodes[5]);
    cfg.add_edge(nodes[4], nodes[6]);
    cfg.add_edge(nodes[5], nodes[6]);
    cfg.add_edge(nodes[6], nodes[1]);

    let dominance = DominanceInfo::compute(&cfg).expect("dominance");
    let defs = HashSet::from([nodes[2], nodes[3]]);
    let idf = dominance.iterated_dominance_frontier(&defs);
    assert_eq!(idf, HashSet::from([nodes[4], nodes[6]]));
}

#[test]
fn dominator_tree_children_are_sorted() {
    let mut cfg = Cfg::new("BB0", "BB1");
    let nodes = add_blocks(&mut cfg, &["BB0", "BB1", "BB4", "BB2", "BB3"]);
    // BB0 forks to BB4, BB2, with both reaching BB3.
    cfg.add_edge(nodes[0], nodes[2]);
    cfg.add_edge(nodes[0], nodes[3]);
    cfg.add_edge(nodes[2], nodes[4]);
    cfg.add_edge(nodes[3], nodes[4]);
    cfg.add_edge(nodes[4], nodes[1]);

    let dominance = DominanceInfo::compute(&cfg).expect("dominance");
    let children = dominance.dominator_tree_children(nodes[0]);
    let labels: Vec<&str> = children.iter().map(|&c| cfg.block(c).label.as_ref()).collect();
    assert_eq!(labels, vec!["BB2", "BB3", "BB4"], "children ordered by block number");
}
