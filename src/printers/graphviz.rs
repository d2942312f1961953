// src/printers/graphviz.rs
//! Graphviz rendering of a function's CFG, for debugging.
//!
//! Colors are assigned by a deterministic palette walk keyed by the order
//! labels are first requested; rendering the same CFG twice produces
//! byte-identical output.

use crate::ir::Function;
use crate::ir::dominance::DominanceInfo;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

/// Deterministic label → color assignment.
///
/// Walks a fixed offset pattern through the RGB cube, halving the stride
/// once a lap completes, so nearby blocks get visually distinct colors
/// without any randomness.
struct ColorAllocator {
    step: i64,
    cur: i64,
    assigned: HashMap<Arc<str>, String>,
}

impl ColorAllocator {
    fn new() -> Self {
        Self { step: 256, cur: 128, assigned: HashMap::new() }
    }

    fn color(&mut self, label: &Arc<str>) -> String {
        if let Some(color) = self.assigned.get(label) {
            return color.clone();
        }
        let r = (self.cur + 192).rem_euclid(256);
        let g = (self.cur + 86).rem_euclid(256);
        let b = self.cur.rem_euclid(256);
        let color = format!("#{r:02x}{g:02x}{b:02x}");
        self.assigned.insert(label.clone(), color.clone());

        self.cur += self.step;
        if self.cur >= 256 {
            self.step /= 2;
            self.cur = self.step / 2;
        }
        color
    }
}

/// Renders the CFG as a `dot` digraph; pass dominance info to overlay the
/// dominator tree as dashed edges.
#[must_use]
pub fn cfg_to_dot(func: &Function, dominance: Option<&DominanceInfo>) -> String {
    let cfg = &func.cfg;
    let mut colors = ColorAllocator::new();
    let mut out = String::new();

    let _ = writeln!(out, "digraph \"{}\" {{", func.name);
    let _ = writeln!(out, "  node [shape=box fontname=\"monospace\"];");

    let order = cfg.bfs_order();
    for &idx in &order {
        let block = cfg.block(idx);
        let color = colors.color(&block.label);
        let text = escape_label(&block.to_string());
        let _ = writeln!(out, "  \"{}\" [label=\"{text}\" color=\"{color}\"];", block.label);
    }
    for &idx in &order {
        let from = &cfg.block(idx).label;
        for succ in cfg.succs(idx) {
            let _ = writeln!(out, "  \"{from}\" -> \"{}\";", cfg.block(succ).label);
        }
    }
    if let Some(dominance) = dominance {
        for &idx in &order {
            let parent = &cfg.block(idx).label;
            for &child in dominance.dominator_tree_children(idx) {
                let _ = writeln!(
                    out,
                    "  \"{parent}\" -> \"{}\" [style=dashed constraint=false];",
                    cfg.block(child).label
                );
            }
        }
    }
    out.push_str("}\n");
    out
}

/// Escapes a block dump into a left-aligned dot label.
fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for line in text.lines() {
        for ch in line.chars() {
            match ch {
                '"' => escaped.push_str("\\\""),
                '\\' => escaped.push_str("\\\\"),
                _ => escaped.push(ch),
            }
        }
        escaped.push_str("\\l");
    }
    escaped
}
