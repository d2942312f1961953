// src/printers/ir_printer.rs
//! Canonical textual IR.
//!
//! This serialization is the format golden tests compare against: blocks in
//! breadth-first order from the entry (successors by ascending block
//! number), each block as its label line, phi nodes, a separating blank
//! line, then instructions. Blocks with neither phis nor instructions (the
//! empty exit block) are skipped.

use crate::ir::{Function, Module};

#[must_use]
pub fn function_ir(func: &Function) -> String {
    let cfg = &func.cfg;
    let mut rendered: Vec<String> = Vec::new();
    for idx in cfg.bfs_order() {
        let block = cfg.block(idx);
        if block.phi_nodes.is_empty() && block.instructions.is_empty() {
            continue;
        }
        rendered.push(block.to_string());
    }
    rendered.join("\n")
}

#[must_use]
pub fn module_ir(module: &Module) -> String {
    module
        .functions
        .iter()
        .map(|func| format!("; function {}\n{}", func.name, function_ir(func)))
        .collect::<Vec<_>>()
        .join("\n")
}
