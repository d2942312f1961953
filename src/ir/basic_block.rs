// src/ir/basic_block.rs
use super::instruction::{Instruction, JumpKind, PhiNode};
use std::fmt;
use std::sync::Arc;

/// A straight-line sequence of instructions with a single entry.
///
/// Phi nodes are kept apart from ordinary instructions (at most one per base
/// name); control leaves through the trailing jump instructions or a return.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub label: Arc<str>,
    /// Display tag rendered as `; [tag]` in IR dumps (`entry`, `merge`,
    /// `loop header`, …).
    pub tag: Option<&'static str>,
    pub phi_nodes: Vec<PhiNode>,
    pub instructions: Vec<Instruction>,
}

/// A decoded view of a block's trailing control transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminatorView {
    /// No terminator yet (block under construction).
    None,
    Return,
    Goto(Arc<str>),
    /// A `jnz`/`jz` pair driven by the preceding `cmp`.
    Branch { cmp_index: Option<usize>, true_target: Arc<str>, false_target: Arc<str> },
}

impl BasicBlock {
    #[must_use]
    pub fn new(label: &str, tag: Option<&'static str>) -> Self {
        Self { label: Arc::from(label), tag, phi_nodes: Vec::new(), instructions: Vec::new() }
    }

    pub fn append(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Inserts an empty phi node for `base` unless one already exists.
    pub fn insert_phi(&mut self, base: &str) {
        if self.phi(base).is_none() {
            self.phi_nodes.push(PhiNode::new(base));
        }
    }

    #[must_use]
    pub fn phi(&self, base: &str) -> Option<&PhiNode> {
        self.phi_nodes.iter().find(|phi| phi.lhs.base.as_ref() == base)
    }

    pub fn phi_mut(&mut self, base: &str) -> Option<&mut PhiNode> {
        self.phi_nodes.iter_mut().find(|phi| phi.lhs.base.as_ref() == base)
    }

    #[must_use]
    pub fn has_terminator(&self) -> bool {
        self.instructions.last().is_some_and(Instruction::is_terminator)
    }

    /// Index of the first instruction belonging to the trailing terminator
    /// run (used to insert before the terminator).
    #[must_use]
    pub fn terminator_start(&self) -> usize {
        let mut idx = self.instructions.len();
        while idx > 0 && self.instructions[idx - 1].is_terminator() {
            idx -= 1;
        }
        idx
    }

    /// Decodes the trailing control transfer of this block.
    #[must_use]
    pub fn terminator(&self) -> TerminatorView {
        match self.instructions.last() {
            Some(Instruction::Return { .. }) => TerminatorView::Return,
            Some(Instruction::Jump { kind, target }) => {
                let false_kind = *kind;
                let false_target = target.clone();
                // A `jnz` directly before makes this the false leg of a
                // two-way branch.
                let len = self.instructions.len();
                if let Some(Instruction::Jump { kind: JumpKind::Jnz, target: true_target }) =
                    len.checked_sub(2).and_then(|i| self.instructions.get(i))
                {
                    debug_assert!(matches!(false_kind, JumpKind::Jz | JumpKind::Jmp));
                    let cmp_index = len.checked_sub(3).filter(|&i| {
                        matches!(self.instructions.get(i), Some(Instruction::Cmp { .. }))
                    });
                    TerminatorView::Branch {
                        cmp_index,
                        true_target: true_target.clone(),
                        false_target,
                    }
                } else if matches!(false_kind, JumpKind::Jmp) {
                    TerminatorView::Goto(false_target)
                } else {
                    TerminatorView::None
                }
            }
            _ => TerminatorView::None,
        }
    }

    /// Labels this block transfers control to.
    #[must_use]
    pub fn jump_targets(&self) -> Vec<Arc<str>> {
        let start = self.terminator_start();
        self.instructions[start..]
            .iter()
            .filter_map(|inst| match inst {
                Instruction::Jump { target, .. } => Some(target.clone()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for BasicBlock {
    /// Canonical dump form: label line with tag, phi nodes, a blank line
    /// when phis are present, then instructions. A `jnz`/`jz` pair renders
    /// as a single two-way branch line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => writeln!(f, "{}: ; [{tag}]", self.label)?,
            None => writeln!(f, "{}:", self.label)?,
        }
        for phi in &self.phi_nodes {
            writeln!(f, "  {phi}")?;
        }
        if !self.phi_nodes.is_empty() {
            writeln!(f)?;
        }
        let mut idx = 0;
        while idx < self.instructions.len() {
            if let (
                Some(Instruction::Jump { kind: JumpKind::Jnz, target: true_target }),
                Some(Instruction::Jump { kind: JumpKind::Jz | JumpKind::Jmp, target: false_target }),
            ) = (self.instructions.get(idx), self.instructions.get(idx + 1))
            {
                writeln!(f, "  if CF == 1 then jmp {true_target} else jmp {false_target}")?;
                idx += 2;
            } else {
                writeln!(f, "  {}", self.instructions[idx])?;
                idx += 1;
            }
        }
        Ok(())
    }
}
