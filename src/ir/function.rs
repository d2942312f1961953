// src/ir/function.rs
use super::cfg::Cfg;
use super::types::IrType;
use super::value::SsaValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One lowered function: its CFG plus the renaming state the SSA builder
/// left behind (so later passes can mint fresh versions).
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<Arc<str>>,
    pub return_type: IrType,
    pub cfg: Cfg,
    /// Highest version allocated per base name; empty before SSA
    /// construction.
    pub version_counters: HashMap<Arc<str>, u32>,
}

impl Function {
    #[must_use]
    pub fn new(name: &str, params: Vec<Arc<str>>, return_type: IrType, cfg: Cfg) -> Self {
        Self { name: name.to_string(), params, return_type, cfg, version_counters: HashMap::new() }
    }

    /// Mints the next version of `base`, keeping the single-definition
    /// invariant for values created after SSA construction.
    pub fn allocate_version(&mut self, base: &Arc<str>) -> SsaValue {
        let counter = self.version_counters.entry(base.clone()).or_insert(0);
        *counter += 1;
        SsaValue::versioned(base.clone(), *counter)
    }

    /// Canonical textual IR of this function.
    #[must_use]
    pub fn to_ir(&self) -> String {
        crate::printers::ir_printer::function_ir(self)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ir())
    }
}
