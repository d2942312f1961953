// src/lib.rs
/// # Opal Compiler Library
///
/// `opalc` compiles the Opal toy language through the classic phases:
/// lexical analysis, parsing, semantic analysis, CFG construction, SSA
/// conversion, and an SSA optimization pipeline (SCCP, LICM, DCE).
///
/// ## Important modules:
/// * `lexer` - Converts source text to tokens (powered by logos)
/// * `parser` - Builds the abstract syntax tree
/// * `semantic` - Name resolution, arity and return-type checking
/// * `ir` - CFG construction, dominance analysis, SSA form and the
///   optimization passes
/// * `printers` - Textual IR dumps and Graphviz rendering
/// * `error` - Error types and the styled error reporter
/// * `cli` - Command-line interface definition
pub mod cli;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod location;
pub mod parser;
pub mod printers;
pub mod semantic;
pub mod time;
pub mod tokens;
pub mod utils;
