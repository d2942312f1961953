// tests/ir_snapshot_tests.rs
//! Inline snapshots of whole-module dumps.

use insta::assert_snapshot;
use opalc::ir::generator::IrGenerator;
use opalc::ir::optimizer::{self, PipelineConfig};
use opalc::ir::ssa::SsaBuilder;
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::parser::opal_parser::OpalParser;
use opalc::semantic::analyzer::SemanticAnalyzer;

fn optimized_module_ir(src: &str) -> String {
    let mut lexer = Lexer::new("test.opal", src);
    let (tokens, lex_errors) = lexer_tokenize_with_errors(&mut lexer);
    assert!(lex_errors.is_empty());
    let (program, parse_errors) = OpalParser::new(tokens).parse();
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
    assert!(SemanticAnalyzer::new().analyze(&program).is_empty());

    let mut module = IrGenerator::new().generate(&program).expect("lowering failed");
    for func in &mut module.functions {
        SsaBuilder::new().build(func).expect("ssa");
    }
    let errors = optimizer::optimize_module(&mut module, &PipelineConfig::default());
    assert!(errors.is_empty(), "optimizer errors: {errors:?}");
    module.to_ir().trim().to_string()
}

#[test]
fn snapshot_trivial_module() {
    let ir = optimized_module_ir("func main() -> int { a int = 0; return a; }");
    assert_snapshot!(ir, @r"
; function main
BB0: ; [entry]
  return(0)
");
}

#[test]
fn snapshot_two_functions() {
    let ir = optimized_module_ir(
        "func add(x int, y int) -> int { return x + y; }
func main() -> int { b int = add(10, 5); return b; }",
    );
    assert_snapshot!(ir, @r"
; function add
BB0: ; [entry]
  %0_v1 = x_v1 + y_v1
  return(%0_v1)

; function main
BB0: ; [entry]
  b_v1 = add(10, 5)
  return(b_v1)
");
}
