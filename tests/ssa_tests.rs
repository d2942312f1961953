// tests/ssa_tests.rs
//! SSA construction: φ placement, versioning, and the SSA invariants.

use opalc::ir::generator::IrGenerator;
use opalc::ir::ssa::SsaBuilder;
use opalc::ir::{Function, verifier};
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::parser::opal_parser::OpalParser;
use opalc::semantic::analyzer::SemanticAnalyzer;

fn lower_to_ssa(src: &str) -> Function {
    let mut lexer = Lexer::new("test.opal", src);
    let (tokens, lex_errors) = lexer_tokenize_with_errors(&mut lexer);
    assert!(lex_errors.is_empty(), "lexer errors: {lex_errors:?}");
    let (program, parse_errors) = OpalParser::new(tokens).parse();
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
    let errors = SemanticAnalyzer::new().analyze(&program);
    assert!(errors.is_empty(), "semantic errors: {errors:?}");
    let mut module = IrGenerator::new().generate(&program).expect("lowering failed");
    let mut func = module.functions.remove(0);
    SsaBuilder::new().build(&mut func).expect("SSA construction failed");
    func
}

fn lower_main_to_ssa(body: &str) -> Function {
    lower_to_ssa(&format!("func main() -> int {{ {body} }}"))
}

#[test]
fn straight_line_versions() {
    let func = lower_main_to_ssa("a int = 1; a = a + 1; a = a * 2; return a;");
    let expected = "\
BB0: ; [entry]
  a_v1 = 1
  a_v2 = a_v1 + 1
  a_v3 = a_v2 * 2
  return(a_v3)";
    assert_eq!(expected, func.to_ir().trim());
    verifier::verify_ssa(&func).expect("invariants");
}

#[test]
fn if_merge_gets_phi() {
    let func = lower_main_to_ssa("a int = 0; if (a > 0) { a = 10; } return a;");
    let expected = "\
BB0: ; [entry]
  a_v1 = 0
  %0_v1 = a_v1 > 0
  cmp(%0_v1, 1)
  if CF == 1 then jmp BB2 else jmp BB3

BB2: ; [then]
  a_v2 = 10
  jmp BB3

BB3: ; [merge]
  a_v3 = ϕ(BB0: a_v1, BB2: a_v2)

  return(a_v3)";
    assert_eq!(expected, func.to_ir().trim());
    verifier::verify_ssa(&func).expect("invariants");
}

#[test]
fn if_else_merge_gets_phi() {
    let func = lower_main_to_ssa("a int = 1; if (a < 10) { a = 2; } else { a = 3; } return a;");
    // Renaming visits dominator-tree children by block number: then (BB2),
    // merge (BB3), else (BB4), so the merge phi takes version 3.
    let expected = "\
BB0: ; [entry]
  a_v1 = 1
  %0_v1 = a_v1 < 10
  cmp(%0_v1, 1)
  if CF == 1 then jmp BB2 else jmp BB4

BB2: ; [then]
  a_v2 = 2
  jmp BB3

BB4: ; [else]
  a_v4 = 3
  jmp BB3

BB3: ; [merge]
  a_v3 = ϕ(BB2: a_v2, BB4: a_v4)

  return(a_v3)";
    assert_eq!(expected, func.to_ir().trim());
    verifier::verify_ssa(&func).expect("invariants");
}

#[test]
fn loop_carried_values_merge_in_header() {
    let func = lower_main_to_ssa("s int = 0; for (i int = 0; i < 10; i = i + 1) { s = s + i; } return s;");
    let expected = "\
BB0: ; [entry]
  s_v1 = 0
  jmp BB2

BB2: ; [loop init]
  i_v1 = 0
  jmp BB3

BB3: ; [loop header]
  s_v2 = ϕ(BB2: s_v1, BB6: s_v3)
  i_v2 = ϕ(BB2: i_v1, BB6: i_v3)

  %0_v1 = i_v2 < 10
  cmp(%0_v1, 1)
  if CF == 1 then jmp BB5 else jmp BB4

BB4: ; [loop exit]
  return(s_v2)

BB5: ; [loop body]
  s_v3 = s_v2 + i_v2
  jmp BB6

BB6: ; [loop update]
  i_v3 = i_v2 + 1
  jmp BB3";
    assert_eq!(expected, func.to_ir().trim());
    verifier::verify_ssa(&func).expect("invariants");
}

#[test]
fn temporaries_never_get_phis() {
    let func = lower_main_to_ssa("s int = 0; for (i int = 0; i < 10; i = i + 1) { s = s + i; } return s;");
    for block in func.cfg.blocks() {
        for phi in &block.phi_nodes {
            assert!(!phi.lhs.is_temp(), "temporary {} received a phi", phi.lhs);
        }
    }
}

#[test]
fn parameters_version_from_entry() {
    let func = lower_to_ssa("func add(x int, y int) -> int { return x + y; }");
    let expected = "\
BB0: ; [entry]
  %0_v1 = x_v1 + y_v1
  return(%0_v1)";
    assert_eq!(expected, func.to_ir().trim());
    verifier::verify_ssa(&func).expect("invariants");
}

#[test]
fn reassigned_parameter_needs_phi() {
    let func = lower_to_ssa(
        "
        func count(n int) -> int {
            for (i int = 0; i < 3; i = i + 1) {
                n = n + 1;
            }
            return n;
        }
        ",
    );
    let header = func.cfg.get_block("BB3").expect("loop header");
    let phi = header.phi("n").expect("parameter phi in the loop header");
    assert_eq!(phi.incoming.len(), 2);
    verifier::verify_ssa(&func).expect("invariants");
}

#[test]
fn single_definitions_after_renaming() {
    let func = lower_main_to_ssa(
        "
        a int = 1;
        b int = 2;
        if (a < b) { a = b; } else { b = a; }
        for (i int = 0; i < b; i = i + 1) { a = a + 1; }
        return a;
        ",
    );
    verifier::verify_ssa(&func).expect("invariants");

    use std::collections::HashSet;
    let mut seen = HashSet::new();
    for block in func.cfg.blocks() {
        for phi in &block.phi_nodes {
            assert!(seen.insert(phi.lhs.clone()), "duplicate definition {}", phi.lhs);
        }
        for inst in &block.instructions {
            if let Some(lhs) = inst.defined_value() {
                assert!(seen.insert(lhs.clone()), "duplicate definition {lhs}");
            }
        }
    }
}
