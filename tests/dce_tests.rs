// tests/dce_tests.rs
//! Dead code elimination: liveness seeding, phi removal, idempotence.

use opalc::ir::generator::IrGenerator;
use opalc::ir::optimizer::{DeadCodeElimination, Pass};
use opalc::ir::ssa::SsaBuilder;
use opalc::ir::{Function, verifier};
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::parser::opal_parser::OpalParser;
use opalc::semantic::analyzer::SemanticAnalyzer;

fn lower_to_ssa(src: &str) -> Function {
    let mut lexer = Lexer::new("test.opal", src);
    let (tokens, lex_errors) = lexer_tokenize_with_errors(&mut lexer);
    assert!(lex_errors.is_empty());
    let (program, parse_errors) = OpalParser::new(tokens).parse();
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
    assert!(SemanticAnalyzer::new().analyze(&program).is_empty());
    let mut module = IrGenerator::new().generate(&program).expect("lowering failed");
    let main_at = module.functions.iter().position(|f| f.name == "main").expect("main exists");
    let mut func = module.functions.remove(main_at);
    SsaBuilder::new().build(&mut func).expect("SSA construction failed");
    func
}

fn lower_main_to_ssa(body: &str) -> Function {
    lower_to_ssa(&format!("func main() -> int {{ {body} }}"))
}

#[test]
fn removes_unused_pure_assignment() {
    let mut func = lower_main_to_ssa("a int = 1; b int = 2; return a;");
    assert!(DeadCodeElimination::new().run(&mut func).expect("dce failed"));
    verifier::verify_ssa(&func).expect("invariants after dce");

    let expected = "\
BB0: ; [entry]
  a_v1 = 1
  return(a_v1)";
    assert_eq!(expected, func.to_ir().trim());
}

#[test]
fn keeps_transitively_used_chain() {
    let mut func = lower_main_to_ssa("a int = 1; b int = a + 1; c int = b * 2; return c;");
    let changed = DeadCodeElimination::new().run(&mut func).expect("dce failed");
    assert!(!changed, "everything feeds the return");
}

#[test]
fn calls_survive_without_users() {
    let mut func = lower_to_ssa(
        "
        func noise() -> int { return 1; }
        func main() -> int { noise(); return 0; }
        ",
    );
    DeadCodeElimination::new().run(&mut func).expect("dce failed");
    let ir = func.to_ir();
    assert!(ir.contains("%0_v1 = noise()"), "side-effecting call must stay:\n{ir}");
}

#[test]
fn cmp_operands_stay_live() {
    let mut func = lower_main_to_ssa("a int = 0; if (a > 0) { a = 10; } return 0;");
    DeadCodeElimination::new().run(&mut func).expect("dce failed");
    verifier::verify_ssa(&func).expect("invariants after dce");

    let ir = func.to_ir();
    // The comparison chain survives; the phi and the branch stores are
    // dead because the return is a literal.
    assert!(ir.contains("%0_v1 = a_v1 > 0"), "cmp operand chain kept:\n{ir}");
    assert!(ir.contains("cmp(%0_v1, 1)"), "cmp kept:\n{ir}");
    assert!(!ir.contains("ϕ"), "unused phi removed:\n{ir}");
    assert!(!ir.contains("a_v2"), "branch store feeds only the dead phi:\n{ir}");
}

#[test]
fn phi_kept_alive_by_return() {
    let mut func = lower_main_to_ssa("a int = 0; if (a > 0) { a = 10; } return a;");
    let changed = DeadCodeElimination::new().run(&mut func).expect("dce failed");
    assert!(!changed, "the phi feeds the return; nothing is dead");
    let ir = func.to_ir();
    assert!(ir.contains("a_v3 = ϕ(BB0: a_v1, BB2: a_v2)"), "live phi kept:\n{ir}");
}

#[test]
fn terminators_are_never_dropped() {
    let mut func = lower_main_to_ssa("s int = 0; for (i int = 0; i < 10; i = i + 1) { s = s + i; } return 0;");
    DeadCodeElimination::new().run(&mut func).expect("dce failed");
    verifier::verify_cfg(&func).expect("structure after dce");
    for block in func.cfg.blocks() {
        if block.label.as_ref() == "BB1" {
            continue;
        }
        assert!(block.has_terminator(), "block {} lost its terminator", block.label);
    }
}

#[test]
fn dce_is_idempotent() {
    let mut func = lower_main_to_ssa("a int = 0; b int = 2; if (a > 0) { a = 10; b = a; } return 0;");
    DeadCodeElimination::new().run(&mut func).expect("first run");
    let after_first = func.to_ir();
    let changed = DeadCodeElimination::new().run(&mut func).expect("second run");
    assert!(!changed, "second run must be quiet");
    assert_eq!(after_first, func.to_ir());
}
