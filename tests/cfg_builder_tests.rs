// tests/cfg_builder_tests.rs
//! Pre-SSA lowering: block shapes, edge linking, and the raw IR text.

use opalc::ir::generator::IrGenerator;
use opalc::ir::{Cfg, Module, verifier};
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::parser::opal_parser::OpalParser;
use opalc::semantic::analyzer::SemanticAnalyzer;

fn lower(src: &str) -> Module {
    let mut lexer = Lexer::new("test.opal", src);
    let (tokens, lex_errors) = lexer_tokenize_with_errors(&mut lexer);
    assert!(lex_errors.is_empty(), "lexer errors: {lex_errors:?}");
    let (program, parse_errors) = OpalParser::new(tokens).parse();
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
    let errors = SemanticAnalyzer::new().analyze(&program);
    assert!(errors.is_empty(), "semantic errors: {errors:?}");
    IrGenerator::new().generate(&program).expect("lowering failed")
}

fn lower_main(body: &str) -> opalc::ir::Function {
    let mut module = lower(&format!("func main() -> int {{ {body} }}"));
    assert_eq!(module.functions.len(), 1);
    module.functions.remove(0)
}

fn edge_exists(cfg: &Cfg, from: &str, to: &str) -> bool {
    match (cfg.find_block_by_label(from), cfg.find_block_by_label(to)) {
        (Some(f), Some(t)) => cfg.graph().find_edge(f, t).is_some(),
        _ => false,
    }
}

#[test]
fn straight_line_ir() {
    let func = lower_main("a int = 1; b int = a + 2; return b;");
    verifier::verify_cfg(&func).expect("structural invariants");

    let expected = "\
BB0: ; [entry]
  a = 1
  b = a + 2
  return(b)";
    assert_eq!(expected, func.to_ir().trim());
}

#[test]
fn if_without_else() {
    let func = lower_main("a int = 0; if (a > 0) { a = 10; } return a;");
    verifier::verify_cfg(&func).expect("structural invariants");

    let expected = "\
BB0: ; [entry]
  a = 0
  %0 = a > 0
  cmp(%0, 1)
  if CF == 1 then jmp BB2 else jmp BB3

BB2: ; [then]
  a = 10
  jmp BB3

BB3: ; [merge]
  return(a)";
    assert_eq!(expected, func.to_ir().trim());

    assert!(edge_exists(&func.cfg, "BB0", "BB2"));
    assert!(edge_exists(&func.cfg, "BB0", "BB3"));
    assert!(edge_exists(&func.cfg, "BB2", "BB3"));
    assert!(edge_exists(&func.cfg, "BB3", "BB1"), "return links to the exit block");
}

#[test]
fn if_with_else_block_shapes() {
    let func = lower_main("a int = 1; if (a < 10) { a = 2; } else { a = 3; } return a;");
    verifier::verify_cfg(&func).expect("structural invariants");

    // Creation order: then, merge, else.
    assert_eq!(func.cfg.get_block("BB2").map(|b| b.tag), Some(Some("then")));
    assert_eq!(func.cfg.get_block("BB3").map(|b| b.tag), Some(Some("merge")));
    assert_eq!(func.cfg.get_block("BB4").map(|b| b.tag), Some(Some("else")));
    assert!(edge_exists(&func.cfg, "BB0", "BB2"));
    assert!(edge_exists(&func.cfg, "BB0", "BB4"));
    assert!(edge_exists(&func.cfg, "BB2", "BB3"));
    assert!(edge_exists(&func.cfg, "BB4", "BB3"));
    assert!(!edge_exists(&func.cfg, "BB0", "BB3"));
}

#[test]
fn counted_for_loop_shape() {
    let func = lower_main("s int = 0; for (i int = 0; i < 10; i = i + 1) { s = s + i; } return s;");
    verifier::verify_cfg(&func).expect("structural invariants");

    // init, header, exit, body, update, in creation order.
    assert_eq!(func.cfg.get_block("BB2").map(|b| b.tag), Some(Some("loop init")));
    assert_eq!(func.cfg.get_block("BB3").map(|b| b.tag), Some(Some("loop header")));
    assert_eq!(func.cfg.get_block("BB4").map(|b| b.tag), Some(Some("loop exit")));
    assert_eq!(func.cfg.get_block("BB5").map(|b| b.tag), Some(Some("loop body")));
    assert_eq!(func.cfg.get_block("BB6").map(|b| b.tag), Some(Some("loop update")));

    assert!(edge_exists(&func.cfg, "BB0", "BB2"));
    assert!(edge_exists(&func.cfg, "BB2", "BB3"));
    assert!(edge_exists(&func.cfg, "BB3", "BB5"), "header branches into the body");
    assert!(edge_exists(&func.cfg, "BB3", "BB4"), "header branches to the exit");
    assert!(edge_exists(&func.cfg, "BB5", "BB6"));
    assert!(edge_exists(&func.cfg, "BB6", "BB3"), "update closes the back edge");

    let expected_header = "\
BB3: ; [loop header]
  %0 = i < 10
  cmp(%0, 1)
  if CF == 1 then jmp BB5 else jmp BB4";
    let ir = func.to_ir();
    assert!(ir.contains(expected_header), "header mismatch in:\n{ir}");
}

#[test]
fn unconditional_loop_back_edge_and_break() {
    let func = lower_main(
        "
        i int = 0;
        for {
            if (i > 5) { break; }
            i = i + 2;
        }
        return i;
        ",
    );
    verifier::verify_cfg(&func).expect("structural invariants");

    assert_eq!(func.cfg.get_block("BB2").map(|b| b.tag), Some(Some("loop init")));
    assert_eq!(func.cfg.get_block("BB3").map(|b| b.tag), Some(Some("loop body")));
    assert_eq!(func.cfg.get_block("BB4").map(|b| b.tag), Some(Some("loop exit")));

    assert!(edge_exists(&func.cfg, "BB2", "BB3"));
    assert!(edge_exists(&func.cfg, "BB6", "BB3"), "loop tail jumps back to the body");
    assert!(edge_exists(&func.cfg, "BB5", "BB4"), "break jumps to the loop exit");
}

#[test]
fn statements_after_return_are_dropped() {
    let func = lower_main("return 1; a int = 2;");
    // The trailing assignment lowered into an unreferenced block, which
    // the reachability cleanup removed.
    let ir = func.to_ir();
    assert!(!ir.contains("a = 2"), "dead statement survived:\n{ir}");
    let labels: Vec<&str> = func.cfg.blocks().map(|b| b.label.as_ref()).collect();
    assert_eq!(labels.len(), 2, "only entry and exit remain: {labels:?}");
}

#[test]
fn void_function_gets_implicit_return() {
    let mut module = lower("func main() -> void { a int = 1; }");
    let func = module.functions.remove(0);
    let expected = "\
BB0: ; [entry]
  a = 1
  return";
    assert_eq!(expected, func.to_ir().trim());
    assert!(edge_exists(&func.cfg, "BB0", "BB1"));
}

#[test]
fn call_statement_defines_a_temporary() {
    let module = lower(
        "
        func ping() -> void { }
        func main() -> void { ping(); }
        ",
    );
    let main = module.get_function("main").expect("main exists");
    let ir = main.to_ir();
    assert!(ir.contains("%0 = ping()"), "call statement should assign a temp:\n{ir}");
}

#[test]
fn nested_expression_temporaries_are_dense() {
    let func = lower_main("N int = 1; N = (N + 1) * 2; return N;");
    let expected = "\
BB0: ; [entry]
  N = 1
  %0 = N + 1
  N = %0 * 2
  return(N)";
    assert_eq!(expected, func.to_ir().trim());
}

#[test]
fn identifier_assignment_lowers_to_copy() {
    let func = lower_main("a int = 1; b int = a; return b;");
    let expected = "\
BB0: ; [entry]
  a = 1
  b = a
  return(b)";
    assert_eq!(expected, func.to_ir().trim());
}
