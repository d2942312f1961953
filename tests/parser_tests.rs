// tests/parser_tests.rs
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::parser::ast::*;
use opalc::parser::opal_parser::OpalParser;

fn parse(source: &str) -> (Program, Vec<opalc::error::compile_error::CompileError>) {
    let mut lexer = Lexer::new("test.opal", source);
    let (tokens, lex_errors) = lexer_tokenize_with_errors(&mut lexer);
    assert!(lex_errors.is_empty(), "lexer errors: {lex_errors:?}");
    OpalParser::new(tokens).parse()
}

fn parse_ok(source: &str) -> Program {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
    program
}

fn main_body(source: &str) -> Vec<Stmt> {
    let mut program = parse_ok(source);
    assert_eq!(program.functions.len(), 1);
    program.functions.remove(0).body.statements
}

#[test]
fn function_signature() {
    let program = parse_ok("func add(x int, y int) -> int { return x + y; }");
    let func = &program.functions[0];
    assert_eq!(func.name, "add");
    assert_eq!(func.return_type, Type::Int);
    let params: Vec<&str> = func.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["x", "y"]);
}

#[test]
fn void_function_without_params() {
    let program = parse_ok("func main() -> void { }");
    let func = &program.functions[0];
    assert_eq!(func.return_type, Type::Void);
    assert!(func.parameters.is_empty());
    assert!(func.body.statements.is_empty());
}

#[test]
fn statement_dispatch_on_identifier() {
    let statements = main_body(
        "func main() -> void {
            a int = 1;
            a = 2;
            foo();
        }",
    );
    assert!(matches!(&statements[0], Stmt::Declaration { name, .. } if name == "a"));
    assert!(matches!(&statements[1], Stmt::Assignment { name, .. } if name == "a"));
    assert!(matches!(&statements[2], Stmt::Call { name, .. } if name == "foo"));
}

#[test]
fn precedence_mul_binds_tighter_than_add() {
    let statements = main_body("func main() -> void { a int = 1 + 2 * 3; }");
    let Stmt::Declaration { value, .. } = &statements[0] else { panic!("expected declaration") };
    let Expr::Binary { op: BinaryOp::Add, right, .. } = value else { panic!("expected addition, got {value:?}") };
    assert!(matches!(right.as_ref(), Expr::Binary { op: BinaryOp::Multiply, .. }));
}

#[test]
fn precedence_comparison_over_logical() {
    // 1 < 2 && 3 > 4  parses as  (1 < 2) && (3 > 4)
    let statements = main_body("func main() -> void { a int = 1 < 2 && 3 > 4; }");
    let Stmt::Declaration { value, .. } = &statements[0] else { panic!("expected declaration") };
    let Expr::Binary { op: BinaryOp::And, left, right, .. } = value else { panic!("expected &&, got {value:?}") };
    assert!(matches!(left.as_ref(), Expr::Binary { op: BinaryOp::Less, .. }));
    assert!(matches!(right.as_ref(), Expr::Binary { op: BinaryOp::Greater, .. }));
}

#[test]
fn left_associativity() {
    // 10 - 4 - 3 parses as (10 - 4) - 3
    let statements = main_body("func main() -> void { a int = 10 - 4 - 3; }");
    let Stmt::Declaration { value, .. } = &statements[0] else { panic!("expected declaration") };
    let Expr::Binary { op: BinaryOp::Subtract, left, right, .. } = value else { panic!("expected -") };
    assert!(matches!(left.as_ref(), Expr::Binary { op: BinaryOp::Subtract, .. }));
    assert!(matches!(right.as_ref(), Expr::Literal { value: 3, .. }));
}

#[test]
fn parentheses_override_precedence() {
    let statements = main_body("func main() -> void { a int = (1 + 2) * 3; }");
    let Stmt::Declaration { value, .. } = &statements[0] else { panic!("expected declaration") };
    let Expr::Binary { op: BinaryOp::Multiply, left, .. } = value else { panic!("expected multiplication") };
    assert!(matches!(left.as_ref(), Expr::Binary { op: BinaryOp::Add, .. }));
}

#[test]
fn unary_operators() {
    let statements = main_body("func main() -> void { a int = -1 + !0; }");
    let Stmt::Declaration { value, .. } = &statements[0] else { panic!("expected declaration") };
    let Expr::Binary { op: BinaryOp::Add, left, right, .. } = value else { panic!("expected addition") };
    assert!(matches!(left.as_ref(), Expr::Unary { op: UnaryOp::Negate, .. }));
    assert!(matches!(right.as_ref(), Expr::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn call_arguments_and_nesting() {
    let statements = main_body("func main() -> void { a int = add(add(1, 2), 3); }");
    let Stmt::Declaration { value, .. } = &statements[0] else { panic!("expected declaration") };
    let Expr::Call { name, args, .. } = value else { panic!("expected call") };
    assert_eq!(name, "add");
    assert_eq!(args.len(), 2);
    assert!(matches!(&args[0], Expr::Call { .. }));
    assert!(matches!(&args[1], Expr::Literal { value: 3, .. }));
}

#[test]
fn counted_for_loop() {
    let statements = main_body("func main() -> void { for (i int = 0; i < 10; i = i + 1) { } }");
    let Stmt::For { init, condition, update, body, .. } = &statements[0] else { panic!("expected for") };
    assert!(matches!(init.as_ref(), Stmt::Declaration { name, .. } if name == "i"));
    assert!(matches!(condition, Expr::Binary { op: BinaryOp::Less, .. }));
    assert!(matches!(update.as_ref(), Stmt::Assignment { name, .. } if name == "i"));
    assert!(body.statements.is_empty());
}

#[test]
fn unconditional_loop_with_break_and_continue() {
    let statements = main_body("func main() -> void { for { break; continue; } }");
    let Stmt::Loop { body, .. } = &statements[0] else { panic!("expected loop") };
    assert!(matches!(body.statements[0], Stmt::Break { .. }));
    assert!(matches!(body.statements[1], Stmt::Continue { .. }));
}

#[test]
fn if_else_chains() {
    let statements = main_body("func main() -> void { if (1) { } else { if (2) { } } }");
    let Stmt::If { else_block: Some(else_block), .. } = &statements[0] else { panic!("expected if/else") };
    assert!(matches!(&else_block.statements[0], Stmt::If { else_block: None, .. }));
}

#[test]
fn return_with_and_without_value() {
    let statements = main_body("func main() -> void { return; }");
    assert!(matches!(&statements[0], Stmt::Return { value: None, .. }));

    let statements = main_body("func main() -> int { return 1 + 2; }");
    assert!(matches!(&statements[0], Stmt::Return { value: Some(Expr::Binary { .. }), .. }));
}

#[test]
fn missing_semicolon_is_reported() {
    let (_, errors) = parse("func main() -> void { a int = 1 }");
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.to_string().contains("Expected ';'")), "got: {errors:?}");
}

#[test]
fn error_recovery_keeps_later_functions() {
    let (program, errors) = parse(
        "func broken() -> void { a int = ; }
func fine() -> void { }",
    );
    assert!(!errors.is_empty());
    assert!(program.functions.iter().any(|f| f.name == "fine"), "parser should recover at the next function");
}

#[test]
fn top_level_garbage_is_rejected() {
    let (_, errors) = parse("return 1;");
    assert!(errors.iter().any(|e| e.to_string().contains("Expected 'func'")), "got: {errors:?}");
}
