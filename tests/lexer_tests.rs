// tests/lexer_tests.rs
use opalc::lexer::{Lexer, lexer_tokenize_with_errors};
use opalc::tokens::token_kind::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new("test.opal", source);
    let (tokens, errors) = lexer_tokenize_with_errors(&mut lexer);
    assert!(errors.is_empty(), "unexpected lexer errors: {errors:?}");
    tokens.into_iter().map(|t| t.kind).collect()
}

#[test]
fn keywords_and_identifiers() {
    let tokens = kinds("func main intx void");
    assert_eq!(
        tokens,
        vec![
            TokenKind::KeywordFunc,
            TokenKind::Identifier("main".to_string()),
            TokenKind::Identifier("intx".to_string()),
            TokenKind::KeywordVoid,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn operators_longest_match_first() {
    let tokens = kinds("<= < << = == -> - !=");
    assert_eq!(
        tokens,
        vec![
            TokenKind::LessEqual,
            TokenKind::Less,
            TokenKind::ShiftLeft,
            TokenKind::Equal,
            TokenKind::EqualEqual,
            TokenKind::Arrow,
            TokenKind::Minus,
            TokenKind::NotEqual,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn integer_literals() {
    let tokens = kinds("0 42 9223372036854775807");
    assert_eq!(
        tokens,
        vec![TokenKind::Integer(0), TokenKind::Integer(42), TokenKind::Integer(i64::MAX), TokenKind::Eof]
    );
}

#[test]
fn line_comments_are_skipped() {
    let tokens = kinds("a int = 1; // trailing comment\n// full line\nb");
    assert_eq!(
        tokens,
        vec![
            TokenKind::Identifier("a".to_string()),
            TokenKind::KeywordInt,
            TokenKind::Equal,
            TokenKind::Integer(1),
            TokenKind::Semicolon,
            TokenKind::Identifier("b".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn oversized_literal_is_an_error() {
    let mut lexer = Lexer::new("test.opal", "a int = 99999999999999999999;");
    let (_, errors) = lexer_tokenize_with_errors(&mut lexer);
    assert_eq!(errors.len(), 1);
    let message = errors[0].to_string();
    assert!(message.contains("Invalid token"), "unexpected message: {message}");
}

#[test]
fn invalid_character_is_reported_with_position() {
    let mut lexer = Lexer::new("test.opal", "a int = 1;\n@");
    let (tokens, errors) = lexer_tokenize_with_errors(&mut lexer);
    assert_eq!(errors.len(), 1);
    let span = errors[0].span().expect("lexer errors carry spans");
    assert_eq!(span.start.line, 2);
    assert_eq!(span.start.column, 1);
    // The valid prefix still tokenizes.
    assert!(tokens.len() > 4);
}

#[test]
fn spans_track_lines_and_columns() {
    let mut lexer = Lexer::new("test.opal", "func main\nreturn");
    let (tokens, _) = lexer_tokenize_with_errors(&mut lexer);
    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    assert_eq!(tokens[1].span.start.column, 6);
    assert_eq!(tokens[2].span.start.line, 2);
    assert_eq!(tokens[2].span.start.column, 1);
}
