// src/tokens/token_kind.rs
use logos::Logos;
use std::fmt;

/// Callback for integer literals.
///
/// Literals that do not fit in an `i64` are rejected, which surfaces as a
/// lexer error on the offending slice.
fn parse_int(lex: &mut logos::Lexer<TokenKind>) -> Option<i64> {
    lex.slice().parse::<i64>().ok()
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
pub enum TokenKind {
    // Multi-character operators first (longest match wins)
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("->")]
    Arrow,

    // Single-character operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Not,
    #[token("=")]
    Equal,
    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("^")]
    Xor,

    // Punctuation
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,

    // Keywords
    #[token("func")]
    KeywordFunc,
    #[token("if")]
    KeywordIf,
    #[token("else")]
    KeywordElse,
    #[token("for")]
    KeywordFor,
    #[token("return")]
    KeywordReturn,
    #[token("break")]
    KeywordBreak,
    #[token("continue")]
    KeywordContinue,
    #[token("int")]
    KeywordInt,
    #[token("void")]
    KeywordVoid,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 2)]
    Identifier(String),

    #[regex(r"[0-9]+", parse_int)]
    Integer(i64),

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::EqualEqual => f.write_str("'=='"),
            TokenKind::NotEqual => f.write_str("'!='"),
            TokenKind::LessEqual => f.write_str("'<='"),
            TokenKind::GreaterEqual => f.write_str("'>='"),
            TokenKind::AndAnd => f.write_str("'&&'"),
            TokenKind::OrOr => f.write_str("'||'"),
            TokenKind::ShiftLeft => f.write_str("'<<'"),
            TokenKind::ShiftRight => f.write_str("'>>'"),
            TokenKind::Arrow => f.write_str("'->'"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::Slash => f.write_str("'/'"),
            TokenKind::Percent => f.write_str("'%'"),
            TokenKind::Less => f.write_str("'<'"),
            TokenKind::Greater => f.write_str("'>'"),
            TokenKind::Not => f.write_str("'!'"),
            TokenKind::Equal => f.write_str("'='"),
            TokenKind::And => f.write_str("'&'"),
            TokenKind::Or => f.write_str("'|'"),
            TokenKind::Xor => f.write_str("'^'"),
            TokenKind::OpenParen => f.write_str("'('"),
            TokenKind::CloseParen => f.write_str("')'"),
            TokenKind::OpenBrace => f.write_str("'{'"),
            TokenKind::CloseBrace => f.write_str("'}'"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::KeywordFunc => f.write_str("'func'"),
            TokenKind::KeywordIf => f.write_str("'if'"),
            TokenKind::KeywordElse => f.write_str("'else'"),
            TokenKind::KeywordFor => f.write_str("'for'"),
            TokenKind::KeywordReturn => f.write_str("'return'"),
            TokenKind::KeywordBreak => f.write_str("'break'"),
            TokenKind::KeywordContinue => f.write_str("'continue'"),
            TokenKind::KeywordInt => f.write_str("'int'"),
            TokenKind::KeywordVoid => f.write_str("'void'"),
            TokenKind::Identifier(name) => write!(f, "identifier '{name}'"),
            TokenKind::Integer(value) => write!(f, "integer '{value}'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}
