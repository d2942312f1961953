// src/lexer.rs
//! Lexical analysis for Opal source code.
//!
//! The heavy lifting is done by a [`logos`]-derived [`TokenKind`]; this
//! module pairs each token with a [`SourceSpan`] and turns unrecognized
//! slices into [`CompileError::LexerError`]s.

use crate::{
    error::compile_error::CompileError,
    location::line_tracker::LineTracker,
    tokens::{token::Token, token_kind::TokenKind},
};
use logos::Logos;

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    line_tracker: LineTracker,
    source_len: usize,
    eof_emitted: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(file_path: &str, source: &'a str) -> Self {
        let line_tracker = LineTracker::new(file_path, source.to_owned());
        let inner = TokenKind::lexer(source);
        Lexer { inner, line_tracker, source_len: source.len(), eof_emitted: false }
    }

    /// Returns a reference to the line tracker for diagnostic rendering.
    #[must_use]
    pub const fn line_tracker(&self) -> &LineTracker {
        &self.line_tracker
    }

    /// Retrieves the next token, or `None` once the EOF token was emitted.
    pub fn next_token(&mut self) -> Option<Result<Token, CompileError>> {
        if self.eof_emitted {
            return None;
        }

        let (kind_result, range) = if let Some(kind_result) = self.inner.next() {
            (kind_result, self.inner.span())
        } else {
            self.eof_emitted = true;
            (Ok(TokenKind::Eof), self.source_len..self.source_len)
        };

        let span = self.line_tracker.span_for(range);
        Some(match kind_result {
            Ok(kind) => Ok(Token { kind, span }),
            Err(()) => Err(CompileError::LexerError {
                message: format!("Invalid token: {:?}", self.inner.slice()),
                span,
            }),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Drains the lexer, separating valid tokens from errors.
///
/// The token stream always ends with [`TokenKind::Eof`], even when errors
/// occurred, so the parser can still synchronize on a partial stream.
pub fn lexer_tokenize_with_errors(lexer: &mut Lexer) -> (Vec<Token>, Vec<CompileError>) {
    let estimated_tokens = lexer.source_len / 8;
    let mut tokens = Vec::with_capacity(estimated_tokens);
    let mut errors = Vec::with_capacity(4);

    while let Some(token_result) = lexer.next_token() {
        match token_result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }
    (tokens, errors)
}
