// src/error/error_reporter.rs
use crate::error::compile_error::CompileError;
use crate::location::line_tracker::LineTracker;
use crate::location::source_span::SourceSpan;
use console::style;
use std::fmt::Write;

/// Renders compile errors with source context and caret underlining.
pub struct ErrorReporter {
    line_tracker: LineTracker,
}

impl ErrorReporter {
    #[must_use]
    pub const fn new(line_tracker: LineTracker) -> Self {
        Self { line_tracker }
    }

    /// Prints all errors to stderr.
    pub fn report_errors(&self, errors: &[CompileError]) {
        eprint!("{}", self.render_errors(errors));
    }

    /// Renders all errors into one string (also used by tests).
    #[must_use]
    pub fn render_errors(&self, errors: &[CompileError]) -> String {
        let mut out = String::new();
        for error in errors {
            match error {
                CompileError::LexerError { message, span } => self.render_error(&mut out, "LEX", message, span),
                CompileError::SyntaxError { message, span } => self.render_error(&mut out, "SYNTAX", message, span),
                CompileError::SemanticError { message, span } => {
                    self.render_error(&mut out, "SEMANTIC", message, span);
                }
                other => {
                    let _ = writeln!(out, "{} {}", style("ERROR:").red().bold(), style(other).yellow());
                }
            }
        }
        out
    }

    fn render_error(&self, out: &mut String, category: &str, message: &str, span: &SourceSpan) {
        let _ = writeln!(
            out,
            "{} {}: {}\n{} {}",
            style("ERROR").red().bold(),
            style(category).red(),
            style(message).yellow(),
            style("Location:").blue(),
            style(span).cyan()
        );

        let start_line = span.start.line;
        let Some(source_line) = self.line_tracker.get_line(start_line) else {
            return;
        };
        if source_line.is_empty() {
            return;
        }

        let _ = writeln!(out, "{start_line:4} | {source_line}");

        // Caret underline for single-line spans; multi-line spans underline
        // to the end of the first line.
        let start_col = span.start.column;
        let length = if span.start.line == span.end.line {
            span.end.column.saturating_sub(start_col).max(1)
        } else {
            source_line.chars().count().saturating_sub(start_col - 1).max(1)
        };
        let underline = " ".repeat(start_col - 1) + &"^".repeat(length);
        let _ = writeln!(out, "     | {}", style(underline).red().bold());
    }
}
