// src/utils/mod.rs
//! Small helpers shared by the compiler and its test suite.

use regex::Regex;
use std::sync::LazyLock;

static ANSI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("ANSI regex pattern is valid")
});

/// Strips ANSI escape sequences, so tests can assert on styled reporter
/// output regardless of terminal capabilities.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    ANSI_REGEX.replace_all(text, "").into_owned()
}
