//! ANSI escapes for levo's stage progress lines.
//!
//! Everything human-readable goes to stderr; stdout is reserved for
//! `--json` reports and `levo config`.

use std::io::{self, Write};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const RED: &str = "\x1b[31m";

/// Show a pending `◆ stage ...` line before the stage's tool takes over.
#[inline]
pub fn flush_stderr() {
    io::stderr().flush().ok();
}
