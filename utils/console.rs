//! Console output functionality
//!
//! The interrupt core never drives the UART itself. Diagnostic lines are
//! handed to a [`Console`] sink supplied by the board, which owns the
//! character transport.

use core::fmt::{self, Write};

/// Longest diagnostic line; longer lines are truncated.
pub const LINE_MAX: usize = 96;

/// Fixed-capacity buffer a diagnostic line is formatted into
pub type LineBuffer = heapless::String<LINE_MAX>;

/// Console interface trait
///
/// Implementations must not block for long: lines are emitted from trap
/// context with interrupts masked.
pub trait Console: Sync {
    /// Emit one line of text. The line carries no trailing newline.
    fn emit_line(&self, line: &str);
}

impl Console for fn(&str) {
    fn emit_line(&self, line: &str) {
        (self)(line)
    }
}

/// A console that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsole;

impl Console for NullConsole {
    fn emit_line(&self, _line: &str) {}
}

/// Format `args` into a line and hand it to `console`
pub fn emit_fmt(console: &dyn Console, args: fmt::Arguments<'_>) {
    let line = format_line(args);
    console.emit_line(&line);
}

/// Format `args` into a fixed-capacity line, truncating on overflow
pub fn format_line(args: fmt::Arguments<'_>) -> LineBuffer {
    let mut line = LineBuffer::new();
    // Overflow keeps the pieces that fit.
    let _ = line.write_fmt(args);
    line
}
