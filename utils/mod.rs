//! Utility functions and data structures
//!
//! Console plumbing and the `log` backend shared by the rest of the crate.

pub mod console;
pub mod log;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used utilities
pub use self::console::{emit_fmt, Console, NullConsole};
