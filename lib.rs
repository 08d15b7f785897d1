//! Ferrotrap - interrupt dispatch core for bare-metal RISC-V boards
//!
//! This library owns the mapping from platform interrupt sources to
//! software handlers, drives the PLIC claim/complete handshake and keeps
//! the CLINT compare register armed so the kernel receives a periodic
//! system tick.
//!
//! The pieces, leaves first:
//! - [`drivers::base::timer`]: tick period computation and compare rearm
//! - [`crate::core::irq::desc`]: the fixed-size interrupt descriptor table
//! - [`crate::core::irq::chip`]: the controller adapter and its claim tokens
//! - [`crate::core::irq::trap`]: trap classification and routing
//! - [`board`]: init ordering, the board instance and the trap entry

#![cfg_attr(not(test), no_std)]

// Core modules
pub mod utils;
pub mod config;

// Architecture-specific code
pub mod arch;

// Interrupt and trap handling
pub mod core;

// Device drivers
pub mod drivers;

// Board wiring and the public driver-facing API
pub mod board;

// Re-export key types for convenience
pub use crate::core::irq::{
    Claim, DescriptorTable, Dispatcher, ExternalLine, InterruptController, IrqChip, IrqNumber,
    IrqParam, Isr, IsrHandler, LocalVectorTable, TrapOutcome, TrapRouter,
};
pub use crate::drivers::base::timer::{MachineTimer, TickSink, TickTimer, TimerLine};
pub use crate::utils::console::Console;

/// Ferrotrap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common error type for Ferrotrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid argument
    InvalidArgument,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Logger installation failed
    LoggerUnavailable,
    /// Not callable from trap context
    InTrap,
    /// Too many requests queued during one trap
    QueueFull,
}

impl ::core::fmt::Display for Error {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        match self {
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::AlreadyInitialized => f.write_str("already initialized"),
            Error::NotInitialized => f.write_str("not initialized"),
            Error::LoggerUnavailable => f.write_str("logger already installed"),
            Error::InTrap => f.write_str("not allowed in trap context"),
            Error::QueueFull => f.write_str("deferred request queue full"),
        }
    }
}

/// Result type alias
pub type Result<T> = ::core::result::Result<T, Error>;
