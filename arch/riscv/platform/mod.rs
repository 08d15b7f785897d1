//! Memory-mapped interrupt hardware of SiFive-style RISC-V platforms

pub mod clint;
pub mod plic;

pub use clint::Clint;
pub use plic::Plic;
