//! Device drivers module
//!
//! Drivers the interrupt core depends on directly. Platform register
//! layouts live under [`crate::arch::riscv::platform`]; the drivers here
//! hold the hardware-independent policy on top of them.

pub mod base;
