//! Core interrupt handling
//!
//! This module contains the hardware-independent part of the interrupt
//! core: the descriptor table, the controller adapter and the trap
//! dispatcher.

pub mod irq;
