//! RISC-V machine-mode support
//!
//! Cause decoding, the `mie` enables and the PLIC/CLINT register drivers.
//! Everything except the CSR accessors and the trap entry symbol builds on
//! any host, which is how the unit tests exercise it.

pub mod cause;
pub mod csr;
pub mod platform;

pub use cause::{InterruptCause, TrapCause};
pub use csr::{LocalInterrupts, Mie, SoftMie};

/// Machine trap entry called by the assembly trap vector.
///
/// The vector saves the caller-saved registers, passes `mcause` and `mepc`
/// and writes the returned address back to `mepc` before `mret`.
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
#[no_mangle]
pub extern "C" fn handle_trap(mcause: usize, mepc: usize) -> usize {
    crate::board::handle_trap(mcause, mepc)
}
