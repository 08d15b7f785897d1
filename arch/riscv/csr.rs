//! Machine interrupt-enable register access
//!
//! Only the three machine-level enables the core touches are modelled:
//! software (`MSIE`), timer (`MTIE`) and external (`MEIE`).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mie: usize {
        const MSIE = 1 << 3;     // Machine Software Interrupt Enable
        const MTIE = 1 << 7;     // Machine Timer Interrupt Enable
        const MEIE = 1 << 11;    // Machine External Interrupt Enable
    }
}

/// Per-hart local interrupt enables
pub trait LocalInterrupts {
    /// Set the given enable bits
    fn enable(&mut self, irqs: Mie);

    /// Clear the given enable bits
    fn disable(&mut self, irqs: Mie);

    /// Currently enabled bits
    fn enabled(&self) -> Mie;
}

/// In-memory image of `mie`, used where the CSR is not reachable
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftMie {
    bits: Mie,
}

impl LocalInterrupts for SoftMie {
    fn enable(&mut self, irqs: Mie) {
        self.bits.insert(irqs);
    }

    fn disable(&mut self, irqs: Mie) {
        self.bits.remove(irqs);
    }

    fn enabled(&self) -> Mie {
        self.bits
    }
}

/// The hart's `mie` CSR
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct MieCsr;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
impl LocalInterrupts for MieCsr {
    fn enable(&mut self, irqs: Mie) {
        use ::riscv::register::mie;

        unsafe {
            if irqs.contains(Mie::MSIE) {
                mie::set_msoft();
            }
            if irqs.contains(Mie::MTIE) {
                mie::set_mtimer();
            }
            if irqs.contains(Mie::MEIE) {
                mie::set_mext();
            }
        }
    }

    fn disable(&mut self, irqs: Mie) {
        use ::riscv::register::mie;

        unsafe {
            if irqs.contains(Mie::MSIE) {
                mie::clear_msoft();
            }
            if irqs.contains(Mie::MTIE) {
                mie::clear_mtimer();
            }
            if irqs.contains(Mie::MEIE) {
                mie::clear_mext();
            }
        }
    }

    fn enabled(&self) -> Mie {
        Mie::from_bits_truncate(::riscv::register::mie::read().bits())
    }
}
