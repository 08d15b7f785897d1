//! RISC-V PLIC (Platform-Level Interrupt Controller) Support
//!
//! Register access for the hart-0 machine-mode context of a SiFive-style
//! PLIC. Policy (which sources are live, what priority they get) lives in
//! [`crate::core::irq::chip`]; this driver only knows the register map.

use core::ptr::NonNull;

use volatile::VolatilePtr;

use crate::core::irq::{InterruptController, IrqNumber};

/// PLIC register offsets
pub mod plic_regs {
    /// Priority registers (4 bytes per source)
    pub const PRIORITY_BASE: usize = 0x00_0000;
    /// Enable bits for context 0 (1 bit per source)
    pub const ENABLE_BASE: usize = 0x00_2000;
    /// Priority threshold for context 0
    pub const THRESHOLD: usize = 0x20_0000;
    /// Claim/complete register for context 0
    pub const CLAIM_COMPLETE: usize = 0x20_0004;
}

/// Highest priority the FE310 PLIC implements
pub const MAX_PRIORITY: u32 = 7;

/// PLIC driver
#[derive(Debug)]
pub struct Plic {
    /// Base address
    base: usize,
    /// Number of interrupt sources, including the reserved source 0
    num_sources: u32,
}

impl Plic {
    /// Create new PLIC driver
    ///
    /// # Safety
    ///
    /// `base` must be the address of a PLIC register window (or memory
    /// laid out like one) that stays mapped for the driver's lifetime and
    /// is not accessed through any other path while the driver exists.
    pub const unsafe fn new(base: usize, num_sources: u32) -> Self {
        Self { base, num_sources }
    }

    fn reg(&self, offset: usize) -> VolatilePtr<'_, u32> {
        // SAFETY: `new` guarantees the window is mapped, and every offset
        // used below lies inside it.
        unsafe { VolatilePtr::new(NonNull::new_unchecked((self.base + offset) as *mut u32)) }
    }

    fn valid(&self, irq: IrqNumber) -> bool {
        if irq == 0 || irq >= self.num_sources {
            log::warn!("PLIC: ignoring invalid source {}", irq);
            return false;
        }
        true
    }

    fn enable_word(irq: IrqNumber) -> (usize, u32) {
        let offset = plic_regs::ENABLE_BASE + (irq as usize / 32) * 4;
        (offset, 1 << (irq % 32))
    }
}

impl InterruptController for Plic {
    fn enable(&mut self, irq: IrqNumber) {
        if !self.valid(irq) {
            return;
        }

        let (offset, bit) = Self::enable_word(irq);
        self.reg(offset).update(|value| value | bit);
    }

    fn disable(&mut self, irq: IrqNumber) {
        if !self.valid(irq) {
            return;
        }

        let (offset, bit) = Self::enable_word(irq);
        self.reg(offset).update(|value| value & !bit);
    }

    fn set_priority(&mut self, irq: IrqNumber, priority: u32) {
        if !self.valid(irq) {
            return;
        }

        let offset = plic_regs::PRIORITY_BASE + irq as usize * 4;
        self.reg(offset).write(priority.min(MAX_PRIORITY));
    }

    fn set_threshold(&mut self, threshold: u32) {
        self.reg(plic_regs::THRESHOLD).write(threshold.min(MAX_PRIORITY));
    }

    fn claim(&mut self) -> IrqNumber {
        self.reg(plic_regs::CLAIM_COMPLETE).read()
    }

    fn complete(&mut self, irq: IrqNumber) {
        self.reg(plic_regs::CLAIM_COMPLETE).write(irq);
    }
}
