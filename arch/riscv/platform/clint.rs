//! RISC-V CLINT (Core Local Interruptor) Support
//!
//! The CLINT holds the free-running `mtime` counter and the per-hart
//! `mtimecmp` compare registers. Both are 64 bits wide but are accessed as
//! 32-bit halves so the same code serves RV32 parts.

use core::ptr::NonNull;

use volatile::VolatilePtr;

use crate::drivers::base::timer::MachineTimer;

/// CLINT register offsets
pub mod clint_regs {
    pub const MTIMECMP0: usize = 0x4000; // Hart 0 timer comparator
    pub const MTIME: usize = 0xBFF8; // Timer value
}

/// CLINT driver for hart 0
#[derive(Debug)]
pub struct Clint {
    /// Base address
    base: usize,
}

impl Clint {
    /// Create new CLINT driver
    ///
    /// # Safety
    ///
    /// `base` must be the address of a CLINT register window (or memory
    /// laid out like one) that stays mapped for the driver's lifetime.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn reg(&self, offset: usize) -> VolatilePtr<'_, u32> {
        // SAFETY: guaranteed by `new`.
        unsafe { VolatilePtr::new(NonNull::new_unchecked((self.base + offset) as *mut u32)) }
    }

    /// Read a 64-bit register as two halves, retrying if the high word
    /// changed in between
    fn read_u64(&self, offset: usize) -> u64 {
        loop {
            let high = self.reg(offset + 4).read();
            let low = self.reg(offset).read();
            if self.reg(offset + 4).read() == high {
                return ((high as u64) << 32) | low as u64;
            }
        }
    }

    /// Read mtime register (64-bit)
    pub fn read_mtime(&self) -> u64 {
        self.read_u64(clint_regs::MTIME)
    }

    /// Read hart 0's mtimecmp register
    pub fn read_mtimecmp(&self) -> u64 {
        self.read_u64(clint_regs::MTIMECMP0)
    }

    /// Write hart 0's mtimecmp register
    pub fn write_mtimecmp(&mut self, value: u64) {
        // Park the low word at its maximum so no intermediate value can be
        // reached before the high word is in place.
        self.reg(clint_regs::MTIMECMP0).write(u32::MAX);
        self.reg(clint_regs::MTIMECMP0 + 4).write((value >> 32) as u32);
        self.reg(clint_regs::MTIMECMP0).write(value as u32);
    }
}

impl MachineTimer for Clint {
    fn counter(&self) -> u64 {
        self.read_mtime()
    }

    fn compare(&self) -> u64 {
        self.read_mtimecmp()
    }

    fn set_compare(&mut self, value: u64) {
        self.write_mtimecmp(value);
    }
}
