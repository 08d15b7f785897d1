//! Trap cause decoding
//!
//! `mcause` carries an "is interrupt" flag in its most significant bit and
//! the exception or interrupt code in the remaining bits. The width follows
//! the hart's XLEN, which on every supported target is `usize`.

use core::fmt;

/// Interrupt flag in `mcause`
pub const INTERRUPT_BIT: usize = 1 << (usize::BITS - 1);

/// Cause code mask
pub const CODE_MASK: usize = !INTERRUPT_BIT;

/// Machine-level interrupt causes
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptCause {
    MachineSoftware = 3,
    MachineTimer = 7,
    MachineExternal = 11,
}

/// Raw `mcause` value
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TrapCause(usize);

impl TrapCause {
    /// Wrap a raw `mcause` value
    pub const fn from_bits(bits: usize) -> Self {
        Self(bits)
    }

    /// Cause for interrupt `code`
    pub const fn interrupt(code: usize) -> Self {
        Self(INTERRUPT_BIT | (code & CODE_MASK))
    }

    /// Cause for synchronous exception `code`
    pub const fn exception(code: usize) -> Self {
        Self(code & CODE_MASK)
    }

    /// The raw register value
    pub const fn bits(self) -> usize {
        self.0
    }

    /// Whether the trap is an interrupt rather than an exception
    pub const fn is_interrupt(self) -> bool {
        self.0 & INTERRUPT_BIT != 0
    }

    /// The cause code with the interrupt flag stripped
    pub const fn code(self) -> usize {
        self.0 & CODE_MASK
    }
}

impl fmt::Debug for TrapCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrapCause")
            .field("interrupt", &self.is_interrupt())
            .field("code", &self.code())
            .finish()
    }
}
