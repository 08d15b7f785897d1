//! Configuration management
//!
//! Board constants and the runtime configuration handed to
//! [`crate::board::init`]. The defaults describe a SiFive FE310 part: a
//! 53-source PLIC, a CLINT clocked from the 32768 Hz always-on RTC and a
//! 1 kHz system tick.

use crate::{Error, Result};

/// Number of interrupt sources the platform controller exposes.
///
/// Source 0 is reserved by the PLIC ("no interrupt"); the descriptor table
/// still carries a slot for it so ids index the table directly.
pub const MAX_HANDLERS: usize = 53;

/// Capacity of a descriptor name, counting one byte kept free for a
/// terminator. Names hold at most `IRQ_NAME_MAX - 1` characters.
pub const IRQ_NAME_MAX: usize = 8;

/// Entries in the flat local vector table (`local-isr` builds).
pub const LOCAL_VECTORS: usize = 16;

/// Source mask/unmask requests a single trap may queue.
pub const DEFERRED_REQUESTS: usize = 8;

/// The single priority level every unmasked source receives.
pub const DEFAULT_PRIORITY: u32 = 1;

/// Lowest threshold: every source with a non-zero priority may signal.
pub const LOWEST_THRESHOLD: u32 = 0;

/// PLIC base on the FE310
pub const PLIC_BASE: usize = 0x0C00_0000;

/// CLINT base on the FE310
pub const CLINT_BASE: usize = 0x0200_0000;

/// Always-on RTC feeding `mtime`
pub const RTC_FREQUENCY_HZ: u64 = 32_768;

/// Default system tick rate
pub const TICK_RATE_HZ: u64 = 1000;

/// Platform configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    /// PLIC base address
    pub plic_base: usize,
    /// CLINT base address
    pub clint_base: usize,
    /// Frequency of the free-running machine counter
    pub counter_frequency_hz: u64,
    /// Desired system tick rate
    pub tick_rate_hz: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            plic_base: PLIC_BASE,
            clint_base: CLINT_BASE,
            counter_frequency_hz: RTC_FREQUENCY_HZ,
            tick_rate_hz: TICK_RATE_HZ,
        }
    }
}

impl PlatformConfig {
    /// Check the configuration before any hardware is touched
    pub fn validate(&self) -> Result<()> {
        if self.plic_base == 0 || self.clint_base == 0 {
            return Err(Error::InvalidArgument);
        }

        if self.tick_rate_hz == 0 || self.tick_rate_hz > self.counter_frequency_hz {
            return Err(Error::InvalidArgument);
        }

        Ok(())
    }
}
