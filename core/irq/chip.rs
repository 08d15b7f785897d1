//! Interrupt controller adapter
//!
//! Wraps an [`InterruptController`] with the policy the core uses: a single
//! flat priority for every live source, the lowest threshold, and the
//! claim/complete handshake expressed through [`Claim`] tokens.

use crate::config::{DEFAULT_PRIORITY, LOWEST_THRESHOLD};

use super::{InterruptController, IrqNumber};

/// Proof that a source was claimed and still awaits completion.
///
/// Only [`IrqChip::claim`] creates one and [`IrqChip::complete`] consumes
/// it, so every successful claim is completed at most once. Dropping a
/// claim without completing it leaves the source latched in the controller.
#[must_use = "a claimed source stays latched until it is completed"]
#[derive(Debug, PartialEq, Eq)]
pub struct Claim {
    irq: IrqNumber,
}

impl Claim {
    /// The claimed source
    pub fn irq(&self) -> IrqNumber {
        self.irq
    }
}

/// Controller adapter
#[derive(Debug)]
pub struct IrqChip<C> {
    controller: C,
    /// Source count, including the reserved source 0
    sources: u32,
}

impl<C: InterruptController> IrqChip<C> {
    /// Wrap `controller`, which exposes `sources` source ids
    pub fn new(controller: C, sources: u32) -> Self {
        Self { controller, sources }
    }

    /// Disable every source, drop its priority to 0 and open the threshold
    pub fn init(&mut self) {
        for irq in 1..self.sources {
            self.controller.disable(irq);
            self.controller.set_priority(irq, 0);
        }
        self.controller.set_threshold(LOWEST_THRESHOLD);
        log::debug!("interrupt controller reset, {} sources masked", self.sources.saturating_sub(1));
    }

    fn in_range(&self, irq: IrqNumber) -> bool {
        irq != 0 && irq < self.sources
    }

    /// Stop `irq` from signalling
    pub fn mask(&mut self, irq: IrqNumber) {
        if self.in_range(irq) {
            self.controller.disable(irq);
        }
    }

    /// Let `irq` signal at the flat priority level
    pub fn unmask(&mut self, irq: IrqNumber) {
        if self.in_range(irq) {
            self.controller.enable(irq);
            self.controller.set_priority(irq, DEFAULT_PRIORITY);
        }
    }

    /// Set the global priority threshold
    pub fn set_threshold(&mut self, level: u32) {
        self.controller.set_threshold(level);
    }

    /// Acknowledge the pending source, if any
    pub fn claim(&mut self) -> Option<Claim> {
        match self.controller.claim() {
            0 => None,
            irq => Some(Claim { irq }),
        }
    }

    /// Release a claimed source so it may signal again
    pub fn complete(&mut self, claim: Claim) {
        self.controller.complete(claim.irq);
    }

    /// The wrapped controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// The wrapped controller, mutably
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}
