//! Interrupt handling module
//!
//! Handlers, the interrupt controller abstraction and re-exports of the
//! descriptor table, controller adapter and trap dispatcher.
//!
//! # Execution model
//!
//! The core runs on a single hart. Trap handling happens with machine
//! interrupts masked and never re-enables them, so traps do not nest.
//! Descriptor slots are written from ordinary execution (platform and
//! driver init) and read from trap context. Nothing here takes a lock,
//! blocks or allocates; exclusive access is expressed with `&mut` and the
//! board instance is the only place that arbitrates it.

use core::fmt;

use crate::utils::console::{emit_fmt, Console};

pub mod chip;
pub mod desc;
pub mod trap;

// Re-export commonly used types
pub use chip::{Claim, IrqChip};
pub use desc::{DescriptorTable, InterruptDescriptor};
pub use trap::{Dispatcher, ExternalLine, Fatal, LocalVector, LocalVectorTable, TrapOutcome, TrapRouter};

/// Interrupt number type
pub type IrqNumber = u32;

/// Opaque per-handler argument, passed back unchanged on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct IrqParam(pub usize);

impl IrqParam {
    /// No argument
    pub const NONE: Self = Self(0);
}

/// Interrupt service routine
///
/// Runs in trap context with interrupts masked: it must not block and
/// should return quickly. Plain functions and closures with the right
/// signature implement it.
pub trait Isr: Sync {
    /// Service interrupt `irq`
    fn handle(&self, irq: IrqNumber, param: IrqParam);
}

impl<F> Isr for F
where
    F: Fn(IrqNumber, IrqParam) + Sync,
{
    fn handle(&self, irq: IrqNumber, param: IrqParam) {
        self(irq, param)
    }
}

/// Handler held by a descriptor slot
#[derive(Clone, Copy, Default)]
pub enum IsrHandler {
    /// The diagnostic default: report the source and return
    #[default]
    Unhandled,
    /// An installed service routine
    Routine(&'static dyn Isr),
}

impl IsrHandler {
    /// Whether this is the default handler
    pub fn is_unhandled(&self) -> bool {
        matches!(self, IsrHandler::Unhandled)
    }

    /// The installed routine, if any
    pub fn routine(&self) -> Option<&'static dyn Isr> {
        match self {
            IsrHandler::Unhandled => None,
            IsrHandler::Routine(isr) => Some(*isr),
        }
    }

    /// Run the handler for `irq`
    pub fn invoke(&self, irq: IrqNumber, param: IrqParam, console: &dyn Console) {
        match self {
            IsrHandler::Unhandled => report_unhandled(irq, console),
            IsrHandler::Routine(isr) => isr.handle(irq, param),
        }
    }
}

impl fmt::Debug for IsrHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsrHandler::Unhandled => f.write_str("Unhandled"),
            IsrHandler::Routine(isr) => {
                write!(f, "Routine({:p})", *isr as *const dyn Isr as *const ())
            }
        }
    }
}

/// The default handler body: one diagnostic line, then return
pub fn report_unhandled(irq: IrqNumber, console: &dyn Console) {
    emit_fmt(console, format_args!("unhandled interrupt {} occurred", irq));
}

/// Interrupt controller trait
///
/// One method per hardware primitive. Ids are raw source numbers; source
/// 0 means "no interrupt" to the controller.
pub trait InterruptController {
    /// Enable an interrupt source
    fn enable(&mut self, irq: IrqNumber);

    /// Disable an interrupt source
    fn disable(&mut self, irq: IrqNumber);

    /// Set a source's priority
    fn set_priority(&mut self, irq: IrqNumber, priority: u32);

    /// Set the global threshold; sources at or below it never signal
    fn set_threshold(&mut self, threshold: u32);

    /// Acknowledge the highest-priority pending source, or return 0
    fn claim(&mut self) -> IrqNumber;

    /// Signal that a claimed source has been serviced
    fn complete(&mut self, irq: IrqNumber);
}
