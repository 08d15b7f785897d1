//! Machine trap dispatch
//!
//! [`Dispatcher`] classifies a trap from its cause and hands interrupts to a
//! [`TrapRouter`]. Routers are composed as a tuple chain, tried in order:
//! the default board uses `(ExternalLine, TimerLine)`, the vectored build
//! uses a [`LocalVectorTable`]. A cause no router claims is fatal.

use crate::arch::riscv::cause::{InterruptCause, TrapCause};
use crate::arch::riscv::csr::{LocalInterrupts, Mie};
use crate::utils::console::{emit_fmt, Console};

use super::{DescriptorTable, InterruptController, IrqChip, IrqNumber, IrqParam, Isr, IsrHandler};

/// One class of interrupt the dispatcher can hand a trap to
pub trait TrapRouter {
    /// Service interrupt `code` if it belongs to this router.
    ///
    /// Returns `false`, without side effects, for codes it does not own.
    fn route(&mut self, code: usize, console: &dyn Console) -> bool;
}

/// Routes nothing; stands in for a class that is compiled out
impl TrapRouter for () {
    fn route(&mut self, _code: usize, _console: &dyn Console) -> bool {
        false
    }
}

impl<A: TrapRouter, B: TrapRouter> TrapRouter for (A, B) {
    fn route(&mut self, code: usize, console: &dyn Console) -> bool {
        self.0.route(code, console) || self.1.route(code, console)
    }
}

/// Platform external interrupts: controller adapter plus descriptor table
#[derive(Debug)]
pub struct ExternalLine<C, const N: usize> {
    table: DescriptorTable<N>,
    chip: IrqChip<C>,
    spurious: u32,
}

impl<C: InterruptController, const N: usize> ExternalLine<C, N> {
    /// Build the line over `controller`, which exposes `N` source ids
    pub fn new(controller: C) -> Self {
        Self {
            table: DescriptorTable::new(),
            chip: IrqChip::new(controller, N as u32),
            spurious: 0,
        }
    }

    /// Reset the controller and the table, then open the external line
    pub fn init(&mut self, local: &mut dyn LocalInterrupts) {
        self.chip.init();
        self.table.reset();
        local.disable(Mie::MSIE);
        local.enable(Mie::MEIE);
        log::info!("external interrupts ready, {} sources", N);
    }

    /// Install a handler; see [`DescriptorTable::install`]
    pub fn install(
        &mut self,
        irq: IrqNumber,
        handler: Option<&'static dyn Isr>,
        param: IrqParam,
        name: &str,
    ) -> IsrHandler {
        self.table.install(irq, handler, param, name)
    }

    /// Mask a source at the controller
    pub fn mask(&mut self, irq: IrqNumber) {
        self.chip.mask(irq);
    }

    /// Unmask a source at the controller
    pub fn unmask(&mut self, irq: IrqNumber) {
        self.chip.unmask(irq);
    }

    /// Set the controller threshold
    pub fn set_threshold(&mut self, level: u32) {
        self.chip.set_threshold(level);
    }

    /// Claim, run the handler and complete one pending source
    pub fn service(&mut self, console: &dyn Console) {
        let Some(claim) = self.chip.claim() else {
            self.spurious = self.spurious.wrapping_add(1);
            return;
        };

        let irq = claim.irq();
        let (handler, param) = self
            .table
            .lookup(irq)
            .unwrap_or((IsrHandler::Unhandled, IrqParam::NONE));
        handler.invoke(irq, param, console);
        self.table.record_service(irq);

        self.chip.complete(claim);
    }

    /// The descriptor table
    pub fn table(&self) -> &DescriptorTable<N> {
        &self.table
    }

    /// The controller adapter
    pub fn chip(&self) -> &IrqChip<C> {
        &self.chip
    }

    /// The controller adapter, mutably
    pub fn chip_mut(&mut self) -> &mut IrqChip<C> {
        &mut self.chip
    }

    /// External traps that found nothing to claim
    pub fn spurious(&self) -> u32 {
        self.spurious
    }
}

impl<C: InterruptController, const N: usize> TrapRouter for ExternalLine<C, N> {
    fn route(&mut self, code: usize, console: &dyn Console) -> bool {
        if code != InterruptCause::MachineExternal as usize {
            return false;
        }
        self.service(console);
        true
    }
}

/// Local vector handler
pub type LocalVector = fn();

/// Flat table of handlers indexed by interrupt cause code
#[derive(Debug, Clone)]
pub struct LocalVectorTable<const N: usize> {
    vectors: [Option<LocalVector>; N],
}

impl<const N: usize> Default for LocalVectorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LocalVectorTable<N> {
    /// Empty table
    pub const fn new() -> Self {
        Self { vectors: [None; N] }
    }

    /// Set (or clear, with `None`) the vector for `code`, returning the old one
    pub fn set(&mut self, code: usize, vector: Option<LocalVector>) -> Option<LocalVector> {
        match self.vectors.get_mut(code) {
            Some(slot) => core::mem::replace(slot, vector),
            None => {
                log::warn!("local vector {} out of range", code);
                None
            }
        }
    }

    /// Vector for `code`
    pub fn get(&self, code: usize) -> Option<LocalVector> {
        self.vectors.get(code).copied().flatten()
    }
}

impl<const N: usize> TrapRouter for LocalVectorTable<N> {
    fn route(&mut self, code: usize, _console: &dyn Console) -> bool {
        match self.get(code) {
            Some(vector) => {
                vector();
                true
            }
            None => false,
        }
    }
}

/// Unrecoverable trap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// Interrupt no router claimed
    UnhandledInterrupt { cause: usize },
    /// Synchronous exception
    Exception { cause: usize, epc: usize },
}

impl Fatal {
    /// Raw `mcause` value of the trap
    pub fn cause(&self) -> usize {
        match *self {
            Fatal::UnhandledInterrupt { cause } | Fatal::Exception { cause, .. } => cause,
        }
    }
}

/// What the trap entry does next
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// Return to the interrupted code at this address
    Resume(usize),
    /// Stop the hart
    Halt(Fatal),
}

/// Trap dispatcher
#[derive(Debug)]
pub struct Dispatcher<R> {
    router: R,
}

impl<R: TrapRouter> Dispatcher<R> {
    /// Dispatcher handing interrupts to `router`
    pub fn new(router: R) -> Self {
        Self { router }
    }

    /// The router
    pub fn router(&self) -> &R {
        &self.router
    }

    /// The router, mutably
    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    /// Dispatch one trap.
    ///
    /// Handled interrupts resume at `epc` unchanged.
    pub fn dispatch(&mut self, cause: TrapCause, epc: usize, console: &dyn Console) -> TrapOutcome {
        if !cause.is_interrupt() {
            emit_fmt(
                console,
                format_args!("unhandled exception: cause={:#x} epc={:#x}", cause.bits(), epc),
            );
            return TrapOutcome::Halt(Fatal::Exception {
                cause: cause.bits(),
                epc,
            });
        }

        if self.router.route(cause.code(), console) {
            return TrapOutcome::Resume(epc);
        }

        emit_fmt(console, format_args!("unhandled trap: cause={:#x}", cause.bits()));
        TrapOutcome::Halt(Fatal::UnhandledInterrupt { cause: cause.bits() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::riscv::cause::INTERRUPT_BIT;
    use crate::arch::riscv::csr::SoftMie;
    use crate::drivers::base::timer::{TickTimer, TimerLine};
    use crate::utils::testing::{
        take_trace, tracing_isr, Event, RecordingConsole, SimPlic, SimTimer, TickCounter,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    const SOURCES: usize = 53;
    const EPC: usize = 0x2040_0123;

    type Line = ExternalLine<SimPlic, SOURCES>;

    fn external() -> Line {
        let mut line = Line::new(SimPlic::new(SOURCES));
        line.init(&mut SoftMie::default());
        line
    }

    fn timer_line() -> TimerLine<SimTimer, TickCounter> {
        let timer = TickTimer::new(SimTimer::at(1000), 32_768, 1000).unwrap();
        TimerLine::new(timer, TickCounter::default())
    }

    #[test]
    fn test_init_sets_local_enables() {
        let mut mie = SoftMie::default();
        mie.enable(Mie::MSIE);
        let mut line = Line::new(SimPlic::new(SOURCES));
        line.init(&mut mie);
        assert_eq!(mie.enabled(), Mie::MEIE);
    }

    #[test]
    fn test_unclaimed_source_gets_default_handler() {
        let mut dispatcher = Dispatcher::new(external());
        let console = RecordingConsole::new();
        dispatcher.router_mut().unmask(7);
        dispatcher.router_mut().chip_mut().controller_mut().raise(7);

        let outcome = dispatcher.dispatch(TrapCause::interrupt(11), EPC, &console);

        assert_eq!(outcome, TrapOutcome::Resume(EPC));
        assert_eq!(console.lines(), vec!["unhandled interrupt 7 occurred".to_string()]);
        assert_eq!(take_trace(), vec![Event::Claim(7), Event::Complete(7)]);
    }

    #[test]
    fn test_claim_handler_complete_order() {
        let mut line = external();
        let console = RecordingConsole::new();
        line.install(5, Some(&tracing_isr), IrqParam(0x55), "uart");
        line.unmask(5);
        line.chip_mut().controller_mut().raise(5);

        assert!(line.route(11, &console));

        assert_eq!(
            take_trace(),
            vec![
                Event::Claim(5),
                Event::Handler(5, IrqParam(0x55)),
                Event::Complete(5)
            ]
        );
        assert!(console.lines().is_empty());
        #[cfg(feature = "interrupt-info")]
        assert_eq!(line.table().descriptor(5).unwrap().count(), 1);
    }

    #[test]
    fn test_spurious_claim_runs_nothing() {
        let mut dispatcher = Dispatcher::new(external());
        let console = RecordingConsole::new();

        let outcome = dispatcher.dispatch(TrapCause::interrupt(11), EPC, &console);

        assert_eq!(outcome, TrapOutcome::Resume(EPC));
        assert_eq!(dispatcher.router().spurious(), 1);
        assert!(dispatcher.router().chip().controller().completions.is_empty());
        assert!(take_trace().is_empty());
    }

    #[test]
    fn test_claim_beyond_table_is_completed() {
        // Controller wider than the table: source 60 has no slot.
        let mut line = ExternalLine::<SimPlic, SOURCES>::new(SimPlic::new(64));
        let console = RecordingConsole::new();
        line.set_threshold(0);
        line.chip_mut().controller_mut().raise(60);

        assert!(line.route(11, &console));

        assert_eq!(console.lines(), vec!["unhandled interrupt 60 occurred".to_string()]);
        assert_eq!(line.chip().controller().completions, vec![60]);
        take_trace();
    }

    #[test]
    fn test_timer_and_external_share_dispatch() {
        let mut dispatcher = Dispatcher::new((external(), timer_line()));
        let console = RecordingConsole::new();

        let outcome = dispatcher.dispatch(TrapCause::interrupt(7), EPC, &console);
        assert_eq!(outcome, TrapOutcome::Resume(EPC));
        assert_eq!(dispatcher.router().1.sink().ticks, 1);
        assert_eq!(take_trace(), vec![Event::Tick]);
    }

    #[test]
    fn test_timer_only_build_treats_external_as_fatal() {
        let mut dispatcher = Dispatcher::new(((), timer_line()));
        let console = RecordingConsole::new();
        let cause = INTERRUPT_BIT | 11;

        let outcome = dispatcher.dispatch(TrapCause::from_bits(cause), EPC, &console);

        assert_eq!(outcome, TrapOutcome::Halt(Fatal::UnhandledInterrupt { cause }));
        assert_eq!(console.lines(), vec![format!("unhandled trap: cause={:#x}", cause)]);
        assert_eq!(dispatcher.router().1.sink().ticks, 0);
    }

    #[test_case(3 ; "machine software")]
    #[test_case(9 ; "supervisor external")]
    #[test_case(42 ; "platform local")]
    fn test_unrouted_interrupt_is_fatal(code: usize) {
        let mut dispatcher = Dispatcher::new((external(), timer_line()));
        let console = RecordingConsole::new();
        let cause = TrapCause::interrupt(code);

        let outcome = dispatcher.dispatch(cause, EPC, &console);

        assert_eq!(outcome, TrapOutcome::Halt(Fatal::UnhandledInterrupt { cause: cause.bits() }));
        assert!(console.contains(&format!("cause={:#x}", cause.bits())));
        assert!(take_trace().is_empty());
    }

    #[test]
    fn test_exception_is_fatal() {
        let mut dispatcher = Dispatcher::new((external(), timer_line()));
        let console = RecordingConsole::new();

        let outcome = dispatcher.dispatch(TrapCause::exception(2), EPC, &console);

        let fatal = Fatal::Exception { cause: 2, epc: EPC };
        assert_eq!(outcome, TrapOutcome::Halt(fatal));
        assert_eq!(fatal.cause(), 2);
        assert_eq!(
            console.lines(),
            vec![format!("unhandled exception: cause=0x2 epc={:#x}", EPC)]
        );
    }

    static VECTOR_HITS: AtomicUsize = AtomicUsize::new(0);

    fn count_vector() {
        VECTOR_HITS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_local_vector_table() {
        let mut table = LocalVectorTable::<16>::new();
        assert_eq!(table.set(3, Some(count_vector)), None);
        assert!(table.set(16, Some(count_vector)).is_none());
        assert!(table.get(16).is_none());

        let mut dispatcher = Dispatcher::new(table);
        let console = RecordingConsole::new();

        let before = VECTOR_HITS.load(Ordering::SeqCst);
        let outcome = dispatcher.dispatch(TrapCause::interrupt(3), EPC, &console);
        assert_eq!(outcome, TrapOutcome::Resume(EPC));
        assert_eq!(VECTOR_HITS.load(Ordering::SeqCst), before + 1);

        let outcome = dispatcher.dispatch(TrapCause::interrupt(4), EPC, &console);
        assert!(matches!(outcome, TrapOutcome::Halt(Fatal::UnhandledInterrupt { .. })));

        assert!(dispatcher.router_mut().set(3, None).is_some());
        let outcome = dispatcher.dispatch(TrapCause::interrupt(3), EPC, &console);
        assert!(matches!(outcome, TrapOutcome::Halt(_)));
    }
}
