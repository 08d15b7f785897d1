//! Board wiring
//!
//! Builds the trap router for this board, owns the single board instance
//! and exposes the driver-facing API (handler install, source masking)
//! plus the trap entry the assembly vector calls.
//!
//! Init order is fixed: interrupt subsystem (controller reset, table reset,
//! software interrupt off, external interrupt on), then the system tick,
//! then global machine interrupts.
//!
//! # Calls from handlers
//!
//! Service routines and the tick callback run inside [`handle_trap`],
//! which owns the board for the whole trap. From there,
//! [`mask_source`] and [`unmask_source`] are queued and applied before the
//! trap returns. Every other call that needs the board returns
//! [`Error::InTrap`] instead of waiting.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::arch;
use crate::arch::riscv::cause::TrapCause;
use crate::config::PlatformConfig;
use crate::core::irq::{Dispatcher, Fatal, TrapOutcome};
use crate::utils::console::Console;
use crate::{Error, Result};

cfg_if::cfg_if! {
    if #[cfg(feature = "local-isr")] {
        use crate::config::LOCAL_VECTORS;
        use crate::core::irq::{LocalVector, LocalVectorTable};

        /// Router compiled into this board: a flat vector table
        pub type BoardRouter = LocalVectorTable<LOCAL_VECTORS>;
    } else {
        use heapless::Deque;

        use crate::arch::riscv::platform::{Clint, Plic};
        use crate::config::{DEFERRED_REQUESTS, MAX_HANDLERS};
        use crate::core::irq::{ExternalLine, IrqNumber, IrqParam, Isr, IsrHandler};
        use crate::drivers::base::timer::{TickTimer, TimerLine};

        /// Router compiled into this board: PLIC external line first, then
        /// the machine timer
        pub type BoardRouter = (ExternalLine<Plic, MAX_HANDLERS>, TimerLine<Clint, fn()>);
    }
}

struct Board {
    dispatcher: Dispatcher<BoardRouter>,
    console: &'static dyn Console,
}

/// The board instance.
///
/// Single hart, no trap nesting. [`handle_trap`] holds this lock for the
/// whole trap with machine interrupts masked by hardware; every other
/// access happens outside trap context through
/// [`arch::without_interrupts`], so it never finds the lock held. Code
/// running inside the trap must not take it, see [`IN_TRAP`]. This does
/// not make the board safe to share across harts.
static BOARD: Mutex<Option<Board>> = Mutex::new(None);

/// Set while [`handle_trap`] owns the board
static IN_TRAP: AtomicBool = AtomicBool::new(false);

/// Source state change requested from trap context
#[cfg(not(feature = "local-isr"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceRequest {
    Mask(IrqNumber),
    Unmask(IrqNumber),
}

/// Requests queued by handlers, applied before the trap returns.
///
/// Only touched from trap context, so the lock is never contended.
#[cfg(not(feature = "local-isr"))]
static DEFERRED: Mutex<Deque<SourceRequest, DEFERRED_REQUESTS>> = Mutex::new(Deque::new());

fn in_trap() -> bool {
    IN_TRAP.load(Ordering::Acquire)
}

#[cfg(not(feature = "local-isr"))]
fn build_router(config: &PlatformConfig, tick: fn()) -> Result<BoardRouter> {
    let mut local = arch::LocalIrqs::default();

    // SAFETY: the caller of `init` vouches for both register windows.
    let plic = unsafe { Plic::new(config.plic_base, MAX_HANDLERS as u32) };
    let clint = unsafe { Clint::new(config.clint_base) };
    let timer = TickTimer::new(clint, config.counter_frequency_hz, config.tick_rate_hz)?;

    let mut external = ExternalLine::new(plic);
    external.init(&mut local);

    let mut timer = TimerLine::new(timer, tick);
    timer.init(&mut local);

    Ok((external, timer))
}

#[cfg(feature = "local-isr")]
fn build_router(_config: &PlatformConfig, _tick: fn()) -> Result<BoardRouter> {
    Ok(LocalVectorTable::new())
}

/// Bring up interrupt handling and enable machine interrupts.
///
/// `tick` is called once per system tick period; `console` receives the
/// diagnostic lines and, unless another backend is already installed, the
/// `log` output.
///
/// # Safety
///
/// `config.plic_base` and `config.clint_base` must address the platform's
/// PLIC and CLINT register windows, mapped for the rest of execution.
pub unsafe fn init(
    config: &PlatformConfig,
    tick: fn(),
    console: &'static dyn Console,
) -> Result<()> {
    config.validate()?;

    if crate::utils::log::init(console).is_err() {
        log::debug!("keeping the existing log backend");
    }

    with_board_slot(|board| {
        if board.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let router = build_router(config, tick)?;
        *board = Some(Board {
            dispatcher: Dispatcher::new(router),
            console,
        });
        Ok(())
    })??;

    arch::enable_global_interrupts();
    log::info!("ferrotrap {} ready", crate::VERSION);
    Ok(())
}

fn with_board_slot<R>(f: impl FnOnce(&mut Option<Board>) -> R) -> Result<R> {
    if in_trap() {
        return Err(Error::InTrap);
    }
    Ok(arch::without_interrupts(|| f(&mut *BOARD.lock())))
}

fn with_board<R>(f: impl FnOnce(&mut Board) -> R) -> Result<R> {
    with_board_slot(|board| board.as_mut().map(f).ok_or(Error::NotInitialized))?
}

#[cfg(not(feature = "local-isr"))]
fn defer(request: SourceRequest) -> Result<()> {
    DEFERRED.lock().push_back(request).map_err(|_| {
        log::warn!("dropping {:?}, deferred queue full", request);
        Error::QueueFull
    })
}

#[cfg(not(feature = "local-isr"))]
fn apply_deferred(board: &mut Board) {
    let line = &mut board.dispatcher.router_mut().0;
    loop {
        let request = DEFERRED.lock().pop_front();
        match request {
            Some(SourceRequest::Mask(irq)) => line.mask(irq),
            Some(SourceRequest::Unmask(irq)) => line.unmask(irq),
            None => break,
        }
    }
}

#[cfg(feature = "local-isr")]
fn apply_deferred(_board: &mut Board) {}

/// Install a handler for an external source and return the one it replaced.
///
/// `None` queries the current handler without changing the slot.
#[cfg(not(feature = "local-isr"))]
pub fn install_handler(
    irq: IrqNumber,
    handler: Option<&'static dyn Isr>,
    param: IrqParam,
    name: &str,
) -> Result<IsrHandler> {
    with_board(|board| board.dispatcher.router_mut().0.install(irq, handler, param, name))
}

/// Stop an external source from interrupting.
///
/// From trap context the request takes effect before the trap returns.
#[cfg(not(feature = "local-isr"))]
pub fn mask_source(irq: IrqNumber) -> Result<()> {
    if in_trap() {
        return defer(SourceRequest::Mask(irq));
    }
    with_board(|board| board.dispatcher.router_mut().0.mask(irq))
}

/// Let an external source interrupt.
///
/// From trap context the request takes effect before the trap returns.
#[cfg(not(feature = "local-isr"))]
pub fn unmask_source(irq: IrqNumber) -> Result<()> {
    if in_trap() {
        return defer(SourceRequest::Unmask(irq));
    }
    with_board(|board| board.dispatcher.router_mut().0.unmask(irq))
}

/// System ticks serviced so far
#[cfg(not(feature = "local-isr"))]
pub fn ticks() -> Result<u64> {
    with_board(|board| board.dispatcher.router().1.timer().ticks())
}

/// Set the handler for local interrupt `code` and return the old one
#[cfg(feature = "local-isr")]
pub fn set_vector(code: usize, vector: Option<LocalVector>) -> Result<Option<LocalVector>> {
    with_board(|board| board.dispatcher.router_mut().set(code, vector))
}

/// Dispatch one trap against the board.
///
/// A trap before [`init`] is fatal with the raw cause.
fn dispatch_trap(cause: usize, epc: usize) -> TrapOutcome {
    let mut guard = BOARD.lock();
    let Some(board) = guard.as_mut() else {
        return TrapOutcome::Halt(Fatal::UnhandledInterrupt { cause });
    };

    IN_TRAP.store(true, Ordering::Release);
    let outcome = board
        .dispatcher
        .dispatch(TrapCause::from_bits(cause), epc, board.console);
    IN_TRAP.store(false, Ordering::Release);

    apply_deferred(board);
    outcome
}

/// Trap entry: dispatch one trap and return the address to resume at.
///
/// Fatal traps never return.
pub fn handle_trap(cause: usize, epc: usize) -> usize {
    match dispatch_trap(cause, epc) {
        TrapOutcome::Resume(epc) => epc,
        TrapOutcome::Halt(fatal) => arch::halt(fatal.cause()),
    }
}
