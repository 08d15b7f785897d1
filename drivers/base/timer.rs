//! System tick timer
//!
//! Keeps the machine timer compare register one period ahead of the
//! free-running counter and notifies the scheduler once per period.

use crate::arch::riscv::cause::InterruptCause;
use crate::arch::riscv::csr::{LocalInterrupts, Mie};
use crate::core::irq::TrapRouter;
use crate::utils::console::Console;
use crate::{Error, Result};

/// Free-running counter with a compare register, as seen by one hart
pub trait MachineTimer {
    /// Current counter value
    fn counter(&self) -> u64;

    /// Current compare value
    fn compare(&self) -> u64;

    /// Program the compare register; the timer interrupt is pending while
    /// `counter() >= compare`
    fn set_compare(&mut self, value: u64);
}

/// Receiver of the periodic system tick
pub trait TickSink {
    /// Called once per tick, in trap context
    fn on_system_tick(&mut self);
}

impl TickSink for fn() {
    fn on_system_tick(&mut self) {
        (self)()
    }
}

/// Periodic tick driver
#[derive(Debug)]
pub struct TickTimer<T> {
    timer: T,
    /// Counter increments per tick period
    ticks_per_period: u64,
    /// Ticks serviced so far
    ticks: u64,
}

impl<T: MachineTimer> TickTimer<T> {
    /// Create a tick driver for a counter running at `frequency_hz`.
    ///
    /// The period is `frequency_hz / rate_hz`, truncated. A zero rate, or a
    /// rate so high the period truncates to zero, is rejected.
    pub fn new(timer: T, frequency_hz: u64, rate_hz: u64) -> Result<Self> {
        if rate_hz == 0 {
            return Err(Error::InvalidArgument);
        }

        let ticks_per_period = frequency_hz / rate_hz;
        if ticks_per_period == 0 {
            return Err(Error::InvalidArgument);
        }

        Ok(Self {
            timer,
            ticks_per_period,
            ticks: 0,
        })
    }

    /// Counter increments per tick
    pub fn ticks_per_period(&self) -> u64 {
        self.ticks_per_period
    }

    /// Arm the first period, then enable the timer interrupt
    pub fn init(&mut self, local: &mut dyn LocalInterrupts) {
        self.rearm();
        local.enable(Mie::MTIE);
        log::info!("system tick armed, period {} counts", self.ticks_per_period);
    }

    fn rearm(&mut self) {
        // Relative to the counter, not the previous compare value.
        let next = self.timer.counter().wrapping_add(self.ticks_per_period);
        self.timer.set_compare(next);
    }

    /// Service one timer interrupt
    pub fn on_tick(&mut self, sink: &mut dyn TickSink) {
        self.rearm();
        self.ticks = self.ticks.wrapping_add(1);
        sink.on_system_tick();
    }

    /// Ticks serviced since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The underlying hardware timer
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// The underlying hardware timer, mutably
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

/// The machine timer interrupt class: tick driver plus its sink
#[derive(Debug)]
pub struct TimerLine<T, K> {
    timer: TickTimer<T>,
    sink: K,
}

impl<T: MachineTimer, K: TickSink> TimerLine<T, K> {
    /// Pair a tick driver with the sink it notifies
    pub fn new(timer: TickTimer<T>, sink: K) -> Self {
        Self { timer, sink }
    }

    /// See [`TickTimer::init`]
    pub fn init(&mut self, local: &mut dyn LocalInterrupts) {
        self.timer.init(local);
    }

    /// The tick driver
    pub fn timer(&self) -> &TickTimer<T> {
        &self.timer
    }

    /// The tick driver, mutably
    pub fn timer_mut(&mut self) -> &mut TickTimer<T> {
        &mut self.timer
    }

    /// The tick sink
    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl<T: MachineTimer, K: TickSink> TrapRouter for TimerLine<T, K> {
    fn route(&mut self, code: usize, _console: &dyn Console) -> bool {
        if code != InterruptCause::MachineTimer as usize {
            return false;
        }
        self.timer.on_tick(&mut self.sink);
        true
    }
}
