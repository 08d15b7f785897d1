//! Test doubles for the hardware and collaborators the core talks to

use std::cell::RefCell;
use std::sync::Mutex;

use crate::core::irq::{InterruptController, IrqNumber, IrqParam};
use crate::drivers::base::timer::{MachineTimer, TickSink};
use crate::utils::console::Console;

/// Protocol events, recorded per test thread in the order they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Claim(IrqNumber),
    Handler(IrqNumber, IrqParam),
    Complete(IrqNumber),
    Tick,
}

thread_local! {
    static TRACE: RefCell<Vec<Event>> = RefCell::new(Vec::new());
}

pub fn trace(event: Event) {
    TRACE.with(|t| t.borrow_mut().push(event));
}

pub fn take_trace() -> Vec<Event> {
    TRACE.with(|t| core::mem::take(&mut *t.borrow_mut()))
}

/// Handler that records its invocation in the trace
pub fn tracing_isr(irq: IrqNumber, param: IrqParam) {
    trace(Event::Handler(irq, param));
}

/// Console capturing every emitted line
#[derive(Debug, Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl Console for RecordingConsole {
    fn emit_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// PLIC model: gateway latching, priority/threshold filtering and the
/// claim/complete handshake
#[derive(Debug)]
pub struct SimPlic {
    pub enabled: Vec<bool>,
    pub priority: Vec<u32>,
    pub pending: Vec<bool>,
    pub in_service: Vec<bool>,
    pub threshold: u32,
    pub completions: Vec<IrqNumber>,
}

impl SimPlic {
    pub fn new(sources: usize) -> Self {
        Self {
            enabled: vec![true; sources],
            priority: vec![7; sources],
            pending: vec![false; sources],
            in_service: vec![false; sources],
            threshold: 7,
            completions: Vec::new(),
        }
    }

    /// Assert a source's interrupt line
    pub fn raise(&mut self, irq: IrqNumber) {
        self.pending[irq as usize] = true;
    }

    fn eligible(&self, id: usize) -> bool {
        id != 0
            && self.pending[id]
            && !self.in_service[id]
            && self.enabled[id]
            && self.priority[id] > self.threshold
    }
}

impl InterruptController for SimPlic {
    fn enable(&mut self, irq: IrqNumber) {
        self.enabled[irq as usize] = true;
    }

    fn disable(&mut self, irq: IrqNumber) {
        self.enabled[irq as usize] = false;
    }

    fn set_priority(&mut self, irq: IrqNumber, priority: u32) {
        self.priority[irq as usize] = priority;
    }

    fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    fn claim(&mut self) -> IrqNumber {
        // Highest priority wins, ties go to the lowest id.
        let best = (1..self.pending.len())
            .filter(|&id| self.eligible(id))
            .max_by(|&a, &b| self.priority[a].cmp(&self.priority[b]).then(b.cmp(&a)));

        match best {
            Some(id) => {
                self.pending[id] = false;
                self.in_service[id] = true;
                trace(Event::Claim(id as IrqNumber));
                id as IrqNumber
            }
            None => 0,
        }
    }

    fn complete(&mut self, irq: IrqNumber) {
        let id = irq as usize;
        assert!(
            id < self.in_service.len() && self.in_service[id],
            "complete({}) without a matching claim",
            irq
        );
        self.in_service[id] = false;
        self.completions.push(irq);
        trace(Event::Complete(irq));
    }
}

/// Free-running counter and compare register
#[derive(Debug, Default)]
pub struct SimTimer {
    pub now: u64,
    pub compare: u64,
    pub compare_writes: usize,
}

impl SimTimer {
    pub fn at(now: u64) -> Self {
        Self {
            now,
            compare: u64::MAX,
            compare_writes: 0,
        }
    }
}

impl MachineTimer for SimTimer {
    fn counter(&self) -> u64 {
        self.now
    }

    fn compare(&self) -> u64 {
        self.compare
    }

    fn set_compare(&mut self, value: u64) {
        self.compare = value;
        self.compare_writes += 1;
    }
}

/// Tick sink counting notifications
#[derive(Debug, Default)]
pub struct TickCounter {
    pub ticks: u64,
}

impl TickSink for TickCounter {
    fn on_system_tick(&mut self) {
        self.ticks += 1;
        trace(Event::Tick);
    }
}

/// Zeroed memory standing in for a device's register window
pub struct RegisterBlock {
    words: Vec<u32>,
    base: *mut u32,
}

impl RegisterBlock {
    pub fn new(bytes: usize) -> Self {
        let mut words = vec![0u32; bytes.div_ceil(4)];
        let base = words.as_mut_ptr();
        Self { words, base }
    }

    pub fn base(&self) -> usize {
        self.base as usize
    }

    pub fn read(&self, offset: usize) -> u32 {
        assert!(offset / 4 < self.words.len());
        unsafe { self.base.add(offset / 4).read_volatile() }
    }

    pub fn write(&self, offset: usize, value: u32) {
        assert!(offset / 4 < self.words.len());
        unsafe { self.base.add(offset / 4).write_volatile(value) }
    }
}

// Only ever handed to the board from a single test.
unsafe impl Send for RegisterBlock {}
unsafe impl Sync for RegisterBlock {}
