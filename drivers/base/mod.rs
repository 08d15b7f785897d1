//! Base drivers shared by every board

pub mod timer;

pub use timer::{MachineTimer, TickSink, TickTimer, TimerLine};
