//! Interrupt descriptor table
//!
//! A fixed-capacity array indexed directly by source id. Every slot always
//! holds a handler; "nothing installed" is the [`IsrHandler::Unhandled`]
//! default, which reports the source and returns.

#[cfg(feature = "interrupt-info")]
use crate::config::IRQ_NAME_MAX;

use super::{IrqNumber, IrqParam, Isr, IsrHandler};

/// Descriptor name storage; longer names are truncated
#[cfg(feature = "interrupt-info")]
pub type IrqName = heapless::String<{ IRQ_NAME_MAX - 1 }>;

#[cfg(feature = "interrupt-info")]
fn truncated_name(name: &str) -> IrqName {
    let mut out = IrqName::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Interrupt descriptor
#[derive(Debug, Clone)]
pub struct InterruptDescriptor {
    /// Handler function
    handler: IsrHandler,
    /// Handler argument
    param: IrqParam,
    /// Name for diagnostics
    #[cfg(feature = "interrupt-info")]
    name: IrqName,
    /// Times this source was serviced since install
    #[cfg(feature = "interrupt-info")]
    counter: u32,
}

impl Default for InterruptDescriptor {
    fn default() -> Self {
        Self::unhandled()
    }
}

impl InterruptDescriptor {
    /// A slot holding the default handler
    pub fn unhandled() -> Self {
        Self {
            handler: IsrHandler::Unhandled,
            param: IrqParam::NONE,
            #[cfg(feature = "interrupt-info")]
            name: truncated_name("default"),
            #[cfg(feature = "interrupt-info")]
            counter: 0,
        }
    }

    /// Installed handler
    pub fn handler(&self) -> IsrHandler {
        self.handler
    }

    /// Handler argument
    pub fn param(&self) -> IrqParam {
        self.param
    }

    /// Name given at install time
    #[cfg(feature = "interrupt-info")]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service count since the last install or reset
    #[cfg(feature = "interrupt-info")]
    pub fn count(&self) -> u32 {
        self.counter
    }
}

/// Interrupt descriptor table with `N` source slots
#[derive(Debug, Clone)]
pub struct DescriptorTable<const N: usize> {
    slots: [InterruptDescriptor; N],
}

impl<const N: usize> Default for DescriptorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DescriptorTable<N> {
    /// Create a table with every slot reset
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| InterruptDescriptor::unhandled()),
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Put every slot back to the default handler
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = InterruptDescriptor::unhandled();
        }
    }

    /// Install a handler for `irq` and return the one it replaces.
    ///
    /// With `handler == None` the slot is left alone and the current
    /// handler is returned, which makes this a query. Ids outside the
    /// table are ignored and report the default handler.
    pub fn install(
        &mut self,
        irq: IrqNumber,
        handler: Option<&'static dyn Isr>,
        param: IrqParam,
        name: &str,
    ) -> IsrHandler {
        let Some(slot) = self.slots.get_mut(irq as usize) else {
            log::warn!("install on out-of-range source {} ignored", irq);
            return IsrHandler::Unhandled;
        };

        let previous = slot.handler;
        if let Some(isr) = handler {
            slot.handler = IsrHandler::Routine(isr);
            slot.param = param;
            #[cfg(feature = "interrupt-info")]
            {
                slot.name = truncated_name(name);
                slot.counter = 0;
            }
            log::debug!("installed handler for source {} ({})", irq, name);
        }

        previous
    }

    /// Handler and argument for `irq`, if the id is in range
    pub fn lookup(&self, irq: IrqNumber) -> Option<(IsrHandler, IrqParam)> {
        self.slots
            .get(irq as usize)
            .map(|slot| (slot.handler, slot.param))
    }

    /// Descriptor for `irq`, if the id is in range
    pub fn descriptor(&self, irq: IrqNumber) -> Option<&InterruptDescriptor> {
        self.slots.get(irq as usize)
    }

    /// Note one service of `irq`
    pub fn record_service(&mut self, irq: IrqNumber) {
        #[cfg(feature = "interrupt-info")]
        {
            if let Some(slot) = self.slots.get_mut(irq as usize) {
                slot.counter = slot.counter.wrapping_add(1);
            }
        }

        #[cfg(not(feature = "interrupt-info"))]
        let _ = irq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{take_trace, tracing_isr, Event, RecordingConsole};
    use test_case::test_case;

    const SOURCES: usize = 53;

    fn first_isr(_irq: IrqNumber, _param: IrqParam) {}

    #[test]
    fn test_reset_installs_default_everywhere() {
        let mut table = DescriptorTable::<SOURCES>::new();
        table.install(5, Some(&first_isr), IrqParam(1), "uart");
        table.reset();

        for irq in 0..SOURCES as IrqNumber {
            let (handler, param) = table.lookup(irq).unwrap();
            assert!(handler.is_unhandled());
            assert_eq!(param, IrqParam::NONE);
        }
    }

    #[test]
    fn test_install_returns_previous_handler() {
        let mut table = DescriptorTable::<SOURCES>::new();
        let console = RecordingConsole::new();

        let previous = table.install(9, Some(&tracing_isr), IrqParam(1), "gpio");
        assert!(previous.is_unhandled());

        let previous = table.install(9, Some(&first_isr), IrqParam(2), "gpio2");
        // The returned handler is the first one: calling it chains to it.
        previous.invoke(9, IrqParam(1), &console);
        assert_eq!(take_trace(), vec![Event::Handler(9, IrqParam(1))]);

        let (_, param) = table.lookup(9).unwrap();
        assert_eq!(param, IrqParam(2));
    }

    #[test]
    fn test_install_without_handler_is_a_query() {
        let mut table = DescriptorTable::<SOURCES>::new();
        table.install(4, Some(&tracing_isr), IrqParam(44), "spi");

        let current = table.install(4, None, IrqParam(99), "other");
        assert!(current.routine().is_some());

        let (handler, param) = table.lookup(4).unwrap();
        assert!(handler.routine().is_some());
        assert_eq!(param, IrqParam(44));
    }

    #[test_case(53 ; "one past the end")]
    #[test_case(1024 ; "far out of range")]
    #[test_case(IrqNumber::MAX ; "maximum id")]
    fn test_out_of_range_install_is_ignored(irq: IrqNumber) {
        let mut table = DescriptorTable::<SOURCES>::new();
        table.install(52, Some(&tracing_isr), IrqParam(52), "last");

        let previous = table.install(irq, Some(&first_isr), IrqParam(7), "bogus");
        assert!(previous.is_unhandled());
        assert!(table.lookup(irq).is_none());

        // Neighbouring slots are untouched.
        let (handler, param) = table.lookup(52).unwrap();
        assert!(handler.routine().is_some());
        assert_eq!(param, IrqParam(52));
        let (handler, _) = table.lookup(51).unwrap();
        assert!(handler.is_unhandled());
    }

    #[cfg(feature = "interrupt-info")]
    #[test]
    fn test_names_and_counters() {
        let mut table = DescriptorTable::<SOURCES>::new();
        assert_eq!(table.descriptor(3).unwrap().name(), "default");

        table.install(3, Some(&first_isr), IrqParam::NONE, "uart0-receive");
        table.record_service(3);
        table.record_service(3);

        let desc = table.descriptor(3).unwrap();
        assert_eq!(desc.name(), "uart0-r");
        assert_eq!(desc.count(), 2);

        // Re-installing starts counting again.
        table.install(3, Some(&first_isr), IrqParam::NONE, "uart0");
        assert_eq!(table.descriptor(3).unwrap().count(), 0);
    }
}
