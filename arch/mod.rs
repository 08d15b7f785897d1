//! Architecture support
//!
//! Global interrupt masking and the halt path. On RISC-V these drive
//! `mstatus.MIE`; elsewhere they operate on a software flag so the rest of
//! the crate can be exercised on a development host.

pub mod riscv;

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))] {
        /// The hart's local interrupt enables
        pub type LocalIrqs = self::riscv::csr::MieCsr;

        /// Enable machine-level interrupt delivery
        pub fn enable_global_interrupts() {
            unsafe { ::riscv::register::mstatus::set_mie() };
        }

        /// Disable machine-level interrupt delivery
        pub fn disable_global_interrupts() {
            unsafe { ::riscv::register::mstatus::clear_mie() };
        }

        /// Whether machine-level interrupts are currently delivered
        pub fn global_interrupts_enabled() -> bool {
            ::riscv::register::mstatus::read().mie()
        }

        fn wait_for_interrupt() {
            unsafe { ::riscv::asm::wfi() };
        }
    } else {
        use core::sync::atomic::{AtomicBool, Ordering};

        static GLOBAL_ENABLE: AtomicBool = AtomicBool::new(false);

        /// The hart's local interrupt enables
        pub type LocalIrqs = self::riscv::csr::SoftMie;

        /// Enable machine-level interrupt delivery
        pub fn enable_global_interrupts() {
            GLOBAL_ENABLE.store(true, Ordering::SeqCst);
        }

        /// Disable machine-level interrupt delivery
        pub fn disable_global_interrupts() {
            GLOBAL_ENABLE.store(false, Ordering::SeqCst);
        }

        /// Whether machine-level interrupts are currently delivered
        pub fn global_interrupts_enabled() -> bool {
            GLOBAL_ENABLE.load(Ordering::SeqCst)
        }

        fn wait_for_interrupt() {
            core::hint::spin_loop();
        }
    }
}

/// Run `f` with machine interrupts masked, restoring the previous state
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    let was_enabled = global_interrupts_enabled();
    if was_enabled {
        disable_global_interrupts();
    }

    let result = f();

    if was_enabled {
        enable_global_interrupts();
    }
    result
}

/// Stop the hart after an unrecoverable trap
pub fn halt(cause: usize) -> ! {
    disable_global_interrupts();
    log::error!("hart halted, cause={:#x}", cause);
    loop {
        wait_for_interrupt();
    }
}
