//! A minimal `log::Log` sink writing through the `hal::uart::Uart`
//! collaborator, following `LENSHOOD-xv6-rust`'s choice to depend on
//! the `log` facade rather than printing straight to the console.
//! Formats each record into a fixed-capacity `ArrayString` (no heap,
//! consistent with the rest of this crate's no_std posture) before
//! handing it to the UART.

use core::cell::UnsafeCell;
use core::fmt::Write;

use arrayvec::ArrayString;
use log::{Level, Log, Metadata, Record};

use crate::hal::uart::Uart;

const LINE_CAPACITY: usize = 256;

/// Installed once at boot via `init`, before any `log::info!`/`debug!`
/// call fires. `None` means log calls are silently dropped, which is
/// the correct behavior before the UART collaborator exists.
pub struct KernelLogger {
    uart: UnsafeCell<Option<&'static dyn Uart>>,
}

unsafe impl Sync for KernelLogger {}

impl KernelLogger {
    pub const fn new() -> KernelLogger {
        KernelLogger {
            uart: UnsafeCell::new(None),
        }
    }

    /// # Safety
    /// Must be called exactly once, before `log::set_logger`, and
    /// never concurrently with a `log` call (boot is single-threaded
    /// on this single-hart target).
    pub unsafe fn init(&self, uart: &'static dyn Uart) {
        *self.uart.get() = Some(uart);
    }
}

impl Default for KernelLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        let Some(uart) = (unsafe { *self.uart.get() }) else {
            return;
        };
        let mut line = ArrayString::<LINE_CAPACITY>::new();
        if write!(line, "[{}] {}\n", record.level(), record.args()).is_err() {
            // Truncated rather than dropped: a long message still gets
            // a partial, still-useful line out to the console.
        }
        uart.write_str(line.as_str());
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::uart::mock::MockUart;

    #[test]
    fn log_writes_formatted_line_through_uart() {
        static UART: MockUart = MockUart {
            written: core::cell::RefCell::new(alloc::string::String::new()),
        };
        let logger = KernelLogger::new();
        unsafe { logger.init(&UART) };

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("hello {}", 7))
                .build(),
        );

        assert!(UART.written.borrow().contains("hello 7"));
    }

    #[test]
    fn log_before_init_is_silently_dropped() {
        let logger = KernelLogger::new();
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("no uart yet"))
                .build(),
        );
    }
}
