use core::{cmp, fmt};

use spin::Once;

use crate::error::{linux_err::EBUSY, KernelResult};

/// Console log levels, `KERN_EMERG` (0) through `KERN_DEBUG` (7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KernLevel {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
    /// `KERN_CONT`: continues the previous line.
    Cont = 8,
}

/// Sink for formatted log lines.
///
/// The host installs one console with [`set_console`]; every `pr_*!` and
/// [`println!`] line ends up in [`Console::write_line`].
pub trait Console: Sync {
    fn write_line(&self, level: KernLevel, line: &[u8]);
}

static CONSOLE: Once<&'static dyn Console> = Once::new();

/// Installs the console. Only the first call wins, later calls fail with `EBUSY`.
pub fn set_console(console: &'static dyn Console) -> KernelResult {
    let mut installed = false;
    CONSOLE.call_once(|| {
        installed = true;
        console
    });
    if installed {
        Ok(())
    } else {
        Err(EBUSY)
    }
}

#[doc(hidden)]
pub fn printk(level: KernLevel, s: &[u8]) {
    // Lines printed before a console exists are dropped, like early printk
    // without a boot console.
    if let Some(console) = CONSOLE.get() {
        console.write_line(level, s);
    }
}

#[doc(hidden)]
pub fn printk_fmt(level: KernLevel, args: fmt::Arguments<'_>) {
    let mut writer = LogLineWriter::new();
    let _ = fmt::write(&mut writer, args);
    printk(level, writer.as_bytes());
}

// From kernel/print/printk.c
pub const LOG_LINE_MAX: usize = 1024 - 32;

/// Fixed-size line buffer. Output past [`LOG_LINE_MAX`] is silently cut.
#[doc(hidden)]
pub struct LogLineWriter {
    data: [u8; LOG_LINE_MAX],
    pos: usize,
}

#[allow(clippy::new_without_default)]
impl LogLineWriter {
    pub fn new() -> LogLineWriter {
        LogLineWriter {
            data: [0u8; LOG_LINE_MAX],
            pos: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.pos]
    }
}

impl fmt::Write for LogLineWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let copy_len = cmp::min(LOG_LINE_MAX - self.pos, s.len());
        self.data[self.pos..self.pos + copy_len].copy_from_slice(&s.as_bytes()[..copy_len]);
        self.pos += copy_len;
        Ok(())
    }
}

/// [`println!`] functions the same as it does in `std`, except instead of
/// printing to `stdout`, it writes to the kernel console at the `KERN_INFO`
/// level.
///
/// [`println!`]: https://doc.rust-lang.org/stable/std/macro.println.html
#[macro_export]
macro_rules! println {
    () => ({
        $crate::printk::printk($crate::printk::KernLevel::Info, b"");
    });
    ($($arg:tt)*) => ({
        $crate::printk::printk_fmt($crate::printk::KernLevel::Info, ::core::format_args!($($arg)*));
    });
}

#[macro_export]
macro_rules! pr_emerg {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Emerg, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_alert {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Alert, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_crit {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Crit, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_err {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Err, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_warn {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Warning, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_notice {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Notice, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! pr_info {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Info, ::core::format_args!($($arg)*))
    };
}

/// Debug-level print, compiled out of release builds.
#[macro_export]
macro_rules! pr_debug {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::printk::printk_fmt($crate::printk::KernLevel::Debug, ::core::format_args!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! pr_cont {
    ($($arg:tt)*) => {
        $crate::printk::printk_fmt($crate::printk::KernLevel::Cont, ::core::format_args!($($arg)*))
    };
}
