use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{
    error::{linux_err::EBUSY, KernelResult},
    pr_debug, pr_err, pr_info, pr_warn,
};

/// Bridges the `log` facade onto the printk console.
pub struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let module_path = record.module_path().unwrap_or_default();
        match record.level() {
            Level::Error => {
                pr_err!("[ERROR] [{}] {}", module_path, record.args());
            }
            Level::Warn => {
                pr_warn!("[ WARN] [{}] {}", module_path, record.args());
            }
            Level::Info => {
                pr_info!("[ INFO] [{}] {}", module_path, record.args());
            }
            Level::Debug => {
                pr_debug!("[DEBUG] [{}] {}", module_path, record.args());
            }
            Level::Trace => {
                pr_debug!("[TRACE] [{}] {}", module_path, record.args());
            }
        };
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// Maps the build-time `LOG` setting onto a level filter.
pub fn level_from_env(value: Option<&str>) -> LevelFilter {
    match value {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs [`KernelLogger`] as the global logger.
///
/// Fails with `EBUSY` if some logger is already installed.
pub fn init_logger() -> KernelResult {
    pr_info!("Init logger {:?}", option_env!("LOG"));
    log::set_logger(&LOGGER).map_err(|_| EBUSY)?;
    log::set_max_level(level_from_env(option_env!("LOG")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::string::String;

    use super::*;
    use crate::printk::KernLevel;

    #[test]
    fn level_parsing_defaults_to_info() {
        assert_eq!(level_from_env(Some("TRACE")), LevelFilter::Trace);
        assert_eq!(level_from_env(Some("ERROR")), LevelFilter::Error);
        assert_eq!(level_from_env(Some("verbose")), LevelFilter::Info);
        assert_eq!(level_from_env(None), LevelFilter::Info);
    }

    #[test]
    fn trace_records_print_as_debug_lines() {
        crate::printk::capture::install();

        KernelLogger.log(
            &Record::builder()
                .level(Level::Trace)
                .module_path(Some("m"))
                .args(format_args!("deep"))
                .build(),
        );

        let expected = if cfg!(debug_assertions) {
            std::vec![(KernLevel::Debug, String::from("[TRACE] [m] deep"))]
        } else {
            std::vec![]
        };
        assert_eq!(crate::printk::capture::take(), expected);
    }

    #[test]
    fn second_install_is_rejected() {
        let _ = init_logger();
        assert_eq!(init_logger(), Err(EBUSY));
    }
}
