#![allow(dead_code)]

use std::{cell::RefCell, sync::Once};

use kernel::{
    chrdev::{DevT, Major},
    code::EIO,
    device::DeviceModel,
    error::{Error, KernelResult},
    fs::file_operations::FileOperations,
    logger,
    printk::{self, Console, KernLevel},
    ThisModule,
};
use spin::Mutex;

/// One call into the host, as seen by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    RegisterChrdev,
    UnregisterChrdev(Major),
    ClassCreate,
    ClassDestroy(u32),
    DeviceCreate(DevT),
    DeviceDestroy(DevT),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Register,
    Class,
    Device,
}

pub const MAJOR: Major = Major::new(240);
pub const CLASS_ID: u32 = 7;

/// A host that records every call and fails on request.
pub struct RecordingHost {
    calls: Mutex<Vec<Call>>,
    fail_at: Option<(Step, Error)>,
    fail_releases: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_at: None,
            fail_releases: false,
        }
    }

    pub fn failing_at(step: Step, err: Error) -> Self {
        Self {
            fail_at: Some((step, err)),
            ..Self::new()
        }
    }

    pub fn failing_releases() -> Self {
        Self {
            fail_releases: true,
            ..Self::new()
        }
    }

    pub fn leak(self) -> &'static Self {
        Box::leak(Box::new(self))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: Call, step: Option<Step>) -> KernelResult {
        self.calls.lock().push(call);
        match (step, self.fail_at) {
            (Some(step), Some((failing, err))) if step == failing => Err(err),
            (None, _) if self.fail_releases => Err(EIO),
            _ => Ok(()),
        }
    }
}

impl DeviceModel for RecordingHost {
    type Class = u32;
    type Device = DevT;

    fn register_chrdev(
        &self,
        _name: &'static str,
        _fops: &'static dyn FileOperations,
    ) -> KernelResult<Major> {
        self.record(Call::RegisterChrdev, Some(Step::Register))?;
        Ok(MAJOR)
    }

    fn unregister_chrdev(&self, major: Major, _name: &'static str) -> KernelResult {
        self.record(Call::UnregisterChrdev(major), None)
    }

    fn class_create(&self, _owner: &'static ThisModule, _name: &'static str) -> KernelResult<u32> {
        self.record(Call::ClassCreate, Some(Step::Class))?;
        Ok(CLASS_ID)
    }

    fn class_destroy(&self, class: &u32) -> KernelResult {
        self.record(Call::ClassDestroy(*class), None)
    }

    fn device_create(&self, _class: &u32, devt: DevT, _name: &'static str) -> KernelResult<DevT> {
        self.record(Call::DeviceCreate(devt), Some(Step::Device))?;
        Ok(devt)
    }

    fn device_destroy(&self, _class: &u32, devt: DevT) -> KernelResult {
        self.record(Call::DeviceDestroy(devt), None)
    }
}

std::thread_local! {
    static LINES: RefCell<Vec<(KernLevel, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps console lines per test thread so parallel tests don't see each
/// other's output.
struct CaptureConsole;

impl Console for CaptureConsole {
    fn write_line(&self, level: KernLevel, line: &[u8]) {
        let line = String::from_utf8_lossy(line).into_owned();
        LINES.with(|lines| lines.borrow_mut().push((level, line)));
    }
}

static CONSOLE: CaptureConsole = CaptureConsole;

/// Routes printk output to the per-thread capture buffer. The `log` facade
/// stays unwired until something installs the logger.
pub fn install_console() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = printk::set_console(&CONSOLE);
    });
}

pub fn install_logging() {
    static INIT: Once = Once::new();
    install_console();
    INIT.call_once(|| {
        let _ = logger::init_logger();
    });
}

pub fn take_lines() -> Vec<(KernLevel, String)> {
    LINES.with(|lines| std::mem::take(&mut *lines.borrow_mut()))
}

pub fn logged(lines: &[(KernLevel, String)], needle: &str) -> bool {
    lines.iter().any(|(_, line)| line.contains(needle))
}
