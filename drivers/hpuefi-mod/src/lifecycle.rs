//! Load and unload of the module's kernel resources.
//!
//! Three resources are held while the module is loaded: the major number
//! (with [`HANDLERS`] bound to it), the device class and the device node.
//! They are acquired in that order and released in the opposite one, both on
//! unload and when a later step fails during load.

use core::fmt;

use kernel::{
    chrdev::{DevT, Major, Registration},
    code::EBUSY,
    device::{Class, Device, DeviceModel},
    error::{Error, KernelResult},
    logger, pr_alert, Module, ThisModule,
};

use crate::{DEVICE_MINOR, DEVICE_NAME, DRIVER_NAME, HANDLERS};

/// Why [`Lifecycle::initialize`] failed.
///
/// The first three carry the host's error unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    IdentifierAllocationFailed(Error),
    ClassCreationFailed(Error),
    NodeCreationFailed(Error),
    /// `initialize` was called on a module that is already loaded.
    AlreadyInitialized,
}

impl InitError {
    pub fn to_error(self) -> Error {
        match self {
            InitError::IdentifierAllocationFailed(e)
            | InitError::ClassCreationFailed(e)
            | InitError::NodeCreationFailed(e) => e,
            InitError::AlreadyInitialized => EBUSY,
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Error {
        e.to_error()
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::IdentifierAllocationFailed(e) => {
                write!(f, "failed to register major number: {}", e)
            }
            InitError::ClassCreationFailed(e) => write!(f, "failed to create class: {}", e),
            InitError::NodeCreationFailed(e) => write!(f, "failed to create device: {}", e),
            InitError::AlreadyInitialized => f.write_str("module is already initialized"),
        }
    }
}

struct Resources<'h, H: DeviceModel> {
    device: Device<'h, H>,
    class: Class<'h, H>,
    chrdev: Registration<'h, H>,
}

impl<'h, H: DeviceModel> Resources<'h, H> {
    fn acquire(host: &'h H, module: &'static ThisModule) -> Result<Self, InitError> {
        let chrdev = match Registration::register(host, DRIVER_NAME, &HANDLERS) {
            Ok(chrdev) => chrdev,
            Err(e) => {
                pr_alert!("{}: Failed to register major number", DEVICE_NAME);
                return Err(InitError::IdentifierAllocationFailed(e));
            }
        };

        let class = match Class::create(host, module, DRIVER_NAME) {
            Ok(class) => class,
            Err(e) => {
                drop(chrdev);
                pr_alert!("{}: Failed to create class", DEVICE_NAME);
                return Err(InitError::ClassCreationFailed(e));
            }
        };

        let device = match Device::create(host, &class, chrdev.devt(DEVICE_MINOR), DEVICE_NAME) {
            Ok(device) => device,
            Err(e) => {
                drop(class);
                drop(chrdev);
                pr_alert!("{}: Failed to create device", DEVICE_NAME);
                return Err(InitError::NodeCreationFailed(e));
            }
        };

        Ok(Self {
            device,
            class,
            chrdev,
        })
    }

    /// Node, then class, then major. Each release runs whatever the previous
    /// one reported.
    fn release(self) {
        let Self {
            device,
            class,
            chrdev,
        } = self;
        drop(device);
        drop(class);
        drop(chrdev);
    }
}

/// Owns the module's resources between load and unload.
///
/// A `Lifecycle` is either unloaded (nothing held) or ready (all three
/// resources held); there is no state in between. Dropping a ready
/// `Lifecycle` tears it down.
pub struct Lifecycle<'h, H: DeviceModel> {
    host: &'h H,
    module: &'static ThisModule,
    resources: Option<Resources<'h, H>>,
}

impl<'h, H: DeviceModel> Lifecycle<'h, H> {
    pub fn new(host: &'h H, module: &'static ThisModule) -> Self {
        Self {
            host,
            module,
            resources: None,
        }
    }

    /// Acquires the major number, the class and the node.
    ///
    /// On failure everything acquired so far has been released again and the
    /// lifecycle stays unloaded. Calling this on a ready lifecycle fails with
    /// [`InitError::AlreadyInitialized`] and leaves the host untouched.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        if self.resources.is_some() {
            log::warn!("{}: Module already initialized", DEVICE_NAME);
            return Err(InitError::AlreadyInitialized);
        }
        log::info!("{}: Initializing module", DEVICE_NAME);

        let resources = Resources::acquire(self.host, self.module)?;
        log::debug!(
            "{}: major {}, node {}",
            DEVICE_NAME,
            resources.chrdev.major(),
            resources.device.devt()
        );
        self.resources = Some(resources);

        log::info!("{}: Module loaded successfully", DEVICE_NAME);
        Ok(())
    }

    /// Releases the node, the class and the major number, in that order.
    ///
    /// Host errors during release are logged and otherwise ignored. On an
    /// unloaded lifecycle this only logs a warning.
    pub fn teardown(&mut self) {
        match self.resources.take() {
            Some(resources) => {
                resources.release();
                log::info!("{}: Module unloaded", DEVICE_NAME);
            }
            None => log::warn!("{}: Teardown without a loaded module", DEVICE_NAME),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.resources.is_some()
    }

    pub fn major(&self) -> Option<Major> {
        self.resources.as_ref().map(|r| r.chrdev.major())
    }

    pub fn devt(&self) -> Option<DevT> {
        self.resources.as_ref().map(|r| r.device.devt())
    }

    pub fn class(&self) -> Option<&H::Class> {
        self.resources.as_ref().map(|r| r.class.handle())
    }

    pub fn device(&self) -> Option<&H::Device> {
        self.resources.as_ref().map(|r| r.device.handle())
    }
}

impl<H: DeviceModel> Drop for Lifecycle<'_, H> {
    fn drop(&mut self) {
        if self.is_ready() {
            self.teardown();
        }
    }
}

impl<H: DeviceModel + 'static> Module<H> for Lifecycle<'static, H> {
    fn init(module: &'static ThisModule, host: &'static H) -> KernelResult<Self> {
        // A logger installed by an earlier load is kept.
        let _ = logger::init_logger();
        let mut lifecycle = Lifecycle::new(host, module);
        lifecycle.initialize()?;
        Ok(lifecycle)
    }
}

#[cfg(test)]
mod tests {
    use kernel::code::{EEXIST, ENOMEM};

    use super::*;

    #[test]
    fn init_error_keeps_host_errno() {
        assert_eq!(Error::from(InitError::IdentifierAllocationFailed(ENOMEM)), ENOMEM);
        assert_eq!(Error::from(InitError::NodeCreationFailed(EEXIST)), EEXIST);
        assert_eq!(Error::from(InitError::AlreadyInitialized), EBUSY);
    }

    #[test]
    fn init_error_display() {
        assert_eq!(
            InitError::ClassCreationFailed(EEXIST).to_string(),
            "failed to create class: EEXIST (-17)"
        );
        assert_eq!(
            InitError::AlreadyInitialized.to_string(),
            "module is already initialized"
        );
    }
}
