//! Character device numbers and major number registration.
//!
//! C header: [`include/linux/kdev_t.h`](../../../../include/linux/kdev_t.h)

use core::fmt;

use crate::{device::DeviceModel, error::KernelResult, fs::file_operations::FileOperations};

pub const MINORBITS: u32 = 20;
pub const MINORMASK: u32 = (1 << MINORBITS) - 1;

/// A character device major number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Major(u32);

impl Major {
    pub const fn new(major: u32) -> Self {
        Self(major)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Major {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A device number, `dev_t` in C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevT(u32);

impl DevT {
    /// Equivalent to the `MKDEV` macro.
    pub const fn new(major: Major, minor: u32) -> Self {
        Self((major.0 << MINORBITS) | (minor & MINORMASK))
    }

    pub const fn major(self) -> Major {
        Major(self.0 >> MINORBITS)
    }

    pub const fn minor(self) -> u32 {
        self.0 & MINORMASK
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DevT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major().0, self.minor())
    }
}

/// A registered major number together with its handler table.
///
/// The major is given back to the host when this is dropped.
pub struct Registration<'h, H: DeviceModel> {
    host: &'h H,
    major: Major,
    name: &'static str,
}

impl<'h, H: DeviceModel> Registration<'h, H> {
    /// Asks the host for a dynamic major number and binds `fops` to it,
    /// `register_chrdev(0, name, fops)` in C.
    pub fn register(
        host: &'h H,
        name: &'static str,
        fops: &'static dyn FileOperations,
    ) -> KernelResult<Self> {
        let major = host.register_chrdev(name, fops)?;
        log::debug!("registered major {} for {}", major, name);
        Ok(Self { host, major, name })
    }

    pub fn major(&self) -> Major {
        self.major
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The device number of `minor` under this major.
    pub fn devt(&self, minor: u32) -> DevT {
        DevT::new(self.major, minor)
    }
}

impl<H: DeviceModel> Drop for Registration<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.host.unregister_chrdev(self.major, self.name) {
            log::warn!("failed to release major {} ({}): {:?}", self.major, self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkdev_round_trips_major_and_minor() {
        let devt = DevT::new(Major::new(511), 7);
        assert_eq!(devt.major(), Major::new(511));
        assert_eq!(devt.minor(), 7);
        assert_eq!(devt.as_raw(), (511 << 20) | 7);
        assert_eq!(alloc::format!("{}", devt), "511:7");
    }

    #[test]
    fn minor_is_masked() {
        let devt = DevT::new(Major::new(1), MINORMASK + 2);
        assert_eq!(devt.major(), Major::new(1));
        assert_eq!(devt.minor(), 1);
    }
}
