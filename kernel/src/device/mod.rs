// SPDX-License-Identifier: GPL-2.0
//

//! Device classes and device nodes of the kernel's driver model.
//!
//! C header: [`include/linux/device.h`](../../../../include/linux/device.h)
//!
//! The driver model itself belongs to the host. A driver sees it only through
//! [`DeviceModel`], and holds what it acquired in the RAII guards [`Class`]
//! and [`Device`], next to [`crate::chrdev::Registration`] for the major.

use crate::{
    chrdev::{DevT, Major},
    error::KernelResult as Result,
    fs::file_operations::FileOperations,
    module::ThisModule,
};

/// The host side of character device registration.
///
/// Each acquiring primitive has a releasing counterpart. Releases return a
/// result only so that failures can be reported; unload cannot be aborted, so
/// callers log and carry on.
pub trait DeviceModel: Sync {
    /// Handle to a device class, `struct class *` in C.
    type Class: Clone;
    /// Handle to a device node, `struct device *` in C.
    type Device;

    /// Allocates a dynamic major number and binds `fops` to it.
    fn register_chrdev(&self, name: &'static str, fops: &'static dyn FileOperations)
        -> Result<Major>;

    fn unregister_chrdev(&self, major: Major, name: &'static str) -> Result;

    fn class_create(&self, owner: &'static ThisModule, name: &'static str) -> Result<Self::Class>;

    fn class_destroy(&self, class: &Self::Class) -> Result;

    /// Creates the node `name` for `devt` under `class`.
    fn device_create(
        &self,
        class: &Self::Class,
        devt: DevT,
        name: &'static str,
    ) -> Result<Self::Device>;

    fn device_destroy(&self, class: &Self::Class, devt: DevT) -> Result;
}

/// A device class, destroyed when dropped.
pub struct Class<'h, H: DeviceModel> {
    host: &'h H,
    handle: H::Class,
    name: &'static str,
}

impl<'h, H: DeviceModel> Class<'h, H> {
    /// `class_create(owner, name)` in C.
    pub fn create(host: &'h H, owner: &'static ThisModule, name: &'static str) -> Result<Self> {
        let handle = host.class_create(owner, name)?;
        Ok(Self { host, handle, name })
    }

    pub fn handle(&self) -> &H::Class {
        &self.handle
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<H: DeviceModel> Drop for Class<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.host.class_destroy(&self.handle) {
            log::warn!("failed to destroy class {}: {:?}", self.name, e);
        }
    }
}

/// A device node under a [`Class`], destroyed when dropped.
///
/// The node keeps its own copy of the class handle, so it must be dropped
/// before the [`Class`] it was created under.
pub struct Device<'h, H: DeviceModel> {
    host: &'h H,
    class: H::Class,
    devt: DevT,
    handle: H::Device,
    name: &'static str,
}

impl<'h, H: DeviceModel> Device<'h, H> {
    /// `device_create(class, NULL, devt, NULL, name)` in C.
    pub fn create(host: &'h H, class: &Class<'h, H>, devt: DevT, name: &'static str) -> Result<Self> {
        let handle = host.device_create(class.handle(), devt, name)?;
        Ok(Self {
            host,
            class: class.handle().clone(),
            devt,
            handle,
            name,
        })
    }

    pub fn devt(&self) -> DevT {
        self.devt
    }

    pub fn handle(&self) -> &H::Device {
        &self.handle
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<H: DeviceModel> Drop for Device<'_, H> {
    fn drop(&mut self) {
        if let Err(e) = self.host.device_destroy(&self.class, self.devt) {
            log::warn!("failed to destroy device {} ({}): {:?}", self.name, self.devt, e);
        }
    }
}
