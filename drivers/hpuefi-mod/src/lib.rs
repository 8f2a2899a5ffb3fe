//! The `hpuefi_mod` character device module.
//!
//! Loading the module registers a dynamic major number, creates the
//! `hpuefi_mod` class and the `hpuefi-mod` node under it. The node reads as
//! empty and accepts any write. Unloading removes all three again.
#![cfg_attr(not(test), no_std)]

pub mod file;
pub mod lifecycle;

use kernel::ThisModule;

pub use file::{HpUefiFile, HANDLERS};
pub use lifecycle::{InitError, Lifecycle};

/// Name of the major number registration and of the device class.
pub const DRIVER_NAME: &str = "hpuefi_mod";
/// Name of the device node.
pub const DEVICE_NAME: &str = "hpuefi-mod";
pub const DEVICE_MINOR: u32 = 0;

pub static THIS_MODULE: ThisModule = ThisModule::new(DRIVER_NAME);
