//! Runs as its own test binary so nothing has installed the logger before
//! the module loads.

mod common;

use common::{install_console, logged, take_lines};
use hpuefi_mod::{Lifecycle, THIS_MODULE};
use kernel::{devfs::DevFs, printk::KernLevel, ModuleSlot};

#[test]
fn loading_the_module_wires_log_output_to_the_console() {
    install_console();
    take_lines();
    let devfs: &'static DevFs = Box::leak(Box::new(DevFs::new()));
    let mut slot = ModuleSlot::<DevFs, Lifecycle<'static, DevFs>>::new(&THIS_MODULE, devfs);

    slot.on_module_load().unwrap();
    let lines = take_lines();
    assert!(lines
        .iter()
        .any(|(level, line)| *level == KernLevel::Info && line.contains("Module loaded successfully")));

    slot.on_module_unload();
    assert!(logged(&take_lines(), "Module unloaded"));
}
