use crate::{code::EBUSY, error::KernelResult as Result, pr_info, pr_warn};

/// The top level entrypoint to implementing a kernel module.
///
/// `H` is the host the module registers itself with. For any teardown or
/// cleanup operations, your type may implement [`Drop`].
pub trait Module<H: ?Sized + 'static>: Sized {
    /// Called at module initialization time.
    ///
    /// Use this method to perform whatever setup or registration your module
    /// should do.
    ///
    /// Equivalent to the `module_init` macro in the C API.
    fn init(module: &'static ThisModule, host: &'static H) -> Result<Self>;
}

/// Equivalent to `THIS_MODULE` in the C API.
#[derive(Debug)]
pub struct ThisModule {
    name: &'static str,
}

impl ThisModule {
    pub const fn new(name: &'static str) -> ThisModule {
        ThisModule { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Where the host keeps a loaded module.
///
/// [`ModuleSlot::on_module_load`] and [`ModuleSlot::on_module_unload`] are the
/// `module_init`/`module_exit` pair: load builds the module with
/// [`Module::init`], unload drops it.
pub struct ModuleSlot<H: ?Sized + 'static, M: Module<H>> {
    module: &'static ThisModule,
    host: &'static H,
    instance: Option<M>,
}

impl<H: ?Sized + 'static, M: Module<H>> ModuleSlot<H, M> {
    pub fn new(module: &'static ThisModule, host: &'static H) -> Self {
        Self {
            module,
            host,
            instance: None,
        }
    }

    /// Loads the module.
    ///
    /// Fails with `EBUSY` without calling [`Module::init`] if the module is
    /// already loaded; otherwise returns whatever `init` failed with.
    pub fn on_module_load(&mut self) -> Result {
        if self.instance.is_some() {
            pr_warn!("{}: module is already loaded", self.module.name());
            return Err(EBUSY);
        }
        let instance = M::init(self.module, self.host)?;
        self.instance = Some(instance);
        Ok(())
    }

    pub fn on_module_unload(&mut self) {
        match self.instance.take() {
            Some(instance) => {
                drop(instance);
                pr_info!("{}: module removed", self.module.name());
            }
            None => pr_warn!("{}: unload without a loaded module", self.module.name()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.instance.is_some()
    }

    pub fn get(&self) -> Option<&M> {
        self.instance.as_ref()
    }
}

impl<H: ?Sized + 'static, M: Module<H>> Drop for ModuleSlot<H, M> {
    fn drop(&mut self) {
        if self.instance.is_some() {
            self.on_module_unload();
        }
    }
}
