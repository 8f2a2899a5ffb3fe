//! An in-memory [`DeviceModel`].
//!
//! [`DevFs`] keeps the chrdev table, the class list and the `/dev` nodes the
//! way the kernel's `fs/char_dev.c` and `drivers/base/class.c` see them, which
//! is enough to load a driver, open its node and drive its handler table
//! without a running kernel.

use alloc::{
    collections::BTreeMap,
    format,
    string::{String, ToString},
    vec::Vec,
};

use spin::Mutex;

use crate::{
    buf::{UserSliceReader, UserSliceWriter},
    chrdev::{DevT, Major},
    code::{EBADF, EBUSY, EEXIST, EINVAL, ENODEV, ENOENT, ENXIO},
    device::DeviceModel,
    error::KernelResult as Result,
    fs::file_operations::{File, FileFlags, FileOperations},
    module::ThisModule,
};

// Dynamic major ranges from fs/char_dev.c, both searched top-down.
const CHRDEV_MAJOR_DYN_START: u32 = 254;
const CHRDEV_MAJOR_DYN_END: u32 = 234;
const CHRDEV_MAJOR_DYN_EXT_START: u32 = 511;
const CHRDEV_MAJOR_DYN_EXT_END: u32 = 384;
const CHRDEV_MAJOR_MAX: u32 = 512;

/// Handle to a class created by [`DevFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRef {
    id: u64,
    name: String,
}

impl ClassRef {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Handle to a node created by [`DevFs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    path: String,
    devt: DevT,
}

impl NodeRef {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn devt(&self) -> DevT {
        self.devt
    }
}

struct ChrdevEntry {
    name: String,
    fops: &'static dyn FileOperations,
}

struct ClassEntry {
    name: String,
    owner: &'static str,
}

struct NodeEntry {
    class: u64,
    devt: DevT,
}

#[derive(Default)]
struct Inner {
    chrdevs: BTreeMap<Major, ChrdevEntry>,
    classes: BTreeMap<u64, ClassEntry>,
    next_class: u64,
    nodes: BTreeMap<String, NodeEntry>,
}

impl Inner {
    fn find_dynamic_major(&self) -> Option<Major> {
        (CHRDEV_MAJOR_DYN_END..=CHRDEV_MAJOR_DYN_START)
            .rev()
            .chain((CHRDEV_MAJOR_DYN_EXT_END..=CHRDEV_MAJOR_DYN_EXT_START).rev())
            .map(Major::new)
            .find(|major| !self.chrdevs.contains_key(major))
    }

    fn insert_chrdev(
        &mut self,
        major: Major,
        name: &str,
        fops: &'static dyn FileOperations,
    ) -> Result<Major> {
        if self.chrdevs.contains_key(&major) {
            return Err(EBUSY);
        }
        self.chrdevs.insert(
            major,
            ChrdevEntry {
                name: name.to_string(),
                fops,
            },
        );
        Ok(major)
    }
}

/// In-memory chrdev table, class list and `/dev` directory.
pub struct DevFs {
    inner: Mutex<Inner>,
}

impl Default for DevFs {
    fn default() -> Self {
        Self::new()
    }
}

impl DevFs {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Registers `fops` under a fixed major, `register_chrdev(major, ...)` with
    /// a non-zero major in C.
    pub fn register_static(
        &self,
        major: Major,
        name: &str,
        fops: &'static dyn FileOperations,
    ) -> Result<Major> {
        if major.get() == 0 || major.get() >= CHRDEV_MAJOR_MAX {
            return Err(EINVAL);
        }
        self.inner.lock().insert_chrdev(major, name, fops)
    }

    /// Opens the node at `path` and runs the driver's `open` handler.
    pub fn open(&self, path: &str, flags: FileFlags) -> Result<OpenFile> {
        let (devt, fops) = {
            let inner = self.inner.lock();
            let node = inner.nodes.get(path).ok_or(ENOENT)?;
            let chrdev = inner.chrdevs.get(&node.devt.major()).ok_or(ENXIO)?;
            (node.devt, chrdev.fops)
        };
        // The table lock is not held while calling into the driver.
        let file = File::new(devt, flags);
        fops.open(&file)?;
        Ok(OpenFile {
            fops,
            file,
            pos: 0,
            released: false,
        })
    }

    pub fn device_paths(&self) -> Vec<String> {
        self.inner.lock().nodes.keys().cloned().collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .classes
            .values()
            .map(|class| class.name.clone())
            .collect()
    }

    /// Name of the module that owns class `name`.
    pub fn class_owner(&self, name: &str) -> Option<&'static str> {
        self.inner
            .lock()
            .classes
            .values()
            .find(|class| class.name == name)
            .map(|class| class.owner)
    }

    pub fn chrdev_count(&self) -> usize {
        self.inner.lock().chrdevs.len()
    }

    pub fn chrdev_name(&self, major: Major) -> Option<String> {
        self.inner
            .lock()
            .chrdevs
            .get(&major)
            .map(|chrdev| chrdev.name.clone())
    }
}

impl DeviceModel for DevFs {
    type Class = ClassRef;
    type Device = NodeRef;

    fn register_chrdev(&self, name: &'static str, fops: &'static dyn FileOperations) -> Result<Major> {
        let mut inner = self.inner.lock();
        let major = inner.find_dynamic_major().ok_or(EBUSY)?;
        inner.insert_chrdev(major, name, fops)
    }

    fn unregister_chrdev(&self, major: Major, name: &'static str) -> Result {
        let mut inner = self.inner.lock();
        match inner.chrdevs.get(&major).map(|chrdev| chrdev.name == name) {
            Some(true) => {
                inner.chrdevs.remove(&major);
                Ok(())
            }
            Some(false) => Err(EINVAL),
            None => Err(ENOENT),
        }
    }

    fn class_create(&self, owner: &'static ThisModule, name: &'static str) -> Result<ClassRef> {
        let mut inner = self.inner.lock();
        if inner.classes.values().any(|class| class.name == name) {
            return Err(EEXIST);
        }
        let id = inner.next_class;
        inner.next_class += 1;
        inner.classes.insert(
            id,
            ClassEntry {
                name: name.to_string(),
                owner: owner.name(),
            },
        );
        Ok(ClassRef {
            id,
            name: name.to_string(),
        })
    }

    fn class_destroy(&self, class: &ClassRef) -> Result {
        let mut inner = self.inner.lock();
        if !inner.classes.contains_key(&class.id) {
            return Err(ENOENT);
        }
        if inner.nodes.values().any(|node| node.class == class.id) {
            return Err(EBUSY);
        }
        inner.classes.remove(&class.id);
        Ok(())
    }

    fn device_create(&self, class: &ClassRef, devt: DevT, name: &'static str) -> Result<NodeRef> {
        let mut inner = self.inner.lock();
        if !inner.classes.contains_key(&class.id) {
            return Err(ENOENT);
        }
        if !inner.chrdevs.contains_key(&devt.major()) {
            return Err(ENODEV);
        }
        let path = format!("/dev/{}", name);
        if inner.nodes.contains_key(&path) {
            return Err(EEXIST);
        }
        inner.nodes.insert(
            path.clone(),
            NodeEntry {
                class: class.id,
                devt,
            },
        );
        Ok(NodeRef { path, devt })
    }

    fn device_destroy(&self, class: &ClassRef, devt: DevT) -> Result {
        let mut inner = self.inner.lock();
        let path = inner
            .nodes
            .iter()
            .find(|(_, node)| node.class == class.id && node.devt == devt)
            .map(|(path, _)| path.clone())
            .ok_or(ENOENT)?;
        inner.nodes.remove(&path);
        Ok(())
    }
}

/// A file opened through [`DevFs::open`].
///
/// Dropping it without [`OpenFile::close`] still runs the `release` handler.
pub struct OpenFile {
    fops: &'static dyn FileOperations,
    file: File,
    pos: u64,
    released: bool,
}

impl OpenFile {
    /// Reads into `buf` at the current position and advances it.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.file.flags().contains(FileFlags::READ) {
            return Err(EBADF);
        }
        let mut writer = UserSliceWriter::new(buf);
        let read = self.fops.read(&self.file, &mut writer, self.pos)?;
        self.pos += read as u64;
        Ok(read)
    }

    /// Writes `buf` at the current position and advances it.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if !self.file.flags().contains(FileFlags::WRITE) {
            return Err(EBADF);
        }
        let mut reader = UserSliceReader::new(buf);
        let written = self.fops.write(&self.file, &mut reader, self.pos)?;
        self.pos += written as u64;
        Ok(written)
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    /// Runs the `release` handler and reports its result.
    pub fn close(mut self) -> Result {
        self.released = true;
        self.fops.release(&self.file)
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.fops.release(&self.file) {
                log::warn!("release of {} failed: {:?}", self.file.devt(), e);
            }
        }
    }
}
