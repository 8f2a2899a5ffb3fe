use core::{fmt, fmt::Debug, num::TryFromIntError, str::Utf8Error};

use crate::pr_warn;

/// Largest errno value the kernel hands out (`include/linux/err.h`).
pub const MAX_ERRNO: i32 = 4095;

pub type KernelResult<T = ()> = Result<T, Error>;

/// A kernel error code.
///
/// # Invariants
///
/// The inner value is a valid errno, i.e. in `-MAX_ERRNO..0`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error(core::ffi::c_int);

impl Error {
    pub fn from_errno(errno: core::ffi::c_int) -> Error {
        if errno < -MAX_ERRNO || errno >= 0 {
            pr_warn!(
                "attempted to create `Error` with out of range `errno`: {}",
                errno
            );
            return linux_err::EINVAL;
        }
        // INVARIANT: The check above ensures the type invariant
        // will hold.
        Error(errno)
    }

    /// Converts a C-style return value into a [`KernelResult`].
    ///
    /// Negative values are errors, anything else is passed through.
    pub fn to_result(ret: core::ffi::c_int) -> KernelResult<core::ffi::c_int> {
        if ret < 0 {
            Err(Error::from_errno(ret))
        } else {
            Ok(ret)
        }
    }

    pub fn to_errno(&self) -> core::ffi::c_int {
        self.0
    }

    /// Returns a string representing the error, if one exists.
    pub fn name(&self) -> Option<&'static str> {
        linux_err::name_of(-self.0)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            // Print out number if no name can be found.
            None => f.debug_tuple("Error").field(&-self.0).finish(),
            Some(name) => f.debug_tuple(name).finish(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            None => write!(f, "errno {}", -self.0),
            Some(name) => write!(f, "{} ({})", name, self.0),
        }
    }
}

/// Contains the C-compatible error codes.
#[rustfmt::skip]
#[allow(unused)]
pub mod linux_err {
    macro_rules! declare_err {
        ($err:tt = $num:expr $(, $doc:expr)+ $(,)?) => {
            $(
            #[doc = $doc]
            )*
            pub const $err: super::Error = super::Error(-$num);
        };
    }

    declare_err!(EPERM = 1, "Operation not permitted.");
    declare_err!(ENOENT = 2, "No such file or directory.");
    declare_err!(EINTR = 4, "Interrupted system call.");
    declare_err!(EIO = 5, "I/O error.");
    declare_err!(ENXIO = 6, "No such device or address.");
    declare_err!(EBADF = 9, "Bad file number.");
    declare_err!(EAGAIN = 11, "Try again.");
    declare_err!(ENOMEM = 12, "Out of memory.");
    declare_err!(EACCES = 13, "Permission denied.");
    declare_err!(EFAULT = 14, "Bad address.");
    declare_err!(EBUSY = 16, "Device or resource busy.");
    declare_err!(EEXIST = 17, "File exists.");
    declare_err!(ENODEV = 19, "No such device.");
    declare_err!(ENOTDIR = 20, "Not a directory.");
    declare_err!(EISDIR = 21, "Is a directory.");
    declare_err!(EINVAL = 22, "Invalid argument.");
    declare_err!(ENFILE = 23, "File table overflow.");
    declare_err!(EMFILE = 24, "Too many open files.");
    declare_err!(ENOTTY = 25, "Not a typewriter.");
    declare_err!(ENOSPC = 28, "No space left on device.");
    declare_err!(ESPIPE = 29, "Illegal seek.");
    declare_err!(EROFS = 30, "Read-only file system.");
    declare_err!(ERANGE = 34, "Math result not representable.");
    declare_err!(ENOTSUPP = 524, "Operation is not supported.");

    pub(crate) fn name_of(errno: i32) -> Option<&'static str> {
        let name = match errno {
            1 => "EPERM",
            2 => "ENOENT",
            4 => "EINTR",
            5 => "EIO",
            6 => "ENXIO",
            9 => "EBADF",
            11 => "EAGAIN",
            12 => "ENOMEM",
            13 => "EACCES",
            14 => "EFAULT",
            16 => "EBUSY",
            17 => "EEXIST",
            19 => "ENODEV",
            20 => "ENOTDIR",
            21 => "EISDIR",
            22 => "EINVAL",
            23 => "ENFILE",
            24 => "EMFILE",
            25 => "ENOTTY",
            28 => "ENOSPC",
            29 => "ESPIPE",
            30 => "EROFS",
            34 => "ERANGE",
            524 => "ENOTSUPP",
            _ => return None,
        };
        Some(name)
    }
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Error {
        linux_err::EINVAL
    }
}

impl From<Utf8Error> for Error {
    fn from(_: Utf8Error) -> Error {
        linux_err::EINVAL
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Error {
        linux_err::EINVAL
    }
}

impl From<alloc::collections::TryReserveError> for Error {
    fn from(_: alloc::collections::TryReserveError) -> Error {
        linux_err::ENOMEM
    }
}

impl From<core::convert::Infallible> for Error {
    fn from(e: core::convert::Infallible) -> Error {
        match e {}
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::{linux_err::*, Error};

    #[test]
    fn from_errno_keeps_valid_codes() {
        let err = Error::from_errno(-16);
        assert_eq!(err, EBUSY);
        assert_eq!(err.to_errno(), -16);
        assert_eq!(err.name(), Some("EBUSY"));
    }

    #[test]
    fn from_errno_rejects_out_of_range() {
        assert_eq!(Error::from_errno(0), EINVAL);
        assert_eq!(Error::from_errno(5), EINVAL);
        assert_eq!(Error::from_errno(-4096), EINVAL);
        assert_eq!(Error::from_errno(-4095).to_errno(), -4095);
    }

    #[test]
    fn to_result_splits_on_sign() {
        assert_eq!(Error::to_result(240), Ok(240));
        assert_eq!(Error::to_result(0), Ok(0));
        assert_eq!(Error::to_result(-12), Err(ENOMEM));
    }

    #[test]
    fn debug_uses_symbolic_name() {
        assert_eq!(format!("{:?}", ENODEV), "ENODEV");
        assert_eq!(format!("{:?}", Error::from_errno(-300)), "Error(300)");
        assert_eq!(format!("{}", EEXIST), "EEXIST (-17)");
    }
}
