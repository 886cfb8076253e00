//! Error taxonomy for the netdb/unistd shims.
//!
//! Two numeric error spaces cross this boundary and they are kept apart:
//! - [`GaiError`]: `EAI_*` codes returned by `getaddrinfo`, rendered with
//!   `gai_strerror`.
//! - [`Errno`]: `errno` values set by `gethostname`/`sethostname`, rendered with
//!   the OS `strerror` family.

use std::ffi::{CStr, c_int};
use std::fmt;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a shim call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid argument combination, detected before any system call.
    #[error("invalid parameter: {0}")]
    Parameter(String),
    /// `getaddrinfo` returned a nonzero code.
    #[error("getaddrinfo failed: {0}")]
    ResolutionFailed(GaiError),
    /// `gethostname` returned nonzero.
    #[error("gethostname failed: {0}")]
    GetHostNameFailed(Errno),
    /// `sethostname` returned nonzero.
    #[error("sethostname failed: {0}")]
    SetHostnameFailed(Errno),
}

impl Error {
    pub(crate) fn parameter(message: impl Into<String>) -> Self {
        Self::Parameter(message.into())
    }
}

/// An `EAI_*` code from `getaddrinfo`.
///
/// For `EAI_SYSTEM` the thread's `errno` at the time of the failure is kept in
/// `os_errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaiError {
    code: c_int,
    os_errno: Option<Errno>,
}

impl GaiError {
    /// Wrap a raw resolver code.
    #[must_use]
    pub const fn new(code: c_int) -> Self {
        Self {
            code,
            os_errno: None,
        }
    }

    /// Wrap a raw resolver code, capturing `errno` when the code is `EAI_SYSTEM`.
    ///
    /// Must be called right after the failing call, before anything else can
    /// overwrite `errno`.
    #[must_use]
    pub fn from_last_call(code: c_int) -> Self {
        let os_errno = if code == libc::EAI_SYSTEM {
            Some(Errno::last())
        } else {
            None
        };
        Self { code, os_errno }
    }

    /// The raw `EAI_*` code.
    #[must_use]
    pub const fn code(&self) -> c_int {
        self.code
    }

    /// `errno` captured alongside an `EAI_SYSTEM` failure.
    #[must_use]
    pub const fn os_errno(&self) -> Option<Errno> {
        self.os_errno
    }

    /// Whether the resolver reported a temporary failure (`EAI_AGAIN`).
    ///
    /// Nothing in this crate retries; callers decide.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.code == libc::EAI_AGAIN
    }

    /// Resolver-specific description of the code.
    #[must_use]
    pub fn description(&self) -> String {
        // SAFETY: gai_strerror accepts any code and returns a pointer to a
        // static, NUL-terminated string.
        let msg = unsafe { CStr::from_ptr(libc::gai_strerror(self.code)) };
        msg.to_string_lossy().into_owned()
    }
}

impl fmt::Display for GaiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.code)?;
        if let Some(errno) = self.os_errno {
            write!(f, ": {errno}")?;
        }
        Ok(())
    }
}

/// An `errno` value from a `<unistd.h>` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub c_int);

impl Errno {
    /// Read the calling thread's `errno`.
    #[must_use]
    pub fn last() -> Self {
        Self(std::io::Error::last_os_error().raw_os_error().unwrap_or(0))
    }

    /// The raw `errno` value.
    #[must_use]
    pub const fn code(self) -> c_int {
        self.0
    }

    /// OS description of the value (`strerror` family).
    #[must_use]
    pub fn description(self) -> String {
        std::io::Error::from_raw_os_error(self.0).to_string()
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
