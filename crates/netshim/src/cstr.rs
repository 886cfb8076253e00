//! C-string marshalling helpers.

use std::ffi::{CString, c_char};
use std::ptr;

use crate::error::{Error, Result};

/// Owned, NUL-terminated copy of a Rust string, alive for one foreign call.
///
/// Released by `Drop` on every exit path.
#[derive(Debug)]
pub struct CBuffer {
    inner: CString,
}

impl CBuffer {
    /// Marshal `text` for a C call. `what` names the argument in errors.
    pub fn new(text: &str, what: &str) -> Result<Self> {
        let inner = CString::new(text)
            .map_err(|_| Error::parameter(format!("{what} contains an interior NUL byte")))?;
        Ok(Self { inner })
    }

    /// Length in bytes, excluding the terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pointer valid for as long as `self` is alive.
    #[must_use]
    pub fn as_ptr(&self) -> *const c_char {
        self.inner.as_ptr()
    }

    /// Bytes including the trailing NUL.
    #[must_use]
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.inner.as_bytes_with_nul()
    }
}

/// Marshal an optional argument.
pub fn opt_buffer(text: Option<&str>, what: &str) -> Result<Option<CBuffer>> {
    text.map(|t| CBuffer::new(t, what)).transpose()
}

/// Pointer for an optional buffer; null when absent.
#[must_use]
pub fn opt_ptr(buf: Option<&CBuffer>) -> *const c_char {
    buf.map_or(ptr::null(), CBuffer::as_ptr)
}

/// Bytes of a C buffer up to (not including) the first NUL.
#[must_use]
pub fn from_c_buffer(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == 0) {
        Some(end) => &buf[..end],
        None => buf,
    }
}
