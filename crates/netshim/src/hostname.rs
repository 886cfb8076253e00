//! Host name get/set (`<unistd.h>`).

use std::ffi::c_char;

use crate::cstr::{CBuffer, from_c_buffer};
use crate::error::{Errno, Error, Result};

/// `_POSIX_HOST_NAME_MAX`, used when the system limit is indeterminate.
pub const POSIX_HOST_NAME_MAX: usize = 255;

/// Maximum host name length in bytes, excluding the NUL terminator.
#[must_use]
pub fn max_hostname_len() -> usize {
    // SAFETY: sysconf only reads system configuration.
    let n = unsafe { libc::sysconf(libc::_SC_HOST_NAME_MAX) };
    usize::try_from(n)
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(POSIX_HOST_NAME_MAX)
}

/// Current host name.
///
/// `Ok(None)` when the name is empty or not valid UTF-8.
pub fn gethostname() -> Result<Option<String>> {
    let mut buf = vec![0u8; max_hostname_len() + 1];

    // SAFETY: buf is writable for buf.len() bytes.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<c_char>(), buf.len() as _) };
    if rc != 0 {
        return Err(Error::GetHostNameFailed(Errno::last()));
    }

    // Truncated names are not guaranteed to be terminated.
    if let Some(last) = buf.last_mut() {
        *last = 0;
    }
    Ok(decode_hostname(from_c_buffer(&buf)))
}

fn decode_hostname(raw: &[u8]) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    std::str::from_utf8(raw).ok().map(str::to_owned)
}

/// Set the host name. Usually requires privileges (`EPERM` otherwise).
pub fn sethostname(name: &str) -> Result<()> {
    let max = max_hostname_len();
    if name.len() > max {
        return Err(Error::parameter(format!(
            "host name is {} bytes, limit is {max}",
            name.len()
        )));
    }
    let buf = CBuffer::new(name, "host name")?;

    // SAFETY: buf is readable for buf.len() bytes.
    let rc = unsafe { libc::sethostname(buf.as_ptr(), buf.len() as _) };
    if rc != 0 {
        return Err(Error::SetHostnameFailed(Errno::last()));
    }
    Ok(())
}
