//! # netshim
//!
//! Thin, safe wrappers over host/network primitives of the C library:
//! `getaddrinfo`, `gethostname`, `sethostname`, byte-order conversion and
//! C-string marshalling.
//!
//! Every call is synchronous and blocks the calling thread. Failures come back
//! as typed [`Error`] values; nothing here logs or retries.
//!
//! ```no_run
//! use netshim::{AddrInfoHints, getaddrinfo};
//!
//! let records = getaddrinfo(Some("localhost"), None, &AddrInfoHints::default())?;
//! for record in &records {
//!     println!("{:?}", record.socket_addr());
//! }
//! # Ok::<(), netshim::Error>(())
//! ```

#![allow(clippy::missing_safety_doc)]

pub mod addrinfo;
pub mod cstr;
pub mod error;
pub mod hostname;
pub mod inet;

pub use addrinfo::{
    AddrInfo, AddrInfoHints, NetdbBackend, SOCKADDR_STORAGE_LEN, SockAddrBytes, SystemNetdb,
    getaddrinfo, getaddrinfo_with,
};
pub use error::{Errno, Error, GaiError, Result};
pub use hostname::{gethostname, max_hostname_len, sethostname};
pub use inet::{htonl, htons, ntohl, ntohs, swap16};
