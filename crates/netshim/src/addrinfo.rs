//! Address resolution (`getaddrinfo`) with owned results.
//!
//! The system primitive hands back a singly-linked list in memory it owns.
//! [`getaddrinfo_with`] copies every node into an [`AddrInfo`] value and then
//! releases the whole list once, through a guard, so no returned record ever
//! points into resolver memory.
//!
//! The primitives sit behind [`NetdbBackend`]; [`SystemNetdb`] forwards to libc.

use std::ffi::{CStr, c_char, c_int};
use std::mem::{self, size_of};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::ptr;

use crate::cstr::{opt_buffer, opt_ptr};
use crate::error::{Error, GaiError, Result};

/// Size of the opaque address payload (`struct sockaddr_storage`).
pub const SOCKADDR_STORAGE_LEN: usize = size_of::<libc::sockaddr_storage>();

// ---------------------------------------------------------------------------
// Platform seam
// ---------------------------------------------------------------------------

/// The pair of platform primitives the resolver is built on.
///
/// # Safety
///
/// Implementations must follow the POSIX contract: on a zero return `*res` is
/// the head of a null-terminated list (possibly null) that stays valid until it
/// is passed to [`NetdbBackend::freeaddrinfo`] on the same backend; on a
/// nonzero return nothing is allocated.
pub unsafe trait NetdbBackend {
    /// POSIX `getaddrinfo`.
    ///
    /// # Safety
    ///
    /// `node` and `service` are null or NUL-terminated, `hints` is null or
    /// points to an initialized `addrinfo`, `res` is writable.
    unsafe fn getaddrinfo(
        &self,
        node: *const c_char,
        service: *const c_char,
        hints: *const libc::addrinfo,
        res: *mut *mut libc::addrinfo,
    ) -> c_int;

    /// POSIX `freeaddrinfo`.
    ///
    /// # Safety
    ///
    /// `res` is a head produced by this backend's `getaddrinfo` (possibly
    /// null) and not yet freed.
    unsafe fn freeaddrinfo(&self, res: *mut libc::addrinfo);
}

/// The host C library's resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNetdb;

// SAFETY: forwards straight to the C library, which implements the contract.
unsafe impl NetdbBackend for SystemNetdb {
    unsafe fn getaddrinfo(
        &self,
        node: *const c_char,
        service: *const c_char,
        hints: *const libc::addrinfo,
        res: *mut *mut libc::addrinfo,
    ) -> c_int {
        // SAFETY: arguments satisfy the trait contract.
        unsafe { libc::getaddrinfo(node, service, hints, res) }
    }

    unsafe fn freeaddrinfo(&self, res: *mut libc::addrinfo) {
        // Some C libraries crash on a null list.
        if res.is_null() {
            return;
        }
        // SAFETY: res came from libc::getaddrinfo and is freed once.
        unsafe { libc::freeaddrinfo(res) }
    }
}

// ---------------------------------------------------------------------------
// Hints
// ---------------------------------------------------------------------------

/// Constraints passed to the resolver (`ai_flags`, `ai_family`,
/// `ai_socktype`, `ai_protocol`).
///
/// The default asks for any family, any socket type, no flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddrInfoHints {
    pub flags: c_int,
    pub family: c_int,
    pub socktype: c_int,
    pub protocol: c_int,
}

impl AddrInfoHints {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags: 0,
            family: libc::AF_UNSPEC,
            socktype: 0,
            protocol: 0,
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: c_int) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub const fn with_family(mut self, family: c_int) -> Self {
        self.family = family;
        self
    }

    #[must_use]
    pub const fn with_socktype(mut self, socktype: c_int) -> Self {
        self.socktype = socktype;
        self
    }

    #[must_use]
    pub const fn with_protocol(mut self, protocol: c_int) -> Self {
        self.protocol = protocol;
        self
    }

    fn to_raw(self) -> libc::addrinfo {
        // SAFETY: addrinfo is plain data; all-zero means null pointers and
        // zero integers.
        let mut raw: libc::addrinfo = unsafe { mem::zeroed() };
        raw.ai_flags = self.flags;
        raw.ai_family = self.family;
        raw.ai_socktype = self.socktype;
        raw.ai_protocol = self.protocol;
        raw
    }
}

// ---------------------------------------------------------------------------
// Owned records
// ---------------------------------------------------------------------------

/// Byte copy of a resolved socket address.
///
/// Sized for any address layout; `len` is the number of meaningful bytes as
/// reported by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SockAddrBytes {
    bytes: [u8; SOCKADDR_STORAGE_LEN],
    len: usize,
}

impl SockAddrBytes {
    const EMPTY: Self = Self {
        bytes: [0; SOCKADDR_STORAGE_LEN],
        len: 0,
    };

    /// Copy `addrlen` bytes (clamped to the storage size) from `addr`.
    ///
    /// # Safety
    ///
    /// `addr` is null or readable for `addrlen` bytes.
    unsafe fn copy_from(addr: *const libc::sockaddr, addrlen: libc::socklen_t) -> Self {
        let len = (addrlen as usize).min(SOCKADDR_STORAGE_LEN);
        if addr.is_null() || len == 0 {
            return Self::EMPTY;
        }
        let mut out = Self::EMPTY;
        // SAFETY: source readable for len bytes by contract, destination is
        // SOCKADDR_STORAGE_LEN >= len bytes, the regions are distinct.
        unsafe { ptr::copy_nonoverlapping(addr.cast::<u8>(), out.bytes.as_mut_ptr(), len) };
        out.len = len;
        out
    }

    /// The meaningful bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn storage(&self) -> libc::sockaddr_storage {
        // SAFETY: `bytes` is exactly sockaddr_storage-sized and any bit
        // pattern is a valid sockaddr_storage; the read tolerates alignment.
        unsafe { ptr::read_unaligned(self.bytes.as_ptr().cast::<libc::sockaddr_storage>()) }
    }

    /// Address family stored in the payload (`AF_UNSPEC` when empty).
    #[must_use]
    pub fn family(&self) -> c_int {
        if self.len == 0 {
            return libc::AF_UNSPEC;
        }
        c_int::from(self.storage().ss_family)
    }

    /// Decode IPv4/IPv6 payloads; `None` for other families or short payloads.
    #[must_use]
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        match self.family() {
            libc::AF_INET if self.len >= size_of::<libc::sockaddr_in>() => {
                // SAFETY: length checked above; plain data, unaligned read.
                let sin = unsafe {
                    ptr::read_unaligned(self.bytes.as_ptr().cast::<libc::sockaddr_in>())
                };
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                let port = u16::from_be(sin.sin_port);
                Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
            }
            libc::AF_INET6 if self.len >= size_of::<libc::sockaddr_in6>() => {
                // SAFETY: length checked above; plain data, unaligned read.
                let sin6 = unsafe {
                    ptr::read_unaligned(self.bytes.as_ptr().cast::<libc::sockaddr_in6>())
                };
                let ip = Ipv6Addr::from(sin6.sin6_addr.s6_addr);
                let port = u16::from_be(sin6.sin6_port);
                Some(SocketAddr::V6(SocketAddrV6::new(
                    ip,
                    port,
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                )))
            }
            _ => None,
        }
    }
}

/// One resolved address, owned and independent of resolver memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    flags: c_int,
    family: c_int,
    socktype: c_int,
    protocol: c_int,
    canonname: Option<String>,
    addr: SockAddrBytes,
}

impl AddrInfo {
    /// Copy a foreign node.
    ///
    /// # Safety
    ///
    /// `ai_addr` and `ai_canonname` of `node` are null or valid for reads
    /// (`ai_addrlen` bytes / up to a NUL respectively).
    unsafe fn copy_from(node: &libc::addrinfo) -> Self {
        // SAFETY: forwarded from the caller.
        let addr = unsafe { SockAddrBytes::copy_from(node.ai_addr, node.ai_addrlen) };
        let canonname = if node.ai_canonname.is_null() {
            None
        } else {
            // SAFETY: non-null canonical names are NUL-terminated by contract.
            let name = unsafe { CStr::from_ptr(node.ai_canonname) };
            Some(name.to_string_lossy().into_owned())
        };
        Self {
            flags: node.ai_flags,
            family: node.ai_family,
            socktype: node.ai_socktype,
            protocol: node.ai_protocol,
            canonname,
            addr,
        }
    }

    #[must_use]
    pub const fn flags(&self) -> c_int {
        self.flags
    }

    #[must_use]
    pub const fn family(&self) -> c_int {
        self.family
    }

    #[must_use]
    pub const fn socktype(&self) -> c_int {
        self.socktype
    }

    #[must_use]
    pub const fn protocol(&self) -> c_int {
        self.protocol
    }

    /// Canonical host name, present when requested with `AI_CANONNAME`.
    #[must_use]
    pub fn canonname(&self) -> Option<&str> {
        self.canonname.as_deref()
    }

    #[must_use]
    pub const fn addr(&self) -> &SockAddrBytes {
        &self.addr
    }

    /// Shorthand for `self.addr().to_socket_addr()`.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.addr.to_socket_addr()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A list returned by a successful backend call, freed exactly once when
/// dropped.
struct ForeignList<'b, B: NetdbBackend + ?Sized> {
    head: *mut libc::addrinfo,
    backend: &'b B,
}

impl<B: NetdbBackend + ?Sized> ForeignList<'_, B> {
    fn copy_out(&self) -> Vec<AddrInfo> {
        let mut records = Vec::new();
        let mut cur = self.head.cast_const();
        while !cur.is_null() {
            // SAFETY: cur is a live node of the list; it is freed only when
            // self is dropped.
            let node = unsafe { &*cur };
            // SAFETY: node fields follow the getaddrinfo contract.
            records.push(unsafe { AddrInfo::copy_from(node) });
            cur = node.ai_next;
        }
        records
    }
}

impl<B: NetdbBackend + ?Sized> Drop for ForeignList<'_, B> {
    fn drop(&mut self) {
        // Released once per successful call, even when the list is empty.
        // SAFETY: head came from backend.getaddrinfo and is freed once here.
        unsafe { self.backend.freeaddrinfo(self.head) };
    }
}

/// Resolve `host` and/or `service` with the system resolver.
///
/// At least one of `host` and `service` must be present. Records come back in
/// the order the resolver produced them. Blocks the calling thread.
pub fn getaddrinfo(
    host: Option<&str>,
    service: Option<&str>,
    hints: &AddrInfoHints,
) -> Result<Vec<AddrInfo>> {
    getaddrinfo_with(&SystemNetdb, host, service, hints)
}

/// [`getaddrinfo`] over an explicit backend.
pub fn getaddrinfo_with<B: NetdbBackend + ?Sized>(
    backend: &B,
    host: Option<&str>,
    service: Option<&str>,
    hints: &AddrInfoHints,
) -> Result<Vec<AddrInfo>> {
    if host.is_none() && service.is_none() {
        return Err(Error::parameter("host and service cannot both be absent"));
    }

    let host_buf = opt_buffer(host, "host")?;
    let service_buf = opt_buffer(service, "service")?;
    let raw_hints = hints.to_raw();
    let mut head: *mut libc::addrinfo = ptr::null_mut();

    // SAFETY: buffers are NUL-terminated and outlive the call, hints is an
    // initialized addrinfo, head is writable.
    let rc = unsafe {
        backend.getaddrinfo(
            opt_ptr(host_buf.as_ref()),
            opt_ptr(service_buf.as_ref()),
            &raw_hints,
            &mut head,
        )
    };
    if rc != 0 {
        return Err(Error::ResolutionFailed(GaiError::from_last_call(rc)));
    }

    let list = ForeignList { head, backend };
    let records = list.copy_out();
    drop(list);
    Ok(records)
}
