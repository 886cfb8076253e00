//! Byte-order helpers.
//!
//! Network byte order is big-endian. `swap16` always swaps; the `hton*`/`ntoh*`
//! family only swaps on little-endian hosts.

/// Swaps the two bytes of a 16-bit value.
#[inline]
#[must_use]
pub const fn swap16(v: u16) -> u16 {
    v.swap_bytes()
}

/// Host to network order, 16 bits. Equivalent to C `htons`.
#[inline]
#[must_use]
pub const fn htons(v: u16) -> u16 {
    v.to_be()
}

/// Host to network order, 32 bits. Equivalent to C `htonl`.
#[inline]
#[must_use]
pub const fn htonl(v: u32) -> u32 {
    v.to_be()
}

/// Network to host order, 16 bits. Equivalent to C `ntohs`.
#[inline]
#[must_use]
pub const fn ntohs(v: u16) -> u16 {
    u16::from_be(v)
}

/// Network to host order, 32 bits. Equivalent to C `ntohl`.
#[inline]
#[must_use]
pub const fn ntohl(v: u32) -> u32 {
    u32::from_be(v)
}
