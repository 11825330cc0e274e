//! Byte Order Conversion
//!
//! Flips 16- and 32-bit integers between host and network (big endian)
//! byte order. The host order is probed once per process and cached.

use std::sync::OnceLock;

/// Integers whose byte order can be reversed
pub trait FlipEndian: Copy {
    /// Reverse the byte order
    fn flip(self) -> Self;
}

impl FlipEndian for u16 {
    fn flip(self) -> Self {
        self.swap_bytes()
    }
}

impl FlipEndian for u32 {
    fn flip(self) -> Self {
        self.swap_bytes()
    }
}

/// Reverse the byte order of `value`
pub fn flip<T: FlipEndian>(value: T) -> T {
    value.flip()
}

/// Whether the host already stores integers in network byte order
pub fn host_is_network() -> bool {
    static HOST_IS_NETWORK: OnceLock<bool> = OnceLock::new();
    *HOST_IS_NETWORK.get_or_init(|| 1u16.to_ne_bytes() == 1u16.to_be_bytes())
}

/// Convert `value` from host to network byte order
pub fn host_to_network<T: FlipEndian>(value: T) -> T {
    if host_is_network() {
        value
    } else {
        value.flip()
    }
}

/// Convert `value` from network to host byte order
pub fn network_to_host<T: FlipEndian>(value: T) -> T {
    // The conversion is its own inverse.
    host_to_network(value)
}
