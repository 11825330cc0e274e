//! Entities Layer: Network
//!
//! Version-agnostic network addressing:
//! - `NetAddress`: IPv4 or IPv6 address in a fixed 16-byte representation
//! - `Endpoint`: address and port pair with `ip:port` / `[ipv6]:port` text forms

pub mod address;
pub mod endpoint;
pub mod error;

pub use address::{ipv4, ipv6, IpVersion, NetAddress};
pub use endpoint::Endpoint;
pub use error::AddressParseError;
