//! Address Parsing Errors

use thiserror::Error;

/// Reasons an address or endpoint string was rejected
///
/// Each variant carries the rejected text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// Not a dotted-quad IPv4 address
    #[error("invalid IPv4 address: {0:?}")]
    InvalidIpv4(String),
    /// Not a textual IPv6 address
    #[error("invalid IPv6 address: {0:?}")]
    InvalidIpv6(String),
    /// Address part of an endpoint could not be parsed
    #[error("invalid address in endpoint: {0:?}")]
    InvalidAddress(String),
    /// Endpoint text does not have the `ip:port` or `[ipv6]:port` shape
    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),
    /// Port is empty, non-numeric, zero or above 65535
    #[error("invalid port: {0:?}")]
    InvalidPort(String),
}
