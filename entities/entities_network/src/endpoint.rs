//! Endpoint Module
//!
//! An endpoint is an address plus a port. Text forms are `A.B.C.D:port`
//! for IPv4 and `[addr]:port` for IPv6; both parse and print the same way.
//! Port 0 marks an endpoint as unset.

use crate::address::{IpVersion, NetAddress};
use crate::error::AddressParseError;
use std::fmt;
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::str::FromStr;

/// Shortest text that can still be an endpoint: `[::]:1`
const MIN_TEXT_LEN: usize = 6;

/// Address and port pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Endpoint {
    /// Host address
    pub address: NetAddress,
    /// Port in host byte order, 0 when unset
    pub port: u16,
}

impl Endpoint {
    /// The invalid endpoint
    pub const INVALID: Endpoint = Endpoint {
        address: NetAddress::INVALID,
        port: 0,
    };

    /// Create an endpoint
    pub const fn new(address: NetAddress, port: u16) -> Self {
        Self { address, port }
    }

    /// Whether the address is invalid or the port is unset
    pub fn is_invalid(&self) -> bool {
        self.address.is_invalid() || self.port == 0
    }

    /// IP version of the address, `None` for the invalid address
    pub fn version(&self) -> Option<IpVersion> {
        self.address.version()
    }

    /// Convert to the standard library representation
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.address
            .to_ip_addr()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

fn parse_port(text: &str) -> Result<u16, AddressParseError> {
    let invalid = || AddressParseError::InvalidPort(text.to_owned());
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match text.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(port) => Ok(port),
    }
}

fn parse_host(text: &str, version: IpVersion) -> Result<NetAddress, AddressParseError> {
    NetAddress::parse(text, Some(version))
        .map_err(|_| AddressParseError::InvalidAddress(text.to_owned()))
}

impl FromStr for Endpoint {
    type Err = AddressParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || AddressParseError::InvalidEndpoint(text.to_owned());
        if text.len() < MIN_TEXT_LEN {
            return Err(malformed());
        }

        let (address, port) = if let Some(rest) = text.strip_prefix('[') {
            let close = rest.find(']').ok_or_else(malformed)?;
            let port = rest[close + 1..].strip_prefix(':').ok_or_else(malformed)?;
            (parse_host(&rest[..close], IpVersion::V6)?, port)
        } else if text.starts_with(|c: char| c.is_ascii_digit()) {
            let colon = text.find(':').ok_or_else(malformed)?;
            (parse_host(&text[..colon], IpVersion::V4)?, &text[colon + 1..])
        } else {
            return Err(malformed());
        };

        Ok(Self::new(address, parse_port(port)?))
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().into(), addr.port())
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new((*addr.ip()).into(), addr.port())
    }
}

impl From<SocketAddrV6> for Endpoint {
    fn from(addr: SocketAddrV6) -> Self {
        Self::new((*addr.ip()).into(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address.version() {
            Some(IpVersion::V6) => write!(f, "[{}]:{}", self.address, self.port),
            _ => write!(f, "{}:{}", self.address, self.port),
        }
    }
}
