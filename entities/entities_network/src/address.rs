//! Network Address Module
//!
//! Provides a single address type for IPv4 and IPv6.
//!
//! ## Overview
//!
//! `NetAddress` stores the version tag next to a 16-byte array in network
//! byte order. IPv4 addresses use the first 4 bytes and leave the rest
//! zeroed, so equality and hashing can always compare the full array.
//!
//! Parsing is strict: IPv4 octets with leading zeros, malformed `::`
//! compression and trailing characters are all rejected.
//!
//! ## See Also
//!
//! - [`crate::endpoint`]: address and port pairs

use crate::error::AddressParseError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Internet protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Family {
    V4,
    V6,
    Invalid,
}

/// IPv4 or IPv6 address, or the invalid sentinel
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetAddress {
    family: Family,
    bytes: [u8; 16],
}

/// Well-known IPv4 addresses
pub mod ipv4 {
    use super::NetAddress;

    /// `0.0.0.0`
    pub const ANY: NetAddress = NetAddress::v4([0, 0, 0, 0]);
    /// `255.255.255.255`
    pub const BROADCAST: NetAddress = NetAddress::v4([255, 255, 255, 255]);
    /// `127.0.0.1`
    pub const LOOPBACK: NetAddress = NetAddress::v4([127, 0, 0, 1]);
}

/// Well-known IPv6 addresses
pub mod ipv6 {
    use super::NetAddress;

    /// `::`
    pub const ANY: NetAddress = NetAddress::v6([0; 16]);
    /// All bits set
    pub const BROADCAST: NetAddress = NetAddress::v6([0xff; 16]);
    /// `::1`
    pub const LOOPBACK: NetAddress =
        NetAddress::v6([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
}

impl NetAddress {
    /// The invalid address
    pub const INVALID: NetAddress = NetAddress {
        family: Family::Invalid,
        bytes: [0; 16],
    };

    /// Build an IPv4 address from its four octets
    pub const fn v4(octets: [u8; 4]) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0] = octets[0];
        bytes[1] = octets[1];
        bytes[2] = octets[2];
        bytes[3] = octets[3];
        Self {
            family: Family::V4,
            bytes,
        }
    }

    /// Build an IPv6 address from its sixteen octets
    pub const fn v6(octets: [u8; 16]) -> Self {
        Self {
            family: Family::V6,
            bytes: octets,
        }
    }

    /// Build an address from raw network-order bytes
    ///
    /// # Arguments
    ///
    /// * `bytes` - Exactly 4 (IPv4) or 16 (IPv6) bytes
    ///
    /// # Returns
    ///
    /// The address. Any other length is a caller bug; it asserts in debug
    /// builds and yields [`NetAddress::INVALID`] otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
            return Self::v4(octets);
        }
        if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
            return Self::v6(octets);
        }
        debug_assert!(false, "address must be 4 or 16 bytes, got {}", bytes.len());
        Self::INVALID
    }

    /// Parse a textual address
    ///
    /// # Arguments
    ///
    /// * `text` - Dotted-quad IPv4 or textual IPv6 address
    /// * `assumed` - Version to parse as; inferred from the presence of `:` when `None`
    ///
    /// # Returns
    ///
    /// * `Ok(NetAddress)` - Parsed address
    /// * `Err(AddressParseError)` - Malformed text
    pub fn parse(text: &str, assumed: Option<IpVersion>) -> Result<Self, AddressParseError> {
        let version = assumed.unwrap_or(if text.contains(':') {
            IpVersion::V6
        } else {
            IpVersion::V4
        });

        match version {
            IpVersion::V4 => Ipv4Addr::from_str(text)
                .map(Self::from)
                .map_err(|_| AddressParseError::InvalidIpv4(text.to_owned())),
            IpVersion::V6 => Ipv6Addr::from_str(text)
                .map(Self::from)
                .map_err(|_| AddressParseError::InvalidIpv6(text.to_owned())),
        }
    }

    /// IP version, or `None` for the invalid address
    pub fn version(&self) -> Option<IpVersion> {
        match self.family {
            Family::V4 => Some(IpVersion::V4),
            Family::V6 => Some(IpVersion::V6),
            Family::Invalid => None,
        }
    }

    /// Whether this is the invalid sentinel
    pub fn is_invalid(&self) -> bool {
        self.family == Family::Invalid
    }

    /// Meaningful bytes in network order: 4 for IPv4, 16 for IPv6, none if invalid
    pub fn as_bytes(&self) -> &[u8] {
        match self.family {
            Family::V4 => &self.bytes[..4],
            Family::V6 => &self.bytes,
            Family::Invalid => &[],
        }
    }

    /// Full 16-byte storage, zero-padded for IPv4
    pub fn octets(&self) -> [u8; 16] {
        self.bytes
    }

    /// Convert to the standard library representation
    pub fn to_ip_addr(&self) -> Option<IpAddr> {
        match self.family {
            Family::V4 => Some(IpAddr::V4(Ipv4Addr::new(
                self.bytes[0],
                self.bytes[1],
                self.bytes[2],
                self.bytes[3],
            ))),
            Family::V6 => Some(IpAddr::V6(Ipv6Addr::from(self.bytes))),
            Family::Invalid => None,
        }
    }
}

impl Default for NetAddress {
    fn default() -> Self {
        Self::INVALID
    }
}

impl FromStr for NetAddress {
    type Err = AddressParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::parse(text, None)
    }
}

impl From<Ipv4Addr> for NetAddress {
    fn from(addr: Ipv4Addr) -> Self {
        Self::v4(addr.octets())
    }
}

impl From<Ipv6Addr> for NetAddress {
    fn from(addr: Ipv6Addr) -> Self {
        Self::v6(addr.octets())
    }
}

impl From<IpAddr> for NetAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

/// Canonical text form; IPv6 is printed compressed (`::1`)
///
/// Formatting the invalid address asserts in debug builds and prints
/// `<invalid>` otherwise.
impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_ip_addr() {
            Some(addr) => fmt::Display::fmt(&addr, f),
            None => {
                debug_assert!(false, "formatting the invalid address");
                f.write_str("<invalid>")
            }
        }
    }
}

impl fmt::Debug for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_ip_addr() {
            Some(addr) => write!(f, "NetAddress({addr})"),
            None => f.write_str("NetAddress(invalid)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_v4() {
        let addr = NetAddress::from_bytes(&[127, 0, 0, 1]);
        assert_eq!(addr.version(), Some(IpVersion::V4));
        assert_eq!(addr.as_bytes(), &[127, 0, 0, 1]);
        assert_eq!(addr, ipv4::LOOPBACK);
    }

    #[test]
    fn test_from_bytes_v6() {
        let mut bytes = [0u8; 16];
        bytes[15] = 1;
        let addr = NetAddress::from_bytes(&bytes);
        assert_eq!(addr.version(), Some(IpVersion::V6));
        assert_eq!(addr, ipv6::LOOPBACK);
    }

    #[test]
    fn test_parse_matches_bytes() {
        assert_eq!(
            NetAddress::parse("127.0.0.1", None).unwrap(),
            NetAddress::from_bytes(&[127, 0, 0, 1])
        );
        assert_eq!("::1".parse::<NetAddress>().unwrap(), ipv6::LOOPBACK);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in [
            "444.4422.22.223",
            "256.0.0.0",
            "0.0.0.0 trailing",
            "0..0.0",
            "leading0.0.0.0",
            "000.00.11.11",
            ":00::000:1",
            "",
        ] {
            assert!(NetAddress::parse(text, None).is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn test_parse_with_assumed_version() {
        assert!(matches!(
            NetAddress::parse("::1", Some(IpVersion::V4)),
            Err(AddressParseError::InvalidIpv4(_))
        ));
        assert!(matches!(
            NetAddress::parse("1.2.3.4", Some(IpVersion::V6)),
            Err(AddressParseError::InvalidIpv6(_))
        ));
        assert_eq!(
            NetAddress::parse("10.0.0.1", Some(IpVersion::V4)).unwrap(),
            NetAddress::v4([10, 0, 0, 1])
        );
    }

    #[test]
    fn test_versions_never_equal() {
        // Same leading bytes, different version.
        let v4 = NetAddress::v4([0, 0, 0, 0]);
        assert_ne!(v4, ipv6::ANY);
        assert_ne!(v4, NetAddress::INVALID);
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(ipv4::BROADCAST.to_string(), "255.255.255.255");
        assert_eq!(ipv6::LOOPBACK.to_string(), "::1");
        assert_eq!(ipv6::ANY.to_string(), "::");
        let addr: NetAddress = "2001:0db8:0000:0000:0000:0000:0000:0001".parse().unwrap();
        assert_eq!(addr.to_string(), "2001:db8::1");
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(NetAddress::INVALID.is_invalid());
        assert!(NetAddress::default().is_invalid());
        assert_eq!(NetAddress::INVALID.version(), None);
        assert!(NetAddress::INVALID.as_bytes().is_empty());
        assert_eq!(format!("{:?}", NetAddress::INVALID), "NetAddress(invalid)");
    }

    #[test]
    fn test_std_conversions() {
        let addr = NetAddress::from(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(addr, ipv4::LOOPBACK);
        assert_eq!(ipv6::LOOPBACK.to_ip_addr(), Some(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(NetAddress::INVALID.to_ip_addr(), None);
    }
}
