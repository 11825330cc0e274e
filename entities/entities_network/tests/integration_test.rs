//! Integration tests for entities_network crate
//!
//! These tests verify address and endpoint text round-trips.

use entities_network::*;
use proptest::prelude::*;

#[test]
fn test_endpoint_address_roundtrip() {
    for text in ["10.1.2.3:80", "[fe80::1]:443", "[2001:db8::ff]:65535", "0.0.0.0:1"] {
        let ep: Endpoint = text.parse().unwrap();
        assert_eq!(ep.to_string(), text);
    }
}

#[test]
fn test_endpoint_canonicalizes_v6() {
    let ep: Endpoint = "[0:0:0:0:0:0:0:1]:22".parse().unwrap();
    assert_eq!(ep.to_string(), "[::1]:22");
}

#[test]
fn test_parse_error_messages() {
    let err = "[::1]:".parse::<Endpoint>().unwrap_err();
    assert_eq!(err, AddressParseError::InvalidPort(String::new()));
    let err = NetAddress::parse("1.2.3", None).unwrap_err();
    assert_eq!(err.to_string(), "invalid IPv4 address: \"1.2.3\"");
}

proptest! {
    #[test]
    fn test_v4_bytes_roundtrip(octets in any::<[u8; 4]>()) {
        let addr = NetAddress::from_bytes(&octets);
        let parsed = NetAddress::parse(&addr.to_string(), None).unwrap();
        prop_assert_eq!(parsed, addr);
        prop_assert_eq!(parsed.version(), Some(IpVersion::V4));
    }

    #[test]
    fn test_v6_bytes_roundtrip(octets in any::<[u8; 16]>()) {
        let addr = NetAddress::from_bytes(&octets);
        let parsed = NetAddress::parse(&addr.to_string(), None).unwrap();
        prop_assert_eq!(parsed, addr);
        prop_assert_eq!(parsed.as_bytes(), &octets[..]);
    }

    #[test]
    fn test_endpoint_roundtrip(octets in any::<[u8; 4]>(), port in 1u16..) {
        let ep = Endpoint::new(NetAddress::v4(octets), port);
        prop_assert_eq!(ep.to_string().parse::<Endpoint>().unwrap(), ep);
    }
}
