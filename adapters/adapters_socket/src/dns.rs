//! Name Resolution
//!
//! Resolves host names to addresses of a single IP version. Failures carry
//! resolver codes, which map through the DNS table (`HostNotFound`,
//! `NoAddress` and so on).

use crate::error::SocketError;
use crate::sys;
use entities_network::{IpVersion, NetAddress};
use tracing::debug;

/// Source of host name lookups
#[cfg_attr(test, mockall::automock)]
pub trait Resolver {
    /// Addresses of `version` registered for `host`, in resolver order
    fn resolve(&self, version: IpVersion, host: &str) -> Result<Vec<NetAddress>, SocketError>;
}

/// Resolver backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, version: IpVersion, host: &str) -> Result<Vec<NetAddress>, SocketError> {
        resolve(version, host)
    }
}

/// Look up `host` with the system resolver
///
/// # Arguments
///
/// * `version` - Only addresses of this version are returned
/// * `host` - Host name or numeric address
///
/// # Returns
///
/// * `Ok(Vec<NetAddress>)` - Distinct addresses in resolver order
/// * `Err(SocketError)` - Resolver failure
pub fn resolve(version: IpVersion, host: &str) -> Result<Vec<NetAddress>, SocketError> {
    let addresses = sys::resolve(version, host)?;
    debug!(host, ?version, count = addresses.len(), "resolved");
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::DnsCondition;
    use entities_network::{ipv4, ipv6};

    #[test]
    fn test_resolve_numeric() {
        let found = resolve(IpVersion::V4, "127.0.0.1").unwrap();
        assert_eq!(found, vec![ipv4::LOOPBACK]);
    }

    #[test]
    fn test_resolve_localhost_v4() {
        let found = resolve(IpVersion::V4, "localhost").unwrap();
        assert!(found.contains(&ipv4::LOOPBACK), "{found:?}");
        assert!(found.iter().all(|a| a.version() == Some(IpVersion::V4)));
    }

    #[test]
    fn test_resolve_numeric_v6() {
        let found = resolve(IpVersion::V6, "::1").unwrap();
        assert_eq!(found, vec![ipv6::LOOPBACK]);
    }

    #[test]
    fn test_resolve_unknown_host() {
        // The .invalid TLD is reserved and never resolves.
        let err = resolve(IpVersion::V4, "no-such-host.invalid").unwrap_err();
        assert!(
            err.is(DnsCondition::HostNotFound)
                || err.is(DnsCondition::NoAddress)
                || err.is(DnsCondition::HostNotFoundTryAgain),
            "{err}"
        );
    }

    #[test]
    fn test_mock_resolver() {
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .withf(|version, host| *version == IpVersion::V6 && host == "example")
            .returning(|_, _| Ok(vec![ipv6::LOOPBACK]));
        assert_eq!(
            resolver.resolve(IpVersion::V6, "example").unwrap(),
            vec![ipv6::LOOPBACK]
        );
    }
}
