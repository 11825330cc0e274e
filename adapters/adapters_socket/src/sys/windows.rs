//! Winsock platform layer

use crate::condition::{DnsCondition, ErrorMapping, GenericCondition, SystemCondition};
use crate::error::{SocketError, EOF_CODE};
use entities_network::{Endpoint, IpVersion, NetAddress};
use entities_utilities::{host_to_network, network_to_host};
use socket2::{SockAddr, Socket};
use std::io;
use std::mem;
use std::net::ToSocketAddrs;
use std::os::windows::io::{FromRawSocket, IntoRawSocket, RawSocket};
use std::sync::OnceLock;
use windows_sys::Win32::Networking::WinSock::*;

use GenericCondition::{Disconnected, NoDestination, NoResources};
use SystemCondition::*;

pub(crate) const SOMAXCONN: i32 = i32::MAX;
pub(crate) const INVALID_ARGUMENT: i32 = WSAEINVAL;
pub(crate) const OUT_OF_MEMORY: i32 = WSA_NOT_ENOUGH_MEMORY;
#[cfg(test)]
pub(crate) const CONNECTION_REFUSED: i32 = WSAECONNREFUSED;
#[cfg(test)]
pub(crate) const HOST_NOT_FOUND: i32 = WSAHOST_NOT_FOUND;
#[cfg(test)]
pub(crate) const BAD_DESCRIPTOR: i32 = WSAEBADF;

pub(crate) const IO_FLAGS: i32 = 0;

pub(crate) static SYSTEM_ERRORS: &[ErrorMapping] = &[
    ErrorMapping::system(0, Success),
    ErrorMapping::system(WSAEINVAL, InvalidArgument),
    ErrorMapping::system(WSAEACCES, PermissionDenied),
    ErrorMapping::system(WSAEWOULDBLOCK, TryAgain),
    ErrorMapping::grouped(WSAENOBUFS, OutOfMemory, NoResources),
    ErrorMapping::grouped(WSA_NOT_ENOUGH_MEMORY, OutOfMemory, NoResources),
    ErrorMapping::system(WSAEINPROGRESS, InProgress),
    ErrorMapping::system(WSAEALREADY, Already),
    ErrorMapping::system(WSAEINTR, Interrupted),
    ErrorMapping::grouped(WSAEMFILE, ProcessLimitReached, NoResources),
    ErrorMapping::grouped(WSAEPROCLIM, SystemLimitReached, NoResources),
    ErrorMapping::system(WSAEPROTONOSUPPORT, ProtocolNotSupported),
    ErrorMapping::system(WSAEAFNOSUPPORT, ProtocolNotSupported),
    ErrorMapping::grouped(WSAECONNREFUSED, ConnectionRefused, NoDestination),
    ErrorMapping::system(WSAEADDRINUSE, AlreadyInUse),
    ErrorMapping::system(WSAEADDRNOTAVAIL, AddressNotAvailable),
    ErrorMapping::grouped(WSAECONNABORTED, ConnectionAborted, Disconnected),
    ErrorMapping::grouped(WSAECONNRESET, ConnectionReset, Disconnected),
    ErrorMapping::grouped(WSAESHUTDOWN, Shutdown, Disconnected),
    ErrorMapping::grouped(WSAENETUNREACH, NetworkUnreachable, NoDestination),
    ErrorMapping::grouped(WSAEHOSTDOWN, HostDown, NoDestination),
    ErrorMapping::grouped(WSAEHOSTUNREACH, HostUnreachable, NoDestination),
    ErrorMapping::grouped(WSAETIMEDOUT, Timeout, NoDestination),
    ErrorMapping::grouped(WSAENOTCONN, NotConnected, Disconnected),
    ErrorMapping::grouped(WSAENETRESET, ConnectionReset, Disconnected),
    ErrorMapping::grouped(EOF_CODE, EndOfFile, Disconnected),
    ErrorMapping::system(WSAEFAULT, Unexpected),
    ErrorMapping::system(WSAEISCONN, Unexpected),
    ErrorMapping::system(WSAEBADF, Unexpected),
    ErrorMapping::system(WSAEPROTOTYPE, Unexpected),
    ErrorMapping::system(WSAENOTSOCK, Unexpected),
    ErrorMapping::system(WSAEOPNOTSUPP, Unexpected),
    ErrorMapping::system(WSANOTINITIALISED, Unexpected),
];

pub(crate) static DNS_ERRORS: &[ErrorMapping] = &[
    ErrorMapping::system(0, Success),
    ErrorMapping::dns(WSAHOST_NOT_FOUND, DnsCondition::HostNotFound),
    ErrorMapping::dns(WSATRY_AGAIN, DnsCondition::HostNotFoundTryAgain),
    ErrorMapping::dns(WSANO_DATA, DnsCondition::NoAddress),
    ErrorMapping::grouped(WSA_NOT_ENOUGH_MEMORY, OutOfMemory, NoResources),
    ErrorMapping::system(WSAEINVAL, Unexpected),
    ErrorMapping::system(WSATYPE_NOT_FOUND, Unexpected),
    ErrorMapping::system(WSAESOCKTNOSUPPORT, Unexpected),
    ErrorMapping::system(WSAEAFNOSUPPORT, Unexpected),
];

/// Start Winsock once per process
///
/// Cleanup is left to process exit; the subsystem stays up for as long as
/// any socket may exist.
pub(crate) fn ensure_initialized() -> Result<(), SocketError> {
    static STARTUP: OnceLock<i32> = OnceLock::new();
    let status = *STARTUP.get_or_init(|| {
        // SAFETY: WSADATA is plain data filled in by WSAStartup.
        let mut data: WSADATA = unsafe { mem::zeroed() };
        // MAKEWORD(2, 2)
        unsafe { WSAStartup(0x202, &mut data) }
    });
    if status == 0 {
        Ok(())
    } else {
        Err(SocketError::system(status))
    }
}

pub(crate) fn into_native(socket: Socket) -> RawSocket {
    socket.into_raw_socket()
}

/// # Safety
///
/// `handle` must be an open socket owned by the caller.
pub(crate) unsafe fn from_native(handle: RawSocket) -> Socket {
    Socket::from_raw_socket(handle)
}

/// Winsock never raises signals
pub(crate) fn suppress_sigpipe(_socket: &Socket) -> io::Result<()> {
    Ok(())
}

fn sockaddr_in(address: &NetAddress, port: u16) -> SOCKADDR_IN {
    // SAFETY: SOCKADDR_IN is plain data; all-zero is a valid value.
    let mut sin: SOCKADDR_IN = unsafe { mem::zeroed() };
    sin.sin_family = AF_INET;
    sin.sin_port = host_to_network(port);
    let mut octets = [0u8; 4];
    octets.copy_from_slice(address.as_bytes());
    sin.sin_addr.S_un.S_addr = u32::from_ne_bytes(octets);
    sin
}

fn sockaddr_in6(address: &NetAddress, port: u16) -> SOCKADDR_IN6 {
    // SAFETY: as above.
    let mut sin6: SOCKADDR_IN6 = unsafe { mem::zeroed() };
    sin6.sin6_family = AF_INET6;
    sin6.sin6_port = host_to_network(port);
    sin6.sin6_addr.u.Byte = address.octets();
    sin6
}

fn wrap<T>(native: T) -> io::Result<SockAddr> {
    // SAFETY: T is one of the SOCKADDR_IN* structs, which fit in the storage.
    let ((), addr) = unsafe {
        SockAddr::try_init(|storage, len| {
            storage.cast::<T>().write(native);
            *len = mem::size_of::<T>() as _;
            Ok(())
        })
    }?;
    Ok(addr)
}

/// Build the native address for `endpoint`
pub(crate) fn endpoint_to_sockaddr(endpoint: &Endpoint) -> Result<SockAddr, SocketError> {
    let addr = match endpoint.address.version() {
        Some(IpVersion::V4) => wrap(sockaddr_in(&endpoint.address, endpoint.port)),
        Some(IpVersion::V6) => wrap(sockaddr_in6(&endpoint.address, endpoint.port)),
        None => return Err(SocketError::system(WSAEINVAL)),
    };
    addr.map_err(SocketError::from)
}

/// Decode a native address, `Endpoint::INVALID` for other families
pub(crate) fn sockaddr_to_endpoint(addr: &SockAddr) -> Endpoint {
    if addr.is_ipv4() {
        // SAFETY: family checked; the storage holds a SOCKADDR_IN.
        let sin = unsafe { &*addr.as_ptr().cast::<SOCKADDR_IN>() };
        // SAFETY: every view of the IN_ADDR union is plain bytes.
        let raw = unsafe { sin.sin_addr.S_un.S_addr };
        Endpoint::new(
            NetAddress::from_bytes(&raw.to_ne_bytes()),
            network_to_host(sin.sin_port),
        )
    } else if addr.is_ipv6() {
        // SAFETY: family checked; the storage holds a SOCKADDR_IN6.
        let sin6 = unsafe { &*addr.as_ptr().cast::<SOCKADDR_IN6>() };
        // SAFETY: every view of the IN6_ADDR union is plain bytes.
        let raw = unsafe { sin6.sin6_addr.u.Byte };
        Endpoint::new(NetAddress::from_bytes(&raw), network_to_host(sin6.sin6_port))
    } else {
        Endpoint::INVALID
    }
}

/// Address that dissolves a datagram socket's association when connected to
///
/// Winsock rejects `AF_UNSPEC` here; the any-address of the socket's own
/// family with port 0 does the same job.
pub(crate) fn unspecified_sockaddr(v6: bool) -> SockAddr {
    let addr = if v6 {
        wrap(sockaddr_in6(&entities_network::ipv6::ANY, 0))
    } else {
        wrap(sockaddr_in(&entities_network::ipv4::ANY, 0))
    };
    addr.unwrap_or_else(|_| SockAddr::from(std::net::SocketAddr::from(([0, 0, 0, 0], 0))))
}

pub(crate) fn dns_message(code: i32) -> String {
    io::Error::from_raw_os_error(code).to_string()
}

/// Resolve `host` to addresses of `version` through the system resolver
pub(crate) fn resolve(version: IpVersion, host: &str) -> Result<Vec<NetAddress>, SocketError> {
    ensure_initialized()?;
    let found = (host, 0)
        .to_socket_addrs()
        .map_err(|err| {
            SocketError::dns(err.raw_os_error().unwrap_or(WSAHOST_NOT_FOUND)).observed()
        })?;

    let mut addresses = Vec::new();
    for addr in found {
        let address = NetAddress::from(addr.ip());
        if address.version() == Some(version) && !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    Ok(addresses)
}
