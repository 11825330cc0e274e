//! POSIX platform layer

use crate::condition::{DnsCondition, ErrorMapping, GenericCondition, SystemCondition};
use crate::error::{SocketError, EOF_CODE};
use entities_network::{Endpoint, IpVersion, NetAddress};
use entities_utilities::{host_to_network, network_to_host};
use socket2::{SockAddr, Socket};
use std::ffi::{CStr, CString};
use std::mem;
use std::os::unix::io::{FromRawFd, IntoRawFd, RawFd};
use std::ptr;

use GenericCondition::{Disconnected, NoDestination, NoResources};
use SystemCondition::*;

pub(crate) const SOMAXCONN: i32 = libc::SOMAXCONN;
pub(crate) const INVALID_ARGUMENT: i32 = libc::EINVAL;
pub(crate) const OUT_OF_MEMORY: i32 = libc::ENOMEM;
#[cfg(test)]
pub(crate) const CONNECTION_REFUSED: i32 = libc::ECONNREFUSED;
#[cfg(test)]
pub(crate) const HOST_NOT_FOUND: i32 = libc::EAI_NONAME;
#[cfg(test)]
pub(crate) const BAD_DESCRIPTOR: i32 = libc::EBADF;

// Apple platforms have no MSG_NOSIGNAL; SO_NOSIGPIPE is set on allocation instead.
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
pub(crate) const IO_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
pub(crate) const IO_FLAGS: libc::c_int = 0;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        // glibc and musl values, not exported by every libc build.
        const EAI_ADDRFAMILY: i32 = -9;
        const EAI_NODATA: i32 = -5;
    } else if #[cfg(any(target_vendor = "apple", target_os = "android"))] {
        const EAI_ADDRFAMILY: i32 = 1;
        const EAI_NODATA: i32 = 7;
    }
}

pub(crate) static SYSTEM_ERRORS: &[ErrorMapping] = &[
    ErrorMapping::system(0, Success),
    ErrorMapping::system(libc::EINVAL, InvalidArgument),
    ErrorMapping::system(libc::EACCES, PermissionDenied),
    ErrorMapping::system(libc::EPERM, OperationNotPermitted),
    ErrorMapping::system(libc::EAGAIN, TryAgain),
    ErrorMapping::system(libc::EWOULDBLOCK, TryAgain),
    ErrorMapping::grouped(libc::ENOBUFS, OutOfMemory, NoResources),
    ErrorMapping::grouped(libc::ENOMEM, OutOfMemory, NoResources),
    ErrorMapping::system(libc::EINPROGRESS, InProgress),
    ErrorMapping::system(libc::EALREADY, Already),
    ErrorMapping::system(libc::EINTR, Interrupted),
    ErrorMapping::grouped(libc::EMFILE, ProcessLimitReached, NoResources),
    ErrorMapping::grouped(libc::ENFILE, SystemLimitReached, NoResources),
    ErrorMapping::system(libc::EPROTONOSUPPORT, ProtocolNotSupported),
    ErrorMapping::system(libc::EAFNOSUPPORT, ProtocolNotSupported),
    ErrorMapping::grouped(libc::ECONNREFUSED, ConnectionRefused, NoDestination),
    ErrorMapping::system(libc::EADDRINUSE, AlreadyInUse),
    ErrorMapping::system(libc::EADDRNOTAVAIL, AddressNotAvailable),
    ErrorMapping::grouped(libc::ECONNABORTED, ConnectionAborted, Disconnected),
    ErrorMapping::grouped(libc::ECONNRESET, ConnectionReset, Disconnected),
    ErrorMapping::grouped(libc::EPIPE, BrokenPipe, Disconnected),
    ErrorMapping::grouped(libc::ESHUTDOWN, Shutdown, Disconnected),
    ErrorMapping::grouped(libc::ENETUNREACH, NetworkUnreachable, NoDestination),
    ErrorMapping::grouped(libc::EHOSTDOWN, HostDown, NoDestination),
    ErrorMapping::grouped(libc::EHOSTUNREACH, HostUnreachable, NoDestination),
    ErrorMapping::grouped(libc::ETIMEDOUT, Timeout, NoDestination),
    ErrorMapping::grouped(libc::ENOTCONN, NotConnected, Disconnected),
    ErrorMapping::grouped(EOF_CODE, EndOfFile, Disconnected),
    ErrorMapping::system(libc::EFAULT, Unexpected),
    ErrorMapping::system(libc::EISCONN, Unexpected),
    ErrorMapping::system(libc::EBADF, Unexpected),
    ErrorMapping::system(libc::EPROTOTYPE, Unexpected),
    ErrorMapping::system(libc::ENOTSOCK, Unexpected),
    ErrorMapping::system(libc::EOPNOTSUPP, Unexpected),
];

pub(crate) static DNS_ERRORS: &[ErrorMapping] = &[
    ErrorMapping::system(0, Success),
    ErrorMapping::dns(libc::EAI_NONAME, DnsCondition::HostNotFound),
    ErrorMapping::dns(libc::EAI_AGAIN, DnsCondition::HostNotFoundTryAgain),
    #[cfg(any(target_os = "linux", target_os = "android", target_vendor = "apple"))]
    ErrorMapping::dns(EAI_NODATA, DnsCondition::NoAddress),
    #[cfg(any(target_os = "linux", target_os = "android", target_vendor = "apple"))]
    ErrorMapping::dns(EAI_ADDRFAMILY, DnsCondition::NoAddress),
    ErrorMapping::grouped(libc::EAI_MEMORY, OutOfMemory, NoResources),
    ErrorMapping::system(libc::EAI_BADFLAGS, Unexpected),
    ErrorMapping::system(libc::EAI_SERVICE, Unexpected),
    ErrorMapping::system(libc::EAI_SOCKTYPE, Unexpected),
    ErrorMapping::system(libc::EAI_FAMILY, Unexpected),
];

/// Process-wide start-up; POSIX sockets need none
pub(crate) fn ensure_initialized() -> Result<(), SocketError> {
    Ok(())
}

pub(crate) fn into_native(socket: Socket) -> RawFd {
    socket.into_raw_fd()
}

/// # Safety
///
/// `handle` must be an open socket descriptor owned by the caller.
pub(crate) unsafe fn from_native(handle: RawFd) -> Socket {
    Socket::from_raw_fd(handle)
}

/// Disable SIGPIPE for writes on `socket` where a per-socket option exists
#[cfg(target_vendor = "apple")]
pub(crate) fn suppress_sigpipe(socket: &Socket) -> std::io::Result<()> {
    socket.set_nosigpipe(true)
}

#[cfg(not(target_vendor = "apple"))]
pub(crate) fn suppress_sigpipe(_socket: &Socket) -> std::io::Result<()> {
    // Handled per call through IO_FLAGS.
    Ok(())
}

/// Build the native address for `endpoint`
pub(crate) fn endpoint_to_sockaddr(endpoint: &Endpoint) -> Result<SockAddr, SocketError> {
    // SAFETY: sockaddr_storage is plain data; all-zero is a valid value.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let len = match endpoint.address.version() {
        Some(IpVersion::V4) => {
            // SAFETY: sockaddr_storage is large and aligned enough for any sockaddr.
            let sin = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in) };
            sin.sin_family = libc::AF_INET as libc::sa_family_t;
            sin.sin_port = host_to_network(endpoint.port);
            let mut octets = [0u8; 4];
            octets.copy_from_slice(endpoint.address.as_bytes());
            sin.sin_addr.s_addr = u32::from_ne_bytes(octets);
            mem::size_of::<libc::sockaddr_in>()
        }
        Some(IpVersion::V6) => {
            // SAFETY: as above.
            let sin6 = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in6) };
            sin6.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            sin6.sin6_port = host_to_network(endpoint.port);
            sin6.sin6_addr.s6_addr = endpoint.address.octets();
            mem::size_of::<libc::sockaddr_in6>()
        }
        None => return Err(SocketError::system(libc::EINVAL)),
    };
    set_sockaddr_len(&mut storage, len);
    // SAFETY: storage holds a sockaddr of `len` bytes initialized above.
    Ok(unsafe { SockAddr::new(storage, len as libc::socklen_t) })
}

#[cfg(any(
    target_vendor = "apple",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd",
    target_os = "netbsd"
))]
fn set_sockaddr_len(storage: &mut libc::sockaddr_storage, len: usize) {
    storage.ss_len = len as u8;
}

#[cfg(not(any(
    target_vendor = "apple",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
fn set_sockaddr_len(_storage: &mut libc::sockaddr_storage, _len: usize) {}

/// Decode a native address, `Endpoint::INVALID` for other families
pub(crate) fn sockaddr_to_endpoint(addr: &SockAddr) -> Endpoint {
    if addr.is_ipv4() {
        // SAFETY: family checked; the storage holds a sockaddr_in.
        let sin = unsafe { &*(addr.as_ptr() as *const libc::sockaddr_in) };
        Endpoint::new(
            NetAddress::from_bytes(&sin.sin_addr.s_addr.to_ne_bytes()),
            network_to_host(sin.sin_port),
        )
    } else if addr.is_ipv6() {
        // SAFETY: family checked; the storage holds a sockaddr_in6.
        let sin6 = unsafe { &*(addr.as_ptr() as *const libc::sockaddr_in6) };
        Endpoint::new(
            NetAddress::from_bytes(&sin6.sin6_addr.s6_addr),
            network_to_host(sin6.sin6_port),
        )
    } else {
        Endpoint::INVALID
    }
}

/// Address that dissolves a datagram socket's association when connected to
pub(crate) fn unspecified_sockaddr(_v6: bool) -> SockAddr {
    // SAFETY: all-zero storage is valid; only the family is set.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    storage.ss_family = libc::AF_UNSPEC as libc::sa_family_t;
    let len = mem::size_of::<libc::sockaddr>();
    set_sockaddr_len(&mut storage, len);
    // SAFETY: the first `len` bytes are initialized.
    unsafe { SockAddr::new(storage, len as libc::socklen_t) }
}

pub(crate) fn dns_message(code: i32) -> String {
    // SAFETY: gai_strerror returns a pointer to a static string.
    let text = unsafe { libc::gai_strerror(code) };
    if text.is_null() {
        return format!("resolver error {code}");
    }
    // SAFETY: non-null and NUL-terminated.
    unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
}

struct AddrInfo(*mut libc::addrinfo);

impl Drop for AddrInfo {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: the list came from a successful getaddrinfo call.
            unsafe { libc::freeaddrinfo(self.0) };
        }
    }
}

/// Resolve `host` to addresses of `version` with getaddrinfo
pub(crate) fn resolve(version: IpVersion, host: &str) -> Result<Vec<NetAddress>, SocketError> {
    let name = CString::new(host).map_err(|_| SocketError::dns(libc::EAI_NONAME))?;

    // SAFETY: addrinfo is plain data; zero means "no preference".
    let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
    hints.ai_family = match version {
        IpVersion::V4 => libc::AF_INET,
        IpVersion::V6 => libc::AF_INET6,
    };
    hints.ai_socktype = libc::SOCK_STREAM;
    hints.ai_protocol = libc::IPPROTO_TCP;

    let mut list = AddrInfo(ptr::null_mut());
    // SAFETY: name and hints outlive the call; list.0 receives ownership of the result.
    let status = unsafe { libc::getaddrinfo(name.as_ptr(), ptr::null(), &hints, &mut list.0) };
    if status == libc::EAI_SYSTEM {
        return Err(SocketError::last_os_error());
    }
    if status != 0 {
        return Err(SocketError::dns(status).observed());
    }

    let mut addresses = Vec::new();
    let mut entry = list.0;
    while !entry.is_null() {
        // SAFETY: entry is a node of the list returned above.
        let info = unsafe { &*entry };
        let address = match info.ai_family {
            libc::AF_INET if !info.ai_addr.is_null() => {
                // SAFETY: AF_INET entries carry a sockaddr_in.
                let sin = unsafe { &*(info.ai_addr as *const libc::sockaddr_in) };
                Some(NetAddress::from_bytes(&sin.sin_addr.s_addr.to_ne_bytes()))
            }
            libc::AF_INET6 if !info.ai_addr.is_null() => {
                // SAFETY: AF_INET6 entries carry a sockaddr_in6.
                let sin6 = unsafe { &*(info.ai_addr as *const libc::sockaddr_in6) };
                Some(NetAddress::from_bytes(&sin6.sin6_addr.s6_addr))
            }
            _ => None,
        };
        if let Some(address) = address {
            if address.version() == Some(version) && !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        entry = info.ai_next;
    }
    Ok(addresses)
}
