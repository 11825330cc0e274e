//! Socket Module
//!
//! Provides `SocketHandle`, a move-only owner of one OS socket descriptor.
//!
//! ## Overview
//!
//! A handle is either unallocated, which is also the state after close, or
//! open. Every operation except construction, moving and dropping needs an
//! open handle. Callers check [`SocketHandle::is_open`] first.
//!
//! The operations are thin wrappers over the socket system calls made
//! through `socket2`:
//!
//! - A call interrupted by a signal is retried until it completes.
//! - Every other failure comes back as a [`SocketError`] with a portable
//!   condition.
//! - Writes never raise SIGPIPE; a dead peer shows up as `BrokenPipe`.
//! - A read that asked for bytes and got none reports `EndOfFile`.
//!
//! ## See Also
//!
//! - [`crate::options`]: socket options applied through a handle
//! - [`crate::tcp`], [`crate::udp`], [`crate::listener`]: wrappers built on handles

use crate::error::SocketError;
use crate::sys;
use entities_network::{Endpoint, IpVersion};
use entities_utilities::ByteView;
use socket2::{Domain, Protocol, SockRef, Socket as Socket2, Type};
use std::io;
use std::mem::{self, MaybeUninit};
use std::net::Shutdown;
use tracing::{debug, trace, warn};

#[cfg(unix)]
use std::os::unix::io::{AsFd, BorrowedFd, RawFd};
#[cfg(windows)]
use std::os::windows::io::{AsSocket, BorrowedSocket, RawSocket};

/// OS socket descriptor
#[cfg(unix)]
pub type NativeHandle = RawFd;
/// OS socket descriptor
#[cfg(windows)]
pub type NativeHandle = RawSocket;

/// Descriptor value of a handle that owns nothing
#[cfg(unix)]
pub const NOT_INITIALIZED: NativeHandle = -1;
/// Descriptor value of a handle that owns nothing
#[cfg(windows)]
pub const NOT_INITIALIZED: NativeHandle = !0;

/// Largest backlog the platform accepts for `listen`
pub const MAX_PENDING_CONNECTIONS: i32 = sys::SOMAXCONN;

/// Delivery semantics of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Reliable ordered byte stream (TCP)
    Stream,
    /// Unreliable datagrams (UDP)
    Datagram,
}

impl From<Transport> for Type {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Stream => Type::STREAM,
            Transport::Datagram => Type::DGRAM,
        }
    }
}

impl From<Transport> for Protocol {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Stream => Protocol::TCP,
            Transport::Datagram => Protocol::UDP,
        }
    }
}

fn domain(version: IpVersion) -> Domain {
    match version {
        IpVersion::V4 => Domain::IPV4,
        IpVersion::V6 => Domain::IPV6,
    }
}

/// State the OS cannot report back on every platform
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HandleState {
    /// Non-blocking mode as last requested by the user
    pub user_non_blocking: bool,
}

/// Owned OS socket
#[derive(Debug)]
pub struct SocketHandle {
    handle: NativeHandle,
    state: HandleState,
}

/// Run `op` until it finishes without being interrupted by a signal
pub(crate) fn retry_interrupted<T>(
    mut op: impl FnMut() -> io::Result<T>,
) -> Result<T, SocketError> {
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                trace!("system call interrupted, retrying");
            }
            Err(err) => return Err(SocketError::from(err)),
        }
    }
}

fn as_uninit(buf: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    // SAFETY: MaybeUninit<u8> has the layout of u8, and the socket calls
    // only ever write initialized bytes into the buffer.
    unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) }
}

impl SocketHandle {
    /// Create an unallocated handle
    pub const fn new() -> Self {
        Self {
            handle: NOT_INITIALIZED,
            state: HandleState {
                user_non_blocking: false,
            },
        }
    }

    /// Open a socket
    ///
    /// # Arguments
    ///
    /// * `version` - IPv4 or IPv6
    /// * `transport` - Stream (TCP) or datagram (UDP)
    ///
    /// # Returns
    ///
    /// * `Ok(SocketHandle)` - Open handle in blocking mode
    /// * `Err(SocketError)` - Error creating socket
    pub fn allocate(version: IpVersion, transport: Transport) -> Result<Self, SocketError> {
        sys::ensure_initialized()?;

        let socket = Socket2::new(domain(version), transport.into(), Some(transport.into()))?;
        if let Err(err) = sys::suppress_sigpipe(&socket) {
            warn!(error = %err, "could not disable SIGPIPE on socket");
        }

        let handle = Self::from_socket(socket);
        debug!(handle = handle.handle, ?version, ?transport, "socket allocated");
        Ok(handle)
    }

    fn from_socket(socket: Socket2) -> Self {
        Self {
            handle: sys::into_native(socket),
            state: HandleState::default(),
        }
    }

    /// Take ownership of a raw descriptor
    ///
    /// # Safety
    ///
    /// `handle` must be an open socket that nothing else will close.
    pub unsafe fn from_native(handle: NativeHandle) -> Self {
        Self {
            handle,
            state: HandleState::default(),
        }
    }

    /// Whether the handle owns a descriptor
    pub fn is_open(&self) -> bool {
        self.handle != NOT_INITIALIZED
    }

    /// Raw descriptor, for option calls made outside this crate
    pub fn native_handle(&self) -> NativeHandle {
        self.handle
    }

    /// Give up ownership of the descriptor without closing it
    pub fn into_native(mut self) -> NativeHandle {
        mem::replace(&mut self.handle, NOT_INITIALIZED)
    }

    /// State recorded alongside the descriptor
    pub fn state(&self) -> HandleState {
        self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut HandleState {
        &mut self.state
    }

    /// Borrow the descriptor as a `socket2` socket
    pub(crate) fn sock(&self) -> SockRef<'_> {
        debug_assert!(self.is_open(), "operation on a closed socket handle");
        SockRef::from(self)
    }

    /// Connect to `target`
    pub fn connect(&self, target: &Endpoint) -> Result<(), SocketError> {
        let addr = sys::endpoint_to_sockaddr(target)?;
        let sock = self.sock();
        retry_interrupted(|| sock.connect(&addr))?;
        debug!(handle = self.handle, endpoint = %target, "connected");
        Ok(())
    }

    /// Bind to a local `endpoint`
    pub fn bind(&self, endpoint: &Endpoint) -> Result<(), SocketError> {
        let addr = sys::endpoint_to_sockaddr(endpoint)?;
        let sock = self.sock();
        retry_interrupted(|| sock.bind(&addr))?;
        debug!(handle = self.handle, endpoint = %endpoint, "bound");
        Ok(())
    }

    /// Start accepting connections with at most `backlog` pending
    pub fn listen(&self, backlog: i32) -> Result<(), SocketError> {
        let sock = self.sock();
        retry_interrupted(|| sock.listen(backlog))?;
        debug!(handle = self.handle, backlog, "listening");
        Ok(())
    }

    /// Wait for and take the next pending connection
    ///
    /// The peer address is dropped; use [`SocketHandle::remote_endpoint`]
    /// on the result.
    pub fn accept(&self) -> Result<SocketHandle, SocketError> {
        let sock = self.sock();
        let (socket, _peer) = retry_interrupted(|| sock.accept())?;
        if let Err(err) = sys::suppress_sigpipe(&socket) {
            warn!(error = %err, "could not disable SIGPIPE on accepted socket");
        }
        let accepted = Self::from_socket(socket);
        debug!(handle = self.handle, accepted = accepted.handle, "accepted connection");
        Ok(accepted)
    }

    /// Shut down one or both directions
    ///
    /// Passing `false` for both is a caller bug; it asserts in debug builds
    /// and does nothing otherwise.
    pub fn shutdown(&self, read: bool, write: bool) -> Result<(), SocketError> {
        let how = match (read, write) {
            (true, true) => Shutdown::Both,
            (true, false) => Shutdown::Read,
            (false, true) => Shutdown::Write,
            (false, false) => {
                debug_assert!(false, "shutdown with neither direction");
                return Ok(());
            }
        };
        let sock = self.sock();
        retry_interrupted(|| sock.shutdown(how))
    }

    /// Send bytes on a connected socket
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes sent, possibly fewer than `data.len()`
    /// * `Err(SocketError)` - Error sending
    pub fn write(&self, data: &[u8]) -> Result<usize, SocketError> {
        let sock = self.sock();
        let sent = retry_interrupted(|| sock.send_with_flags(data, sys::IO_FLAGS))?;
        trace!(handle = self.handle, sent, requested = data.len(), "write");
        Ok(sent)
    }

    /// Receive into `view`, shrinking it to the bytes that arrived
    ///
    /// An empty view returns `Ok(0)` without touching the socket.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes received, at least 1 for a non-empty view
    /// * `Err(SocketError)` - `EndOfFile` if the peer closed, otherwise the OS error
    pub fn read(&self, view: &mut ByteView<'_>) -> Result<usize, SocketError> {
        let requested = view.len();
        if requested == 0 {
            return Ok(0);
        }
        let sock = self.sock();
        let received = retry_interrupted(|| sock.recv(as_uninit(view.as_mut_slice())))?;
        if received == 0 {
            view.clear();
            return Err(SocketError::end_of_file());
        }
        view.shrink_back(requested - received);
        trace!(handle = self.handle, received, requested, "read");
        Ok(received)
    }

    /// Send a datagram to `target`
    pub fn send_to(&self, data: &[u8], target: &Endpoint) -> Result<usize, SocketError> {
        let addr = sys::endpoint_to_sockaddr(target)?;
        let sock = self.sock();
        let sent = retry_interrupted(|| sock.send_to_with_flags(data, &addr, sys::IO_FLAGS))?;
        trace!(handle = self.handle, sent, endpoint = %target, "send_to");
        Ok(sent)
    }

    /// Receive a datagram into `view`, reporting where it came from
    ///
    /// Datagrams longer than the view are truncated to fit. The view is
    /// shrunk to the bytes received.
    pub fn recv_from(&self, view: &mut ByteView<'_>) -> Result<(usize, Endpoint), SocketError> {
        let requested = view.len();
        let sock = self.sock();
        let (received, addr) =
            retry_interrupted(|| sock.recv_from(as_uninit(view.as_mut_slice())))?;
        if received == 0 && requested != 0 {
            view.clear();
            return Err(SocketError::end_of_file());
        }
        view.shrink_back(requested - received);
        let source = sys::sockaddr_to_endpoint(&addr);
        trace!(handle = self.handle, received, endpoint = %source, "recv_from");
        Ok((received, source))
    }

    /// Local address the socket is bound to
    ///
    /// Failing to query it is a caller bug. It asserts in debug builds and
    /// yields `Endpoint::INVALID` otherwise.
    pub fn local_endpoint(&self) -> Endpoint {
        match self.sock().local_addr() {
            Ok(addr) => sys::sockaddr_to_endpoint(&addr),
            Err(err) => {
                debug_assert!(false, "getsockname failed: {err}");
                warn!(handle = self.handle, error = %err, "local endpoint unavailable");
                Endpoint::INVALID
            }
        }
    }

    /// Address of the connected peer
    ///
    /// Calling this on an unconnected socket is a caller bug. It asserts in
    /// debug builds and yields `Endpoint::INVALID` otherwise.
    pub fn remote_endpoint(&self) -> Endpoint {
        match self.sock().peer_addr() {
            Ok(addr) => sys::sockaddr_to_endpoint(&addr),
            Err(err) => {
                debug_assert!(false, "getpeername failed: {err}");
                warn!(handle = self.handle, error = %err, "remote endpoint unavailable");
                Endpoint::INVALID
            }
        }
    }

    /// Drop the peer set by a previous `connect` on a datagram socket
    pub fn disassociate(&self) {
        let sock = self.sock();
        let v6 = sock.local_addr().map(|addr| addr.is_ipv6()).unwrap_or(false);
        // Some platforms report an error even though the association is gone.
        if let Err(err) = sock.connect(&sys::unspecified_sockaddr(v6)) {
            warn!(handle = self.handle, error = %err, "disassociate reported an error");
        }
    }

    /// Close the descriptor now; the handle becomes unallocated
    pub fn close(&mut self) {
        let handle = mem::replace(&mut self.handle, NOT_INITIALIZED);
        self.state = HandleState::default();
        if handle != NOT_INITIALIZED {
            debug!(handle, "closing socket");
            // SAFETY: the descriptor was owned by this handle and is no longer reachable.
            drop(unsafe { sys::from_native(handle) });
        }
    }
}

impl Default for SocketHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(unix)]
impl AsFd for SocketHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the descriptor stays open for as long as `self` is borrowed.
        unsafe { BorrowedFd::borrow_raw(self.handle) }
    }
}

#[cfg(windows)]
impl AsSocket for SocketHandle {
    fn as_socket(&self) -> BorrowedSocket<'_> {
        // SAFETY: the socket stays open for as long as `self` is borrowed.
        unsafe { BorrowedSocket::borrow_raw(self.handle) }
    }
}
