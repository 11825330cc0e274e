//! TCP Socket Module
//!
//! Provides TCP (Transmission Control Protocol) sockets for reliable
//! stream-based communication.
//!
//! `TcpSocket` pairs a [`SocketHandle`] with its own open flag. The handle
//! only knows whether a descriptor exists. The flag also drops when the
//! peer goes away: an error in the `Disconnected` group closes the socket
//! from the caller's point of view.

use crate::condition::{GenericCondition, SystemCondition};
use crate::config::SocketConfig;
use crate::dns::Resolver;
use crate::error::SocketError;
use crate::options::SocketOption;
use crate::socket::{NativeHandle, SocketHandle, Transport};
use entities_network::{Endpoint, IpVersion};
use entities_utilities::ByteView;
use std::io::{self, Read, Write};
use tracing::{debug, warn};

/// Read from `handle` one byte at a time until `delimiter`
///
/// Bytes are appended to `out`. The delimiter is consumed but never
/// appended. Reading also stops once `max_size` bytes have been appended,
/// unless `max_size` is 0.
///
/// # Returns
///
/// * `Ok(usize)` - Bytes appended to `out`
/// * `Err(SocketError)` - Read failure; bytes appended so far stay in `out`
pub fn read_until(
    handle: &SocketHandle,
    delimiter: u8,
    max_size: usize,
    out: &mut Vec<u8>,
) -> Result<usize, SocketError> {
    let mut appended = 0;
    let mut byte = [0u8; 1];
    while max_size == 0 || appended < max_size {
        let mut view = ByteView::new(&mut byte);
        handle.read(&mut view)?;
        if byte[0] == delimiter {
            break;
        }
        out.push(byte[0]);
        appended += 1;
    }
    Ok(appended)
}

/// TCP Socket
///
/// Connected byte stream. Closed sockets can be reconnected with
/// [`TcpSocket::connect`].
#[derive(Debug, Default)]
pub struct TcpSocket {
    handle: SocketHandle,
    open: bool,
}

impl TcpSocket {
    /// Create a closed socket
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_handle(handle: SocketHandle) -> Self {
        Self { handle, open: true }
    }

    /// Connect to `target`
    ///
    /// Any previous connection is closed first.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Connected
    /// * `Err(SocketError)` - Error connecting; the socket stays closed
    pub fn connect(&mut self, target: &Endpoint) -> Result<(), SocketError> {
        self.open_and_connect(target, None)
    }

    /// Connect to `target` after applying `config`
    pub fn connect_with(
        &mut self,
        target: &Endpoint,
        config: &SocketConfig,
    ) -> Result<(), SocketError> {
        self.open_and_connect(target, Some(config))
    }

    fn open_and_connect(
        &mut self,
        target: &Endpoint,
        config: Option<&SocketConfig>,
    ) -> Result<(), SocketError> {
        self.close();
        let version = target.version().ok_or_else(SocketError::invalid_argument)?;

        let mut handle = SocketHandle::allocate(version, Transport::Stream)?;
        if let Some(config) = config {
            config.apply(&mut handle, Transport::Stream)?;
        }
        handle.connect(target)?;
        self.handle = handle;
        self.open = true;
        Ok(())
    }

    /// Resolve `host` and connect to the first address that accepts
    ///
    /// IPv4 addresses are tried before IPv6.
    ///
    /// # Returns
    ///
    /// * `Ok(Endpoint)` - Endpoint that accepted the connection
    /// * `Err(SocketError)` - Last resolver or connect error
    pub fn connect_host<R: Resolver + ?Sized>(
        &mut self,
        resolver: &R,
        host: &str,
        port: u16,
    ) -> Result<Endpoint, SocketError> {
        let mut last_error = SocketError::invalid_argument();
        for version in [IpVersion::V4, IpVersion::V6] {
            let addresses = match resolver.resolve(version, host) {
                Ok(addresses) => addresses,
                Err(err) => {
                    last_error = err;
                    continue;
                }
            };
            for address in addresses {
                let target = Endpoint::new(address, port);
                match self.connect(&target) {
                    Ok(()) => return Ok(target),
                    Err(err) => {
                        debug!(endpoint = %target, error = %err, "connect attempt failed");
                        last_error = err;
                    }
                }
            }
        }
        Err(last_error)
    }

    /// Whether the socket is connected as far as this side knows
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Underlying handle
    pub fn handle(&self) -> &SocketHandle {
        &self.handle
    }

    /// Raw descriptor
    pub fn native_handle(&self) -> NativeHandle {
        self.handle.native_handle()
    }

    fn track(&mut self, err: SocketError) -> SocketError {
        if err.is(GenericCondition::Disconnected) {
            debug!(handle = self.handle.native_handle(), error = %err, "peer disconnected");
            self.open = false;
        }
        err
    }

    /// Read up to `count` bytes into `out`
    ///
    /// `out` is replaced by the bytes that arrived, at least one unless
    /// `count` is 0. It is empty after an error.
    pub fn read(&mut self, count: usize, out: &mut Vec<u8>) -> Result<usize, SocketError> {
        out.clear();
        out.resize(count, 0);
        let mut view = ByteView::from(&mut *out);
        let result = self.handle.read(&mut view);
        match result {
            Ok(received) => {
                out.truncate(received);
                Ok(received)
            }
            Err(err) => {
                out.clear();
                Err(self.track(err))
            }
        }
    }

    /// Read up to `count` bytes into a new vector
    pub fn read_vec(&mut self, count: usize) -> Result<Vec<u8>, SocketError> {
        let mut out = Vec::new();
        self.read(count, &mut out)?;
        Ok(out)
    }

    /// Append bytes to `out` up to `delimiter`; see [`read_until`]
    pub fn read_until(
        &mut self,
        delimiter: u8,
        max_size: usize,
        out: &mut Vec<u8>,
    ) -> Result<usize, SocketError> {
        read_until(&self.handle, delimiter, max_size, out).map_err(|err| self.track(err))
    }

    /// Send bytes, possibly fewer than `data.len()`
    pub fn write(&mut self, data: &[u8]) -> Result<usize, SocketError> {
        self.handle.write(data).map_err(|err| self.track(err))
    }

    /// Send all of `data`
    pub fn write_all(&mut self, mut data: &[u8]) -> Result<(), SocketError> {
        while !data.is_empty() {
            let sent = self.write(data)?;
            data = &data[sent..];
        }
        Ok(())
    }

    /// Shut down one or both directions
    ///
    /// A peer that is already gone is not an error here.
    pub fn shutdown(&mut self, read: bool, write: bool) -> Result<(), SocketError> {
        match self.handle.shutdown(read, write) {
            Err(err) if err.is(SystemCondition::NotConnected) => Ok(()),
            result => result,
        }
    }

    /// Close the connection; the socket can be connected again
    pub fn close(&mut self) {
        self.open = false;
        self.handle.close();
    }

    /// Local side of the connection
    pub fn local_endpoint(&self) -> Endpoint {
        self.handle.local_endpoint()
    }

    /// Remote side of the connection
    pub fn remote_endpoint(&self) -> Endpoint {
        self.handle.remote_endpoint()
    }

    /// Read an option
    pub fn option<O: SocketOption>(&self, option: O) -> Result<O::Value, SocketError> {
        option.get(&self.handle)
    }

    /// Change an option
    pub fn set_option<O: SocketOption>(
        &mut self,
        option: O,
        value: O::Value,
    ) -> Result<(), SocketError> {
        option.set(&mut self.handle, value)
    }
}

impl Drop for TcpSocket {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.shutdown(true, true) {
                warn!(error = %err, "shutdown on drop failed");
            }
        }
    }
}

impl Read for TcpSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut view = ByteView::new(buf);
        match self.handle.read(&mut view) {
            Ok(received) => Ok(received),
            // io::Read signals end of stream with Ok(0).
            Err(err) if err.is(SystemCondition::EndOfFile) => {
                self.open = false;
                Ok(0)
            }
            Err(err) => Err(self.track(err).into()),
        }
    }
}

impl Write for TcpSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        TcpSocket::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::MockResolver;
    use crate::listener::TcpListener;
    use crate::socket::MAX_PENDING_CONNECTIONS;
    use entities_network::{ipv4, NetAddress};
    use std::thread;

    fn listener() -> (TcpListener, Endpoint) {
        let listener =
            TcpListener::listen(&Endpoint::new(ipv4::LOOPBACK, 0), MAX_PENDING_CONNECTIONS)
                .unwrap();
        let endpoint = listener.local_endpoint();
        (listener, endpoint)
    }

    #[test]
    fn test_new_is_closed() {
        let socket = TcpSocket::new();
        assert!(!socket.is_open());
        assert!(!socket.handle().is_open());
    }

    #[test]
    fn test_read_until_delimiter() {
        let (listener, endpoint) = listener();
        let writer = thread::spawn(move || {
            let mut client = TcpSocket::new();
            client.connect(&endpoint).unwrap();
            client.write_all(b"first\nsecond\n").unwrap();
            client
        });

        let mut peer = listener.accept().unwrap();
        let mut line = Vec::new();
        assert_eq!(peer.read_until(b'\n', 0, &mut line).unwrap(), 5);
        assert_eq!(line, b"first");

        line.clear();
        peer.read_until(b'\n', 0, &mut line).unwrap();
        assert_eq!(line, b"second");
        drop(writer.join().unwrap());
    }

    #[test]
    fn test_read_until_max_size() {
        let (listener, endpoint) = listener();
        let writer = thread::spawn(move || {
            let mut client = TcpSocket::new();
            client.connect(&endpoint).unwrap();
            client.write_all(b"abcdef;").unwrap();
            client
        });

        let mut peer = listener.accept().unwrap();
        let mut out = Vec::new();
        assert_eq!(peer.read_until(b';', 4, &mut out).unwrap(), 4);
        assert_eq!(out, b"abcd");
        // The rest, delimiter consumed.
        assert_eq!(peer.read_until(b';', 0, &mut out).unwrap(), 2);
        assert_eq!(out, b"abcdef");
        drop(writer.join().unwrap());
    }

    #[test]
    fn test_read_until_eof_keeps_partial() {
        let (listener, endpoint) = listener();
        let writer = thread::spawn(move || {
            let mut client = TcpSocket::new();
            client.connect(&endpoint).unwrap();
            client.write_all(b"no newline").unwrap();
        });

        let mut peer = listener.accept().unwrap();
        writer.join().unwrap();
        let mut out = Vec::new();
        let err = peer.read_until(b'\n', 0, &mut out).unwrap_err();
        assert_eq!(err, SystemCondition::EndOfFile);
        assert_eq!(out, b"no newline");
        assert!(!peer.is_open());
    }

    #[test]
    fn test_io_traits() {
        let (listener, endpoint) = listener();
        let writer = thread::spawn(move || {
            let mut client = TcpSocket::new();
            client.connect(&endpoint).unwrap();
            Write::write_all(&mut client, b"through std::io").unwrap();
        });

        let mut peer = listener.accept().unwrap();
        let mut text = String::new();
        peer.read_to_string(&mut text).unwrap();
        writer.join().unwrap();
        assert_eq!(text, "through std::io");
    }

    #[test]
    fn test_connect_host_with_mock() {
        let (listener, endpoint) = listener();
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .withf(|version, host| *version == IpVersion::V4 && host == "service.test")
            .times(1)
            .returning(|_, _| Ok(vec![ipv4::LOOPBACK]));

        let mut client = TcpSocket::new();
        let connected = client.connect_host(&resolver, "service.test", endpoint.port).unwrap();
        assert_eq!(connected, endpoint);
        assert!(client.is_open());
        drop(listener.accept().unwrap());
    }

    #[test]
    fn test_connect_host_reports_resolver_error() {
        let mut resolver = MockResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Err(SocketError::dns(crate::sys::HOST_NOT_FOUND)));

        let mut client = TcpSocket::new();
        let err = client.connect_host(&resolver, "missing.test", 80).unwrap_err();
        assert_eq!(err, crate::condition::DnsCondition::HostNotFound);
        assert!(!client.is_open());
    }

    #[test]
    fn test_connect_invalid_endpoint() {
        let mut client = TcpSocket::new();
        let err = client.connect(&Endpoint::new(NetAddress::INVALID, 80)).unwrap_err();
        assert_eq!(err, SystemCondition::InvalidArgument);
    }
}
