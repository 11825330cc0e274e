//! UDP Socket Module
//!
//! Provides UDP (User Datagram Protocol) sockets for datagram-based
//! communication.
//!
//! A socket can be associated with one peer (`connect` on the OS level).
//! Writes without an explicit destination then go to that peer. Without an
//! association every write needs a destination.

use crate::condition::SystemCondition;
use crate::error::SocketError;
use crate::options::SocketOption;
use crate::socket::{NativeHandle, SocketHandle, Transport};
use entities_network::{Endpoint, IpVersion};
use entities_utilities::ByteView;

/// UDP Socket
#[derive(Debug)]
pub struct UdpSocket {
    handle: SocketHandle,
}

impl UdpSocket {
    /// Create a new UDP socket
    ///
    /// # Arguments
    ///
    /// * `version` - IPv4 or IPv6
    ///
    /// # Returns
    ///
    /// * `Ok(UdpSocket)` - Created socket
    /// * `Err(SocketError)` - Error creating socket
    pub fn new(version: IpVersion) -> Result<Self, SocketError> {
        Ok(Self {
            handle: SocketHandle::allocate(version, Transport::Datagram)?,
        })
    }

    /// Send future writes to `peer` and only receive from it
    pub fn associate(&self, peer: &Endpoint) -> Result<(), SocketError> {
        self.handle.connect(peer)
    }

    /// Undo [`UdpSocket::associate`]
    pub fn disassociate(&self) {
        self.handle.disassociate();
    }

    /// Bind to a local `endpoint` to receive datagrams
    pub fn listen(&self, endpoint: &Endpoint) -> Result<(), SocketError> {
        self.handle.bind(endpoint)
    }

    /// Send one datagram
    ///
    /// # Arguments
    ///
    /// * `data` - Payload
    /// * `destination` - Target; `None` uses the associated peer
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes sent
    /// * `Err(SocketError)` - Error sending, including a missing destination
    pub fn write(&self, data: &[u8], destination: Option<&Endpoint>) -> Result<usize, SocketError> {
        match destination {
            Some(target) => self.handle.send_to(data, target),
            None => self.handle.write(data),
        }
    }

    /// Receive one datagram of at most `count` bytes into `out`
    ///
    /// Longer datagrams are truncated. `out` ends up exactly as long as the
    /// bytes received. When `source` is given it receives the sender.
    ///
    /// A `count` of 0 returns `Ok(0)` without touching the socket, so the
    /// next datagram stays queued and `source` is left as it was.
    pub fn read(
        &self,
        count: usize,
        out: &mut Vec<u8>,
        source: Option<&mut Endpoint>,
    ) -> Result<usize, SocketError> {
        out.clear();
        if count == 0 {
            return Ok(0);
        }
        out.resize(count, 0);
        let mut view = ByteView::from(&mut *out);
        let result = match source {
            Some(source) => self.handle.recv_from(&mut view).map(|(received, from)| {
                *source = from;
                received
            }),
            None => self.handle.read(&mut view),
        };
        match result {
            Ok(received) => {
                out.truncate(received);
                Ok(received)
            }
            // An empty datagram is a datagram, not end of stream.
            Err(err) if err.is(SystemCondition::EndOfFile) => {
                out.clear();
                Ok(0)
            }
            Err(err) => {
                out.clear();
                Err(err)
            }
        }
    }

    /// Receive one datagram into a new vector
    pub fn read_vec(&self, count: usize) -> Result<Vec<u8>, SocketError> {
        let mut out = Vec::new();
        self.read(count, &mut out, None)?;
        Ok(out)
    }

    /// Whether the socket still owns a descriptor
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Release the socket
    pub fn close(&mut self) {
        self.handle.close();
    }

    /// Bound local endpoint
    pub fn local_endpoint(&self) -> Endpoint {
        self.handle.local_endpoint()
    }

    /// Associated peer
    pub fn remote_endpoint(&self) -> Endpoint {
        self.handle.remote_endpoint()
    }

    /// Raw descriptor
    pub fn native_handle(&self) -> NativeHandle {
        self.handle.native_handle()
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
