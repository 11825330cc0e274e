//! TCP Listener Module
//!
//! Accepts incoming TCP connections on a bound endpoint.

use crate::config::SocketConfig;
use crate::error::SocketError;
use crate::options::SocketOption;
use crate::socket::{NativeHandle, SocketHandle, Transport};
use crate::tcp::TcpSocket;
use entities_network::Endpoint;
use tracing::debug;

/// TCP Listener
#[derive(Debug, Default)]
pub struct TcpListener {
    handle: SocketHandle,
}

impl TcpListener {
    /// Bind to `endpoint` and start listening
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Local endpoint; port 0 picks a free port
    /// * `backlog` - Maximum number of pending connections
    ///
    /// # Returns
    ///
    /// * `Ok(TcpListener)` - Listening socket
    /// * `Err(SocketError)` - Error binding or listening
    pub fn listen(endpoint: &Endpoint, backlog: i32) -> Result<Self, SocketError> {
        Self::open(endpoint, backlog, None)
    }

    /// Bind to `endpoint` and listen with the options and backlog from `config`
    pub fn listen_with(endpoint: &Endpoint, config: &SocketConfig) -> Result<Self, SocketError> {
        Self::open(endpoint, config.backlog, Some(config))
    }

    fn open(
        endpoint: &Endpoint,
        backlog: i32,
        config: Option<&SocketConfig>,
    ) -> Result<Self, SocketError> {
        let version = endpoint.version().ok_or_else(SocketError::invalid_argument)?;
        let mut handle = SocketHandle::allocate(version, Transport::Stream)?;
        if let Some(config) = config {
            config.apply(&mut handle, Transport::Stream)?;
        }
        handle.bind(endpoint)?;
        handle.listen(backlog)?;
        let listener = Self { handle };
        debug!(endpoint = %listener.local_endpoint(), "listening");
        Ok(listener)
    }

    /// Wait for the next connection
    pub fn accept(&self) -> Result<TcpSocket, SocketError> {
        self.handle.accept().map(TcpSocket::from_handle)
    }

    /// Whether the listener still owns its socket
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Bound endpoint, with the actual port when 0 was requested
    pub fn local_endpoint(&self) -> Endpoint {
        self.handle.local_endpoint()
    }

    /// Raw descriptor
    pub fn native_handle(&self) -> NativeHandle {
        self.handle.native_handle()
    }

    /// Stop listening
    pub fn close(&mut self) {
        self.handle.close();
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
