//! Socket Options
//!
//! Each option is a unit struct implementing [`SocketOption`], so a call
//! reads like `socket.set_option(NoDelay, true)`.

use crate::error::SocketError;
use crate::socket::SocketHandle;
use std::time::Duration;

/// Readable and writable socket option
pub trait SocketOption {
    /// Value the option carries
    type Value;

    /// Read the option's current value from `handle`
    fn get(&self, handle: &SocketHandle) -> Result<Self::Value, SocketError>;

    /// Change the option on `handle`
    fn set(&self, handle: &mut SocketHandle, value: Self::Value) -> Result<(), SocketError>;
}

/// Return "try again" instead of blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonBlocking;

/// Disable Nagle's algorithm (TCP_NODELAY)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoDelay;

/// Send keep-alive probes (SO_KEEPALIVE)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAlive;

/// Allow binding to an address in TIME_WAIT (SO_REUSEADDR)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReuseAddress;

/// Block on close until unsent data is delivered or the timeout passes (SO_LINGER)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linger;

/// Abort a connection whose sent data stays unacknowledged this long
///
/// Maps to TCP_USER_TIMEOUT. On platforms without it, setting is a no-op
/// and reading reports `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserTimeout;

impl SocketOption for NonBlocking {
    type Value = bool;

    #[cfg(unix)]
    fn get(&self, handle: &SocketHandle) -> Result<bool, SocketError> {
        Ok(handle.sock().nonblocking()?)
    }

    // Winsock cannot report the mode, so the last requested value is used.
    #[cfg(windows)]
    fn get(&self, handle: &SocketHandle) -> Result<bool, SocketError> {
        Ok(handle.state().user_non_blocking)
    }

    fn set(&self, handle: &mut SocketHandle, value: bool) -> Result<(), SocketError> {
        handle.sock().set_nonblocking(value)?;
        handle.state_mut().user_non_blocking = value;
        Ok(())
    }
}

impl SocketOption for NoDelay {
    type Value = bool;

    fn get(&self, handle: &SocketHandle) -> Result<bool, SocketError> {
        Ok(handle.sock().nodelay()?)
    }

    fn set(&self, handle: &mut SocketHandle, value: bool) -> Result<(), SocketError> {
        Ok(handle.sock().set_nodelay(value)?)
    }
}

impl SocketOption for KeepAlive {
    type Value = bool;

    fn get(&self, handle: &SocketHandle) -> Result<bool, SocketError> {
        Ok(handle.sock().keepalive()?)
    }

    fn set(&self, handle: &mut SocketHandle, value: bool) -> Result<(), SocketError> {
        Ok(handle.sock().set_keepalive(value)?)
    }
}

impl SocketOption for ReuseAddress {
    type Value = bool;

    fn get(&self, handle: &SocketHandle) -> Result<bool, SocketError> {
        Ok(handle.sock().reuse_address()?)
    }

    fn set(&self, handle: &mut SocketHandle, value: bool) -> Result<(), SocketError> {
        Ok(handle.sock().set_reuse_address(value)?)
    }
}

impl SocketOption for Linger {
    type Value = Option<Duration>;

    fn get(&self, handle: &SocketHandle) -> Result<Option<Duration>, SocketError> {
        Ok(handle.sock().linger()?)
    }

    fn set(&self, handle: &mut SocketHandle, value: Option<Duration>) -> Result<(), SocketError> {
        Ok(handle.sock().set_linger(value)?)
    }
}

impl SocketOption for UserTimeout {
    type Value = Option<Duration>;

    #[cfg(any(target_os = "android", target_os = "fuchsia", target_os = "linux"))]
    fn get(&self, handle: &SocketHandle) -> Result<Option<Duration>, SocketError> {
        Ok(handle.sock().tcp_user_timeout()?)
    }

    #[cfg(not(any(target_os = "android", target_os = "fuchsia", target_os = "linux")))]
    fn get(&self, _handle: &SocketHandle) -> Result<Option<Duration>, SocketError> {
        Ok(None)
    }

    #[cfg(any(target_os = "android", target_os = "fuchsia", target_os = "linux"))]
    fn set(&self, handle: &mut SocketHandle, value: Option<Duration>) -> Result<(), SocketError> {
        Ok(handle.sock().set_tcp_user_timeout(value)?)
    }

    #[cfg(not(any(target_os = "android", target_os = "fuchsia", target_os = "linux")))]
    fn set(&self, _handle: &mut SocketHandle, _value: Option<Duration>) -> Result<(), SocketError> {
        tracing::debug!("TCP user timeout not supported on this platform, ignoring");
        Ok(())
    }
}
