//! Adapters Layer: Socket Support
//!
//! Portable blocking sockets over POSIX and Winsock.
//!
//! This crate provides:
//! - `SocketHandle`: owned OS socket with connect/bind/listen/accept/read/write
//! - Error translation from errno, `WSA*` and `EAI_*` codes into portable conditions
//! - TCP streams, TCP listeners and UDP sockets built on handles
//! - Socket options, name resolution and JSON-loadable socket configuration
//!
//! ## Examples
//!
//! ```no_run
//! use adapters_socket::{TcpListener, TcpSocket, MAX_PENDING_CONNECTIONS};
//! use entities_network::{ipv4, Endpoint};
//!
//! let listener = TcpListener::listen(&Endpoint::new(ipv4::ANY, 7000), MAX_PENDING_CONNECTIONS)?;
//! let mut client = listener.accept()?;
//! let mut line = Vec::new();
//! client.read_until(b'\n', 0, &mut line)?;
//! client.write_all(&line)?;
//! # Ok::<(), adapters_socket::SocketError>(())
//! ```

pub mod condition;
pub mod config;
pub mod dns;
pub mod error;
pub mod listener;
pub mod options;
pub mod socket;
mod sys;
pub mod tcp;
pub mod udp;

pub use condition::{Condition, DnsCondition, ErrorMapping, GenericCondition, SystemCondition};
pub use config::{ConfigError, SocketConfig};
pub use dns::{resolve, Resolver, SystemResolver};
pub use error::{dns_errors, system_errors, ErrorDomain, SocketError, EOF_CODE};
pub use listener::TcpListener;
pub use options::{KeepAlive, Linger, NoDelay, NonBlocking, ReuseAddress, SocketOption, UserTimeout};
pub use socket::{
    HandleState, NativeHandle, SocketHandle, Transport, MAX_PENDING_CONNECTIONS, NOT_INITIALIZED,
};
pub use tcp::{read_until, TcpSocket};
pub use udp::UdpSocket;
