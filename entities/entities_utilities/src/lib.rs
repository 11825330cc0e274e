//! Entities Layer: Utilities
//!
//! Provides utility types used by the networking layers:
//! - Non-owning, resizable byte views for zero-copy I/O
//! - Host/network byte order conversion

pub mod byte_view;
pub mod endian;

pub use byte_view::{ByteView, ByteViewError};
pub use endian::{flip, host_is_network, host_to_network, network_to_host, FlipEndian};
