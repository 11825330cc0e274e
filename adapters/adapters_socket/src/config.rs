//! Socket Configuration
//!
//! Option presets that can be loaded from JSON and applied to a handle in
//! one call. Missing fields take their defaults.
//!
//! ```json
//! { "backlog": 64, "no_delay": true, "linger_secs": 5 }
//! ```

use crate::error::SocketError;
use crate::options::{
    KeepAlive, Linger, NoDelay, NonBlocking, ReuseAddress, SocketOption, UserTimeout,
};
use crate::socket::{SocketHandle, Transport, MAX_PENDING_CONNECTIONS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors loading a [`SocketConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The text is not a valid configuration
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Options applied to new sockets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Pending connection limit for listeners
    pub backlog: i32,
    /// Put the socket in non-blocking mode
    pub non_blocking: bool,
    /// TCP_NODELAY, streams only
    pub no_delay: bool,
    /// SO_KEEPALIVE, streams only
    pub keep_alive: bool,
    /// SO_REUSEADDR, set before binding
    pub reuse_address: bool,
    /// SO_LINGER timeout in seconds, `None` leaves lingering off
    pub linger_secs: Option<u64>,
    /// TCP user timeout in milliseconds, streams only
    pub user_timeout_ms: Option<u64>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            backlog: MAX_PENDING_CONNECTIONS,
            non_blocking: false,
            no_delay: false,
            keep_alive: false,
            reuse_address: false,
            linger_secs: None,
            user_timeout_ms: None,
        }
    }
}

impl SocketConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        debug!(path = %path.as_ref().display(), "loaded socket config");
        Ok(config)
    }

    /// Apply every option to `handle`
    ///
    /// Stream-only options are skipped for datagram sockets.
    pub fn apply(
        &self,
        handle: &mut SocketHandle,
        transport: Transport,
    ) -> Result<(), SocketError> {
        ReuseAddress.set(handle, self.reuse_address)?;
        NonBlocking.set(handle, self.non_blocking)?;
        if self.linger_secs.is_some() {
            Linger.set(handle, self.linger_secs.map(Duration::from_secs))?;
        }
        if transport == Transport::Stream {
            NoDelay.set(handle, self.no_delay)?;
            KeepAlive.set(handle, self.keep_alive)?;
            if self.user_timeout_ms.is_some() {
                UserTimeout.set(handle, self.user_timeout_ms.map(Duration::from_millis))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_network::IpVersion;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SocketConfig::default();
        assert_eq!(config.backlog, MAX_PENDING_CONNECTIONS);
        assert!(!config.non_blocking);
        assert_eq!(config.linger_secs, None);
    }

    #[test]
    fn test_from_json_partial() {
        let config = SocketConfig::from_json(r#"{ "backlog": 16, "no_delay": true }"#).unwrap();
        assert_eq!(config.backlog, 16);
        assert!(config.no_delay);
        assert!(!config.keep_alive);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = SocketConfig::from_json("{ backlog: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "keep_alive": true, "linger_secs": 2 }}"#).unwrap();
        let config = SocketConfig::load(file.path()).unwrap();
        assert!(config.keep_alive);
        assert_eq!(config.linger_secs, Some(2));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SocketConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_apply_stream() {
        let config = SocketConfig {
            no_delay: true,
            keep_alive: true,
            linger_secs: Some(1),
            ..SocketConfig::default()
        };
        let mut handle = SocketHandle::allocate(IpVersion::V4, Transport::Stream).unwrap();
        config.apply(&mut handle, Transport::Stream).unwrap();
        assert!(NoDelay.get(&handle).unwrap());
        assert!(KeepAlive.get(&handle).unwrap());
        assert_eq!(Linger.get(&handle).unwrap(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_apply_datagram_skips_tcp_options() {
        let config = SocketConfig {
            no_delay: true,
            non_blocking: true,
            ..SocketConfig::default()
        };
        let mut handle = SocketHandle::allocate(IpVersion::V4, Transport::Datagram).unwrap();
        config.apply(&mut handle, Transport::Datagram).unwrap();
        assert!(NonBlocking.get(&handle).unwrap());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = SocketConfig {
            user_timeout_ms: Some(2500),
            ..SocketConfig::default()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(SocketConfig::from_json(&text).unwrap(), config);
    }
}
