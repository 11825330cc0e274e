//! Socket Error Module
//!
//! `SocketError` keeps the platform code and the domain it came from. Its
//! portable condition is computed on demand through the platform tables.

use crate::condition::{
    self, Condition, DnsCondition, ErrorMapping, GenericCondition, SystemCondition,
};
use crate::sys;
use std::fmt;
use std::io;
use tracing::error;

/// Native code used for an orderly close by the peer
///
/// No platform returns this code itself. A read that asked for at least
/// one byte and got zero reports it.
pub const EOF_CODE: i32 = -1;

/// Table a native code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorDomain {
    /// errno / `WSA*` codes from socket calls
    System,
    /// Resolver codes (`EAI_*`)
    Dns,
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorDomain::System => f.write_str("system"),
            ErrorDomain::Dns => f.write_str("dns"),
        }
    }
}

/// Platform translation table for socket calls
pub fn system_errors() -> &'static [ErrorMapping] {
    sys::SYSTEM_ERRORS
}

/// Platform translation table for name resolution
pub fn dns_errors() -> &'static [ErrorMapping] {
    sys::DNS_ERRORS
}

/// Failure reported by a socket or resolver operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketError {
    domain: ErrorDomain,
    code: i32,
}

impl SocketError {
    /// Error from the system table
    pub const fn system(code: i32) -> Self {
        Self {
            domain: ErrorDomain::System,
            code,
        }
    }

    /// Error from the resolver table
    pub const fn dns(code: i32) -> Self {
        Self {
            domain: ErrorDomain::Dns,
            code,
        }
    }

    /// Orderly shutdown by the peer
    pub const fn end_of_file() -> Self {
        Self::system(EOF_CODE)
    }

    pub(crate) const fn invalid_argument() -> Self {
        Self::system(sys::INVALID_ARGUMENT)
    }

    /// Error left behind by the last failed system call on this thread
    pub fn last_os_error() -> Self {
        Self::from(io::Error::last_os_error())
    }

    /// Domain of the native code
    pub fn domain(&self) -> ErrorDomain {
        self.domain
    }

    /// Native code as reported by the platform
    pub fn code(&self) -> i32 {
        self.code
    }

    fn table(&self) -> &'static [ErrorMapping] {
        match self.domain {
            ErrorDomain::System => system_errors(),
            ErrorDomain::Dns => dns_errors(),
        }
    }

    /// Canonical portable condition
    pub fn condition(&self) -> Condition {
        condition::default_condition(self.table(), self.code)
    }

    /// Whether this error satisfies `condition`, specific or generic
    pub fn is(&self, condition: impl Into<Condition>) -> bool {
        condition::equivalent(self.table(), self.code, condition.into())
    }

    /// Human-readable description from the platform
    pub fn message(&self) -> String {
        match self.domain {
            ErrorDomain::System if self.code == EOF_CODE => "end of file".to_owned(),
            ErrorDomain::System => io::Error::from_raw_os_error(self.code).to_string(),
            ErrorDomain::Dns => sys::dns_message(self.code),
        }
    }

    /// Check a freshly observed platform code
    ///
    /// Codes classified as unexpected abort debug builds so gaps in the
    /// tables show up under test. Release builds log them and carry on.
    pub(crate) fn observed(self) -> Self {
        if self.is(SystemCondition::Unexpected) {
            error!(
                domain = %self.domain,
                code = self.code,
                "unexpected platform error: {}",
                self.message()
            );
            debug_assert!(false, "unexpected platform error: {self}");
        }
        self
    }
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error {}: {}", self.domain, self.code, self.message())
    }
}

impl std::error::Error for SocketError {}

impl From<io::Error> for SocketError {
    fn from(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) => SocketError::system(code).observed(),
            // Errors synthesized by std or socket2 without an OS code.
            None => match err.kind() {
                io::ErrorKind::UnexpectedEof => SocketError::end_of_file(),
                io::ErrorKind::OutOfMemory => SocketError::system(sys::OUT_OF_MEMORY),
                _ => SocketError::invalid_argument(),
            },
        }
    }
}

impl From<SocketError> for io::Error {
    fn from(err: SocketError) -> Self {
        match err.domain {
            ErrorDomain::System if err.code == EOF_CODE => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            }
            ErrorDomain::System => io::Error::from_raw_os_error(err.code),
            ErrorDomain::Dns => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

impl PartialEq<SystemCondition> for SocketError {
    fn eq(&self, other: &SystemCondition) -> bool {
        self.is(*other)
    }
}

impl PartialEq<DnsCondition> for SocketError {
    fn eq(&self, other: &DnsCondition) -> bool {
        self.is(*other)
    }
}

impl PartialEq<GenericCondition> for SocketError {
    fn eq(&self, other: &GenericCondition) -> bool {
        self.is(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_refused_is_no_destination() {
        let err = SocketError::system(sys::CONNECTION_REFUSED);
        assert_eq!(err.condition(), SystemCondition::ConnectionRefused.into());
        assert!(err.is(GenericCondition::NoDestination));
        assert!(!err.is(GenericCondition::Disconnected));
        assert_eq!(err, SystemCondition::ConnectionRefused);
    }

    #[test]
    fn test_end_of_file() {
        let err = SocketError::end_of_file();
        assert_eq!(err.code(), EOF_CODE);
        assert_eq!(err, SystemCondition::EndOfFile);
        assert_eq!(err, GenericCondition::Disconnected);
        assert_eq!(err.message(), "end of file");
    }

    #[test]
    fn test_success_code() {
        assert_eq!(SocketError::system(0).condition(), SystemCondition::Success.into());
        assert_eq!(SocketError::dns(0).condition(), SystemCondition::Success.into());
    }

    #[test]
    fn test_unknown_code() {
        let err = SocketError::system(987_654);
        assert_eq!(err.condition(), SystemCondition::Unknown.into());
        assert_eq!(err, SystemCondition::Unknown);
    }

    #[test]
    fn test_io_error_conversion() {
        let err = SocketError::from(io::Error::from_raw_os_error(sys::CONNECTION_REFUSED));
        assert_eq!(err.domain(), ErrorDomain::System);
        assert_eq!(err, SystemCondition::ConnectionRefused);

        let back = io::Error::from(err);
        assert_eq!(back.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(
            io::Error::from(SocketError::end_of_file()).kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_unexpected_code_built_directly_is_accepted() {
        let err = SocketError::system(sys::BAD_DESCRIPTOR);
        assert_eq!(err, SystemCondition::Unexpected);
        assert_eq!(err.code(), sys::BAD_DESCRIPTOR);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "unexpected platform error")]
    fn test_unexpected_code_from_os_asserts() {
        let _ = SocketError::from(io::Error::from_raw_os_error(sys::BAD_DESCRIPTOR));
    }

    #[test]
    fn test_io_error_without_code() {
        let err = SocketError::from(io::Error::new(io::ErrorKind::InvalidInput, "bad"));
        assert_eq!(err, SystemCondition::InvalidArgument);
    }

    #[test]
    fn test_display_mentions_domain() {
        let text = SocketError::system(sys::CONNECTION_REFUSED).to_string();
        assert!(text.starts_with("system error "), "{text}");
        assert!(SocketError::dns(sys::HOST_NOT_FOUND).to_string().starts_with("dns error "));
    }

    #[test]
    fn test_dns_domain_uses_dns_table() {
        let err = SocketError::dns(sys::HOST_NOT_FOUND);
        assert_eq!(err, DnsCondition::HostNotFound);
        assert_ne!(err.condition(), SystemCondition::Unknown.into());
    }
}
