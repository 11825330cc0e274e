//! Error Conditions
//!
//! Portable classification of socket and resolver failures.
//!
//! ## Overview
//!
//! Platforms report failures with their own numeric codes: errno on POSIX,
//! `WSA*` on Windows and `EAI_*` from the resolver. Each platform supplies
//! two tables that translate those codes into the enums below:
//!
//! - the system table, for socket calls
//! - the DNS table, for name resolution
//!
//! Some conditions also belong to a coarser [`GenericCondition`] group.
//! This lets callers branch on "nothing reachable there" without listing
//! every specific cause.
//!
//! Two lookups are provided. Each takes a table and a native code.
//!
//! - [`default_condition`] gives the one canonical condition for the code.
//! - [`equivalent`] checks whether the code satisfies a condition. It
//!   accepts the code's generic group as well as its specific condition.
//!
//! Codes missing from a table map to [`SystemCondition::Unknown`].
//!
//! ## See Also
//!
//! - [`crate::error`]: the error value carrying a domain and native code

use std::fmt;

/// Conditions reported by socket system calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemCondition {
    Success,
    /// Code missing from the platform table
    Unknown,
    /// Code that should never come back from the call that produced it
    Unexpected,
    InvalidArgument,
    PermissionDenied,
    OperationNotPermitted,
    /// Non-blocking operation would have blocked
    TryAgain,
    InProgress,
    Already,
    Interrupted,
    OutOfMemory,
    ProcessLimitReached,
    SystemLimitReached,
    ProtocolNotSupported,
    ConnectionRefused,
    ConnectionReset,
    BrokenPipe,
    Shutdown,
    AlreadyInUse,
    AddressNotAvailable,
    ConnectionAborted,
    NetworkUnreachable,
    HostDown,
    HostUnreachable,
    Timeout,
    NotConnected,
    /// Peer closed the stream in an orderly way
    EndOfFile,
}

/// Conditions reported by name resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsCondition {
    HostNotFound,
    /// Temporary resolver failure
    HostNotFoundTryAgain,
    /// Name exists but has no address of the requested family
    NoAddress,
}

/// Coarse groups shared by several specific conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericCondition {
    /// The target cannot be reached or refused the connection
    NoDestination,
    /// Memory or descriptor exhaustion
    NoResources,
    /// The established connection is gone
    Disconnected,
}

/// Any portable condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    System(SystemCondition),
    Dns(DnsCondition),
    Generic(GenericCondition),
}

impl From<SystemCondition> for Condition {
    fn from(condition: SystemCondition) -> Self {
        Condition::System(condition)
    }
}

impl From<DnsCondition> for Condition {
    fn from(condition: DnsCondition) -> Self {
        Condition::Dns(condition)
    }
}

impl From<GenericCondition> for Condition {
    fn from(condition: GenericCondition) -> Self {
        Condition::Generic(condition)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::System(c) => write!(f, "{c:?}"),
            Condition::Dns(c) => write!(f, "{c:?}"),
            Condition::Generic(c) => write!(f, "{c:?}"),
        }
    }
}

/// One row of a platform translation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorMapping {
    /// Platform error code
    pub native: i32,
    /// Canonical condition for the code
    pub condition: Condition,
    /// Coarse group the code also satisfies, if any
    pub generic: Option<GenericCondition>,
}

impl ErrorMapping {
    /// Row for a system code without a generic group
    pub const fn system(native: i32, condition: SystemCondition) -> Self {
        Self {
            native,
            condition: Condition::System(condition),
            generic: None,
        }
    }

    /// Row for a system code that also belongs to `generic`
    pub const fn grouped(
        native: i32,
        condition: SystemCondition,
        generic: GenericCondition,
    ) -> Self {
        Self {
            native,
            condition: Condition::System(condition),
            generic: Some(generic),
        }
    }

    /// Row for a resolver code
    pub const fn dns(native: i32, condition: DnsCondition) -> Self {
        Self {
            native,
            condition: Condition::Dns(condition),
            generic: None,
        }
    }
}

fn lookup(table: &[ErrorMapping], native: i32) -> Option<&ErrorMapping> {
    table.iter().find(|row| row.native == native)
}

/// Canonical condition for `native`, or `Unknown` if the table lacks it
pub fn default_condition(table: &[ErrorMapping], native: i32) -> Condition {
    lookup(table, native)
        .map(|row| row.condition)
        .unwrap_or(Condition::System(SystemCondition::Unknown))
}

/// Whether `native` satisfies `condition`, directly or through its generic group
pub fn equivalent(table: &[ErrorMapping], native: i32, condition: Condition) -> bool {
    match lookup(table, native) {
        Some(row) => {
            row.condition == condition || row.generic.map(Condition::Generic) == Some(condition)
        }
        None => condition == Condition::System(SystemCondition::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[ErrorMapping] = &[
        ErrorMapping::system(0, SystemCondition::Success),
        ErrorMapping::grouped(
            10,
            SystemCondition::ConnectionRefused,
            GenericCondition::NoDestination,
        ),
        ErrorMapping::system(11, SystemCondition::TryAgain),
        ErrorMapping::system(12, SystemCondition::TryAgain),
        ErrorMapping::dns(20, DnsCondition::NoAddress),
    ];

    #[test]
    fn test_default_condition() {
        assert_eq!(
            default_condition(TABLE, 10),
            Condition::System(SystemCondition::ConnectionRefused)
        );
        assert_eq!(default_condition(TABLE, 20), DnsCondition::NoAddress.into());
    }

    #[test]
    fn test_unmapped_is_unknown() {
        assert_eq!(default_condition(TABLE, 99), SystemCondition::Unknown.into());
        assert!(equivalent(TABLE, 99, SystemCondition::Unknown.into()));
        assert!(!equivalent(TABLE, 99, SystemCondition::Success.into()));
    }

    #[test]
    fn test_equivalent_specific_and_generic() {
        assert!(equivalent(TABLE, 10, SystemCondition::ConnectionRefused.into()));
        assert!(equivalent(TABLE, 10, GenericCondition::NoDestination.into()));
        assert!(!equivalent(TABLE, 10, GenericCondition::Disconnected.into()));
        assert!(!equivalent(TABLE, 11, GenericCondition::NoDestination.into()));
    }

    #[test]
    fn test_aliases_share_condition() {
        assert_eq!(default_condition(TABLE, 11), default_condition(TABLE, 12));
    }

    #[test]
    fn test_condition_display() {
        assert_eq!(Condition::from(GenericCondition::NoResources).to_string(), "NoResources");
        assert_eq!(Condition::from(SystemCondition::EndOfFile).to_string(), "EndOfFile");
    }
}
