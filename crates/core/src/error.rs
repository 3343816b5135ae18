//! Error model for observed targets.
//!
//! The facility never translates failures: whatever an original method or an
//! observer returns is carried to the caller unchanged, wrapped only in the
//! variant that says where it came from.

use thiserror::Error;

/// Failure raised by a method implementation (the original behavior).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MethodError {
    /// An argument was missing or had the wrong shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The method ran but refused to complete.
    #[error("method failed: {0}")]
    Failed(String),
}

impl MethodError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Failure raised by an observer callback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("observer failed: {0}")]
    Failed(String),

    /// The observer called back into a target and that call failed.
    #[error("nested call failed: {0}")]
    Nested(Box<CallError>),
}

impl ObserverError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl From<CallError> for ObserverError {
    fn from(value: CallError) -> Self {
        Self::Nested(Box::new(value))
    }
}

/// Error returned by a call on a target (wrapped, silent or quiet).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The target has no method slot with this name.
    #[error("no such method: {0}")]
    NoSuchMethod(String),

    /// The wrapped method itself failed; no observer was notified.
    #[error(transparent)]
    Method(#[from] MethodError),

    /// An observer failed; observers after it were not notified.
    #[error(transparent)]
    Observer(#[from] ObserverError),

    /// The target state lock was poisoned by a panicking method.
    #[error("target state lock poisoned")]
    Poisoned,
}

/// Error returned when installing a control surface on a target.
///
/// Setup validates everything before touching the target, so on error the
/// target is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GazeError {
    #[error("watch list is empty")]
    EmptyWatchList,

    #[error("method listed twice: {0}")]
    DuplicateMethod(String),

    #[error("target has no method named {0}")]
    UnknownMethod(String),

    /// A surface is already installed under this name.
    #[error("surface already installed: {0}")]
    SurfaceTaken(String),
}
