/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: The full cause chain is available via [`std::error::Error::source`].
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of transfer errors.
///
/// Callers can pattern-match on the kind to distinguish a deliberate pause
/// ([`ErrorKind::Cancelled`]) from an execution failure, and an execution
/// failure from a checksum disagreement ([`ErrorKind::IntegrityMismatch`]).
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues (e.g. a part size override that
    /// contradicts the checkpoint being resumed)
    InvalidParameter,

    /// The initiate call against the remote service failed
    InitiateFailed,

    /// A single part transfer failed against the remote service
    PartFailed(PartFailed),

    /// The finalize call against the remote service failed
    FinalizeFailed,

    /// The combined part checksum disagrees with the checksum reported by
    /// the remote service at finalize time. Never retried automatically.
    IntegrityMismatch,

    /// Cooperative cancellation was observed. The checkpoint is retained so
    /// the transfer can be resumed.
    Cancelled,

    /// I/O errors (source reads, checkpoint persistence)
    IOError,

    /// Some kind of internal runtime issue (e.g. task failure, poisoned mutex, etc)
    RuntimeError,
}

/// Stores information about a failed part transfer
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartFailed {
    part_number: u64,
}

impl PartFailed {
    /// The 1-based number of the part that failed
    pub fn part_number(&self) -> u64 {
        self.part_number
    }
}

impl Error {
    /// Creates a new transfer [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InvalidParameter => write!(f, "invalid input"),
            ErrorKind::InitiateFailed => write!(f, "failed to initiate transfer"),
            ErrorKind::PartFailed(part_failed) => {
                write!(f, "failed to transfer part {}", part_failed.part_number)
            }
            ErrorKind::FinalizeFailed => write!(f, "failed to finalize transfer"),
            ErrorKind::IntegrityMismatch => write!(f, "combined checksum mismatch"),
            ErrorKind::Cancelled => write!(f, "operation cancelled"),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error
where
    T: Send + Sync + 'static,
{
    fn from(value: std::sync::PoisonError<T>) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InvalidParameter, err)
}

pub(crate) fn initiate_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InitiateFailed, err)
}

pub(crate) fn part_failed<E>(part_number: u64, err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::PartFailed(PartFailed { part_number }), err)
}

pub(crate) fn finalize_failed<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::FinalizeFailed, err)
}

pub(crate) fn integrity_mismatch(expected: u64, actual: u64) -> Error {
    Error::new(
        ErrorKind::IntegrityMismatch,
        format!("expected combined checksum {expected}, remote service reported {actual}"),
    )
}

static CANCELLATION_ERROR: &str =
    "cancellation observed, no new parts dispatched; checkpoint retained for resume";

pub(crate) fn operation_cancelled() -> Error {
    Error::new(ErrorKind::Cancelled, CANCELLATION_ERROR)
}
