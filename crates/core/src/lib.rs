//! Shared primitives for all Rust crates in Encore.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Encore crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Caller identity supplied by the request layer.
///
/// The core trusts the username as given; there is no authentication stack
/// in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Creates a validated username (non-empty, trimmed).
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "username must not be empty".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying username string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl Display for Username {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
///
/// Every user-visible failure maps to exactly one of these kinds; no kind is
/// reported as another.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The concert has no seats left.
    #[error("sold out: {0}")]
    SoldOut(String),

    /// The concert was cancelled and is no longer bookable.
    #[error("concert cancelled: {0}")]
    ConcertCancelled(String),

    /// The user already holds an active reservation for the concert.
    #[error("duplicate reservation: {0}")]
    DuplicateActive(String),

    /// Cancellation attempted by a user who does not own the reservation.
    #[error("not owner: {0}")]
    NotOwner(String),

    /// The reservation was already cancelled.
    #[error("already cancelled: {0}")]
    AlreadyCancelled(String),

    /// Transient optimistic-concurrency collision; the operation may be
    /// retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A cross-record invariant could not be restored after a partial
    /// failure; needs operator attention, not a retry.
    #[error("reconciliation required: {0}")]
    ReconciliationRequired(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the error is a transient conflict worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
