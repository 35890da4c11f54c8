//! Append-only audit trail of state-changing reservation actions.

use chrono::{DateTime, Utc};
use encore_core::{AppError, AppResult, NonEmptyString, Username};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ConcertId, ReservationId};

/// Unique identifier for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(Uuid);

impl AuditEntryId {
    /// Creates a new random audit entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an audit entry identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditEntryId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// State-changing action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// A seat was reserved.
    Reserve,
    /// A reservation was cancelled.
    Cancel,
}

impl AuditAction {
    /// Returns the stable string form used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::Cancel => "cancel",
        }
    }

    /// Parses the storage string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "reserve" => Ok(Self::Reserve),
            "cancel" => Ok(Self::Cancel),
            other => Err(AppError::Internal(format!("unknown audit action '{other}'"))),
        }
    }
}

/// One immutable entry in the audit trail.
///
/// Written strictly after the mutation it describes has committed; entries
/// are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    username: Username,
    action: AuditAction,
    concert_id: ConcertId,
    concert_name: NonEmptyString,
    reservation_id: Option<ReservationId>,
    detail: String,
    recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an audit entry stamped with the current time.
    #[must_use]
    pub fn new(
        username: Username,
        action: AuditAction,
        concert_id: ConcertId,
        concert_name: NonEmptyString,
        reservation_id: Option<ReservationId>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            username,
            action,
            concert_id,
            concert_name,
            reservation_id,
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }

    /// Rehydrates an audit entry from stored fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: AuditEntryId,
        username: Username,
        action: AuditAction,
        concert_id: ConcertId,
        concert_name: NonEmptyString,
        reservation_id: Option<ReservationId>,
        detail: String,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            action,
            concert_id,
            concert_name,
            reservation_id,
            detail,
            recorded_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> AuditEntryId {
        self.id
    }

    /// Returns the acting username.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the recorded action.
    #[must_use]
    pub fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the concert the action applied to.
    #[must_use]
    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }

    /// Returns the concert name captured when the entry was recorded.
    #[must_use]
    pub fn concert_name(&self) -> &NonEmptyString {
        &self.concert_name
    }

    /// Returns the reservation the action applied to, if any.
    #[must_use]
    pub fn reservation_id(&self) -> Option<ReservationId> {
        self.reservation_id
    }

    /// Returns the free-text detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.detail.as_str()
    }

    /// Returns when the entry was recorded.
    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}
