//! Reservation records and their single status transition.

use chrono::{DateTime, Utc};
use encore_core::{AppError, AppResult, NonEmptyString, Username};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ConcertId;

/// Unique identifier for a reservation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(Uuid);

impl ReservationId {
    /// Creates a new random reservation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a reservation identifier from an existing UUID value.
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

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Status of a reservation.
///
/// The only transition is `Reserved` to `Cancelled`, taken exactly once;
/// `Cancelled` is terminal and records are never physically deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// The reservation holds one seat.
    Reserved,
    /// The reservation was cancelled and its seat released.
    Cancelled,
}

impl ReservationStatus {
    /// Returns the stable string form used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the storage string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "reserved" => Ok(Self::Reserved),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppError::Internal(format!(
                "unknown reservation status '{other}'"
            ))),
        }
    }
}

/// A user's claim on one unit of a concert's capacity.
///
/// Carries a snapshot of the concert name taken at creation time; the
/// snapshot is never refreshed if the concert is later renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    username: Username,
    concert_id: ConcertId,
    concert_name: NonEmptyString,
    status: ReservationStatus,
    reserved_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Creates a new active reservation stamped with the current time.
    #[must_use]
    pub fn new(username: Username, concert_id: ConcertId, concert_name: NonEmptyString) -> Self {
        Self {
            id: ReservationId::new(),
            username,
            concert_id,
            concert_name,
            status: ReservationStatus::Reserved,
            reserved_at: Utc::now(),
            cancelled_at: None,
        }
    }

    /// Rehydrates a reservation from stored fields.
    pub fn from_stored(
        id: ReservationId,
        username: Username,
        concert_id: ConcertId,
        concert_name: NonEmptyString,
        status: ReservationStatus,
        reserved_at: DateTime<Utc>,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        if matches!(status, ReservationStatus::Cancelled) != cancelled_at.is_some() {
            return Err(AppError::Internal(format!(
                "stored reservation '{id}' has status '{}' but cancelled_at {}",
                status.as_str(),
                if cancelled_at.is_some() {
                    "set"
                } else {
                    "missing"
                }
            )));
        }

        Ok(Self {
            id,
            username,
            concert_id,
            concert_name,
            status,
            reserved_at,
            cancelled_at,
        })
    }

    /// Returns the reservation identifier.
    #[must_use]
    pub fn id(&self) -> ReservationId {
        self.id
    }

    /// Returns the owning username.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the reserved concert identifier.
    #[must_use]
    pub fn concert_id(&self) -> ConcertId {
        self.concert_id
    }

    /// Returns the concert name captured at reservation time.
    #[must_use]
    pub fn concert_name(&self) -> &NonEmptyString {
        &self.concert_name
    }

    /// Returns the reservation status.
    #[must_use]
    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Returns whether the reservation still holds a seat.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Reserved
    }

    /// Returns when the reservation was made.
    #[must_use]
    pub fn reserved_at(&self) -> DateTime<Utc> {
        self.reserved_at
    }

    /// Returns when the reservation was cancelled, if it was.
    #[must_use]
    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Transitions the reservation to `Cancelled`, exactly once.
    ///
    /// Fails `AlreadyCancelled` on a repeated attempt; there is no path back
    /// to `Reserved`.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.status == ReservationStatus::Cancelled {
            return Err(AppError::AlreadyCancelled(format!(
                "reservation '{}' was already cancelled",
                self.id
            )));
        }

        self.status = ReservationStatus::Cancelled;
        self.cancelled_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use encore_core::{AppError, NonEmptyString, Username};

    use super::{Reservation, ReservationStatus};
    use crate::ConcertId;

    fn reservation() -> Reservation {
        let username = Username::new("alice").unwrap_or_else(|_| unreachable!());
        let name = NonEmptyString::new("The Gig").unwrap_or_else(|_| unreachable!());
        Reservation::new(username, ConcertId::new(), name)
    }

    #[test]
    fn new_reservation_is_active_without_cancellation_stamp() {
        let reservation = reservation();
        assert_eq!(reservation.status(), ReservationStatus::Reserved);
        assert!(reservation.is_active());
        assert!(reservation.cancelled_at().is_none());
    }

    #[test]
    fn cancel_stamps_time_and_is_terminal() {
        let mut reservation = reservation();
        let now = Utc::now();
        assert!(reservation.cancel(now).is_ok());
        assert_eq!(reservation.status(), ReservationStatus::Cancelled);
        assert_eq!(reservation.cancelled_at(), Some(now));

        let second = reservation.cancel(Utc::now());
        assert!(matches!(second, Err(AppError::AlreadyCancelled(_))));
        assert_eq!(reservation.cancelled_at(), Some(now));
    }

    #[test]
    fn from_stored_rejects_status_stamp_mismatch() {
        let source = reservation();
        let rebuilt = Reservation::from_stored(
            source.id(),
            source.username().clone(),
            source.concert_id(),
            source.concert_name().clone(),
            ReservationStatus::Cancelled,
            source.reserved_at(),
            None,
        );
        assert!(matches!(rebuilt, Err(AppError::Internal(_))));
    }
}
