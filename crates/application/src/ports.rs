//! Storage ports consumed by the application services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_core::{AppResult, NonEmptyString, Username};
use encore_domain::{AuditEntry, Concert, ConcertId, Reservation, ReservationId};

/// Port owning concert capacity records.
///
/// The reserved-seat counter and derived status are mutated exclusively
/// through [`CapacityStore::try_adjust_seats`]; no other code path writes
/// them.
#[async_trait]
pub trait CapacityStore: Send + Sync {
    /// Persists a newly created concert.
    async fn create_concert(&self, concert: Concert) -> AppResult<()>;

    /// Returns one concert by identifier, when present.
    async fn find_concert(&self, concert_id: ConcertId) -> AppResult<Option<Concert>>;

    /// Lists all concerts, newest first.
    async fn list_concerts(&self) -> AppResult<Vec<Concert>>;

    /// Atomically applies a signed seat-count adjustment.
    ///
    /// The store reloads the record, validates the bound against that fresh
    /// read (`SoldOut` on overshoot, `Validation` on undershoot, neither
    /// writing anything), and commits the new counter and derived status as
    /// one conditional write keyed on the version observed at the read.
    /// Fails `Conflict` when another writer moved the version in between;
    /// the caller retries the whole adjustment, not just the write.
    async fn try_adjust_seats(&self, concert_id: ConcertId, delta: i32) -> AppResult<Concert>;

    /// Deletes a concert only while it has zero reserved seats.
    ///
    /// The zero-reservations guard is evaluated atomically with the delete
    /// so it cannot race with a concurrent reserve. Fails `Conflict` when
    /// seats are still held and `NotFound` when the concert is absent.
    async fn delete_if_unreserved(&self, concert_id: ConcertId) -> AppResult<()>;
}

/// Port owning reservation records and their status transitions.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Inserts a new active reservation unless the user already holds one
    /// for the concert.
    ///
    /// The existence check and the insert are one indivisible step (a
    /// uniqueness constraint scoped to active records, not a prior read), so
    /// two racing callers can never both succeed. Fails `DuplicateActive`
    /// when an active reservation for the (user, concert) pair exists;
    /// earlier cancelled reservations for the pair do not count.
    async fn insert_if_absent(
        &self,
        username: Username,
        concert_id: ConcertId,
        concert_name: NonEmptyString,
    ) -> AppResult<Reservation>;

    /// Cancels a reservation owned by the caller, exactly once.
    ///
    /// Fails `NotFound` when the record is absent, `NotOwner` when the
    /// username does not match, and `AlreadyCancelled` when the record is no
    /// longer active. The status transition is conditioned on the record
    /// still being `reserved`, guarding against a concurrent double-cancel.
    async fn cancel_if_owned_and_active(
        &self,
        reservation_id: ReservationId,
        username: &Username,
    ) -> AppResult<Reservation>;

    /// Returns one reservation by identifier, when present.
    async fn find_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> AppResult<Option<Reservation>>;

    /// Lists every reservation made by the user, newest first.
    async fn list_by_user(&self, username: &Username) -> AppResult<Vec<Reservation>>;

    /// Lists active reservations for a concert, newest first.
    async fn list_active_by_concert(&self, concert_id: ConcertId) -> AppResult<Vec<Reservation>>;

    /// Lists all reservations, newest first.
    async fn list_all(&self) -> AppResult<Vec<Reservation>>;
}

/// Port for the append-only audit trail.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit entry. Entries are never updated or deleted.
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()>;

    /// Lists the most recent entries, newest first.
    async fn list_recent(&self, limit: usize) -> AppResult<Vec<AuditEntry>>;

    /// Lists entries recorded for one user, newest first.
    async fn list_by_user(&self, username: &Username) -> AppResult<Vec<AuditEntry>>;

    /// Lists entries recorded for one concert, newest first.
    async fn list_by_concert(&self, concert_id: ConcertId) -> AppResult<Vec<AuditEntry>>;

    /// Lists entries recorded within the inclusive time range, newest first.
    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditEntry>>;
}
