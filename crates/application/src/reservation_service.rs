//! Reservation orchestration: the transactional coordinator for seat
//! capacity, the reservation ledger, and the audit trail.

use std::sync::Arc;
use std::time::Duration;

use encore_core::{AppError, AppResult, Username};
use encore_domain::{
    AuditAction, AuditEntry, Concert, ConcertId, ConcertStatus, Reservation, ReservationId,
};
use tracing::warn;

use crate::ports::{AuditRepository, CapacityStore, ReservationLedger};

/// Attempts per seat adjustment before a `Conflict` is surfaced.
const MAX_ADJUST_ATTEMPTS: u32 = 4;

/// Base backoff between adjustment attempts; doubles per attempt.
const ADJUST_BACKOFF_BASE_MS: u64 = 10;

/// Result of a successful reserve operation.
///
/// `audit_recorded` is false when the mutation committed but the audit
/// append failed; the reservation itself stands.
#[derive(Debug, Clone)]
pub struct ReservationOutcome {
    /// The created reservation.
    pub reservation: Reservation,
    /// Whether the audit entry for the action was persisted.
    pub audit_recorded: bool,
}

/// Result of a successful cancel operation.
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    /// The cancelled reservation.
    pub reservation: Reservation,
    /// Human-readable confirmation.
    pub message: String,
    /// Whether the audit entry for the action was persisted.
    pub audit_recorded: bool,
}

/// Application service coordinating reserve and cancel across the capacity
/// store, the reservation ledger, and the audit trail.
///
/// No global lock serializes requests; correctness rests on the conditional
/// writes each port guarantees. Transient `Conflict` rejections from the
/// capacity store are retried here with bounded jittered backoff.
#[derive(Clone)]
pub struct ReservationService {
    capacity_store: Arc<dyn CapacityStore>,
    ledger: Arc<dyn ReservationLedger>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl ReservationService {
    /// Creates the service from its port implementations.
    #[must_use]
    pub fn new(
        capacity_store: Arc<dyn CapacityStore>,
        ledger: Arc<dyn ReservationLedger>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            capacity_store,
            ledger,
            audit_repository,
        }
    }

    /// Reserves one seat for the user on the concert.
    ///
    /// Sequence: advisory status check, atomic ledger insert, authoritative
    /// capacity increment. A `SoldOut` from the increment compensates by
    /// cancelling the just-inserted reservation before surfacing `SoldOut`,
    /// so the ledger never holds more active reservations than seats.
    pub async fn reserve(
        &self,
        username: Username,
        concert_id: ConcertId,
    ) -> AppResult<ReservationOutcome> {
        let concert = self.require_concert(concert_id).await?;

        // Advisory fast path; the authoritative check is the conditional
        // increment below.
        match concert.status() {
            ConcertStatus::Cancelled => {
                return Err(AppError::ConcertCancelled(format!(
                    "concert '{}' was cancelled",
                    concert.name()
                )));
            }
            ConcertStatus::SoldOut => {
                return Err(AppError::SoldOut(format!(
                    "concert '{}' is sold out",
                    concert.name()
                )));
            }
            ConcertStatus::Active => {}
        }

        let reservation = self
            .ledger
            .insert_if_absent(username.clone(), concert_id, concert.name().clone())
            .await?;

        if let Err(error) = self.adjust_seats_with_retry(concert_id, 1).await {
            return Err(self
                .compensate_failed_reserve(&reservation, &username, error)
                .await);
        }

        let audit_recorded = self
            .append_audit(AuditEntry::new(
                username,
                AuditAction::Reserve,
                concert_id,
                concert.name().clone(),
                Some(reservation.id()),
                format!("reserved a seat for concert '{}'", concert.name()),
            ))
            .await;

        Ok(ReservationOutcome {
            reservation,
            audit_recorded,
        })
    }

    /// Cancels the user's reservation and releases its seat.
    ///
    /// Ledger errors (`NotFound`, `NotOwner`, `AlreadyCancelled`) propagate
    /// untouched. Once the ledger transition has committed, a seat release
    /// that still fails after retries surfaces `ReconciliationRequired`
    /// rather than pretending the books balance.
    pub async fn cancel(
        &self,
        reservation_id: ReservationId,
        username: &Username,
    ) -> AppResult<CancellationOutcome> {
        let reservation = self
            .ledger
            .cancel_if_owned_and_active(reservation_id, username)
            .await?;

        if let Err(error) = self
            .adjust_seats_with_retry(reservation.concert_id(), -1)
            .await
        {
            warn!(
                reservation_id = %reservation.id(),
                concert_id = %reservation.concert_id(),
                %error,
                "seat release failed after reservation was cancelled"
            );
            return Err(AppError::ReconciliationRequired(format!(
                "reservation '{}' is cancelled but its seat on concert '{}' \
                 could not be released: {error}",
                reservation.id(),
                reservation.concert_id()
            )));
        }

        let audit_recorded = self
            .append_audit(AuditEntry::new(
                username.clone(),
                AuditAction::Cancel,
                reservation.concert_id(),
                reservation.concert_name().clone(),
                Some(reservation.id()),
                format!(
                    "cancelled reservation for concert '{}'",
                    reservation.concert_name()
                ),
            ))
            .await;

        let message = format!(
            "reservation for '{}' cancelled",
            reservation.concert_name()
        );

        Ok(CancellationOutcome {
            reservation,
            message,
            audit_recorded,
        })
    }

    /// Returns one reservation by identifier.
    pub async fn find_reservation(&self, reservation_id: ReservationId) -> AppResult<Reservation> {
        self.ledger
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("reservation '{reservation_id}' does not exist"))
            })
    }

    /// Lists every reservation made by the user, newest first.
    pub async fn list_reservations_for_user(
        &self,
        username: &Username,
    ) -> AppResult<Vec<Reservation>> {
        self.ledger.list_by_user(username).await
    }

    /// Lists active reservations for a concert, newest first.
    pub async fn list_active_for_concert(
        &self,
        concert_id: ConcertId,
    ) -> AppResult<Vec<Reservation>> {
        self.ledger.list_active_by_concert(concert_id).await
    }

    /// Lists all reservations, newest first.
    pub async fn list_all_reservations(&self) -> AppResult<Vec<Reservation>> {
        self.ledger.list_all().await
    }

    async fn require_concert(&self, concert_id: ConcertId) -> AppResult<Concert> {
        self.capacity_store
            .find_concert(concert_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("concert '{concert_id}' does not exist")))
    }

    /// Applies a seat adjustment, retrying lost optimistic-concurrency races
    /// a bounded number of times with jittered backoff. Non-conflict errors
    /// return immediately.
    async fn adjust_seats_with_retry(
        &self,
        concert_id: ConcertId,
        delta: i32,
    ) -> AppResult<Concert> {
        let mut attempt = 0;
        loop {
            match self.capacity_store.try_adjust_seats(concert_id, delta).await {
                Err(error) if error.is_retryable() && attempt + 1 < MAX_ADJUST_ATTEMPTS => {
                    attempt += 1;
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
                other => return other,
            }
        }
    }

    /// Undoes the ledger insert after the authoritative capacity check
    /// refused the seat, then maps the failure for the caller.
    async fn compensate_failed_reserve(
        &self,
        reservation: &Reservation,
        username: &Username,
        adjust_error: AppError,
    ) -> AppError {
        if let Err(compensation_error) = self
            .ledger
            .cancel_if_owned_and_active(reservation.id(), username)
            .await
        {
            warn!(
                reservation_id = %reservation.id(),
                concert_id = %reservation.concert_id(),
                %compensation_error,
                "failed to compensate reservation after capacity rejection"
            );
            return AppError::ReconciliationRequired(format!(
                "reservation '{}' was inserted but no seat was granted and the \
                 compensating cancel failed: {compensation_error}",
                reservation.id()
            ));
        }

        match adjust_error {
            AppError::SoldOut(message) => AppError::SoldOut(message),
            other => other,
        }
    }

    /// Appends an audit entry after the mutation it describes committed.
    /// Failures degrade the outcome instead of rolling anything back.
    async fn append_audit(&self, entry: AuditEntry) -> bool {
        let action = entry.action();
        let entry_id = entry.id();
        match self.audit_repository.append_entry(entry).await {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    audit_entry_id = %entry_id,
                    action = action.as_str(),
                    %error,
                    "audit append failed after committed mutation"
                );
                false
            }
        }
    }
}

/// Exponential backoff with a small random jitter so racing writers spread
/// out instead of colliding again in lockstep.
fn backoff_delay(attempt: u32) -> Duration {
    let base = ADJUST_BACKOFF_BASE_MS.saturating_mul(1 << attempt.min(6));
    let mut jitter_bytes = [0u8; 2];
    let jitter = match getrandom::fill(&mut jitter_bytes) {
        Ok(()) => u64::from(u16::from_le_bytes(jitter_bytes)) % ADJUST_BACKOFF_BASE_MS,
        Err(_) => 0,
    };
    Duration::from_millis(base + jitter)
}
