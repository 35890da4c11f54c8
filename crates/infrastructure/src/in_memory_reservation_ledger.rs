//! In-memory reservation ledger used by tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use encore_application::ReservationLedger;
use encore_core::{AppError, AppResult, NonEmptyString, Username};
use encore_domain::{ConcertId, Reservation, ReservationId};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct LedgerState {
    reservations: HashMap<ReservationId, Reservation>,
    // Uniqueness constraint scoped to active records: one entry per
    // (username, concert) pair holding a reserved-status record.
    active_pairs: HashMap<(Username, ConcertId), ReservationId>,
}

/// In-memory [`ReservationLedger`] implementation.
///
/// A single lock guards both the records and the active-pair index, so the
/// duplicate check and the insert are one indivisible step, as are the
/// ownership check and the cancel transition.
#[derive(Debug, Default)]
pub struct InMemoryReservationLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryReservationLedger {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
        }
    }
}

#[async_trait]
impl ReservationLedger for InMemoryReservationLedger {
    async fn insert_if_absent(
        &self,
        username: Username,
        concert_id: ConcertId,
        concert_name: NonEmptyString,
    ) -> AppResult<Reservation> {
        let mut state = self.state.write().await;

        let pair = (username.clone(), concert_id);
        if state.active_pairs.contains_key(&pair) {
            return Err(AppError::DuplicateActive(format!(
                "user '{username}' already holds an active reservation for concert '{concert_id}'"
            )));
        }

        let reservation = Reservation::new(username, concert_id, concert_name);
        state.active_pairs.insert(pair, reservation.id());
        state
            .reservations
            .insert(reservation.id(), reservation.clone());

        Ok(reservation)
    }

    async fn cancel_if_owned_and_active(
        &self,
        reservation_id: ReservationId,
        username: &Username,
    ) -> AppResult<Reservation> {
        let mut state = self.state.write().await;

        let reservation = state.reservations.get_mut(&reservation_id).ok_or_else(|| {
            AppError::NotFound(format!("reservation '{reservation_id}' does not exist"))
        })?;

        if reservation.username() != username {
            return Err(AppError::NotOwner(format!(
                "reservation '{reservation_id}' belongs to another user"
            )));
        }

        reservation.cancel(Utc::now())?;
        let cancelled = reservation.clone();

        state
            .active_pairs
            .remove(&(username.clone(), cancelled.concert_id()));

        Ok(cancelled)
    }

    async fn find_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> AppResult<Option<Reservation>> {
        Ok(self
            .state
            .read()
            .await
            .reservations
            .get(&reservation_id)
            .cloned())
    }

    async fn list_by_user(&self, username: &Username) -> AppResult<Vec<Reservation>> {
        let state = self.state.read().await;

        let mut listed: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|reservation| reservation.username() == username)
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.reserved_at().cmp(&left.reserved_at()));
        Ok(listed)
    }

    async fn list_active_by_concert(&self, concert_id: ConcertId) -> AppResult<Vec<Reservation>> {
        let state = self.state.read().await;

        let mut listed: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|reservation| reservation.concert_id() == concert_id && reservation.is_active())
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.reserved_at().cmp(&left.reserved_at()));
        Ok(listed)
    }

    async fn list_all(&self) -> AppResult<Vec<Reservation>> {
        let state = self.state.read().await;

        let mut listed: Vec<Reservation> = state.reservations.values().cloned().collect();
        listed.sort_by(|left, right| right.reserved_at().cmp(&left.reserved_at()));
        Ok(listed)
    }
}

#[cfg(test)]
mod tests;
