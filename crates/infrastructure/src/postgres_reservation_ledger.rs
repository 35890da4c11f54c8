//! PostgreSQL-backed reservation ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_application::ReservationLedger;
use encore_core::{AppError, AppResult, NonEmptyString, Username};
use encore_domain::{ConcertId, Reservation, ReservationId, ReservationStatus};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed [`ReservationLedger`] implementation.
///
/// The at-most-one-active-reservation rule is a partial unique index on
/// `(username, concert_id) WHERE status = 'reserved'`, so the duplicate
/// check and the insert are a single step inside the database. Cancellation
/// is a compare-and-set on the status column.
#[derive(Clone)]
pub struct PostgresReservationLedger {
    pool: PgPool,
}

impl PostgresReservationLedger {
    /// Creates a ledger with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReservationRow {
    id: Uuid,
    username: String,
    concert_id: Uuid,
    concert_name: String,
    status: String,
    reserved_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl ReservationRow {
    fn into_reservation(self) -> AppResult<Reservation> {
        Reservation::from_stored(
            ReservationId::from_uuid(self.id),
            Username::new(self.username)?,
            ConcertId::from_uuid(self.concert_id),
            NonEmptyString::new(self.concert_name)?,
            ReservationStatus::parse(self.status.as_str())?,
            self.reserved_at,
            self.cancelled_at,
        )
    }
}

const RESERVATION_COLUMNS: &str =
    "id, username, concert_id, concert_name, status, reserved_at, cancelled_at";

#[async_trait]
impl ReservationLedger for PostgresReservationLedger {
    async fn insert_if_absent(
        &self,
        username: Username,
        concert_id: ConcertId,
        concert_name: NonEmptyString,
    ) -> AppResult<Reservation> {
        let reservation = Reservation::new(username, concert_id, concert_name);

        sqlx::query(
            r#"
            INSERT INTO reservations (
                id, username, concert_id, concert_name, status, reserved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reservation.id().as_uuid())
        .bind(reservation.username().as_str())
        .bind(reservation.concert_id().as_uuid())
        .bind(reservation.concert_name().as_str())
        .bind(reservation.status().as_str())
        .bind(reservation.reserved_at())
        .execute(&self.pool)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(database_error) if database_error.is_unique_violation() => {
                AppError::DuplicateActive(format!(
                    "user '{}' already holds an active reservation for concert '{concert_id}'",
                    reservation.username()
                ))
            }
            _ => AppError::Internal(format!(
                "failed to insert reservation for concert '{concert_id}': {error}"
            )),
        })?;

        Ok(reservation)
    }

    async fn cancel_if_owned_and_active(
        &self,
        reservation_id: ReservationId,
        username: &Username,
    ) -> AppResult<Reservation> {
        let existing = self.find_reservation(reservation_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("reservation '{reservation_id}' does not exist"))
        })?;

        if existing.username() != username {
            return Err(AppError::NotOwner(format!(
                "reservation '{reservation_id}' belongs to another user"
            )));
        }

        // CAS on the status column: a concurrent cancel that got there first
        // leaves zero rows for this update.
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            UPDATE reservations
            SET status = 'cancelled', cancelled_at = $2
            WHERE id = $1 AND status = 'reserved'
            RETURNING {RESERVATION_COLUMNS}
            "#,
        ))
        .bind(reservation_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to cancel reservation '{reservation_id}': {error}"
            ))
        })?;

        match row {
            Some(row) => row.into_reservation(),
            None => Err(AppError::AlreadyCancelled(format!(
                "reservation '{reservation_id}' was already cancelled"
            ))),
        }
    }

    async fn find_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> AppResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE id = $1
            "#,
        ))
        .bind(reservation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load reservation '{reservation_id}': {error}"
            ))
        })?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn list_by_user(&self, username: &Username) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE username = $1
            ORDER BY reserved_at DESC
            "#,
        ))
        .bind(username.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list reservations for user '{username}': {error}"
            ))
        })?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    async fn list_active_by_concert(&self, concert_id: ConcertId) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            WHERE concert_id = $1 AND status = 'reserved'
            ORDER BY reserved_at DESC
            "#,
        ))
        .bind(concert_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list reservations for concert '{concert_id}': {error}"
            ))
        })?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    async fn list_all(&self) -> AppResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS}
            FROM reservations
            ORDER BY reserved_at DESC
            "#,
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list reservations: {error}")))?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }
}
