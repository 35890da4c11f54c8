//! PostgreSQL-backed capacity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_application::CapacityStore;
use encore_core::{AppError, AppResult, NonEmptyString};
use encore_domain::{Concert, ConcertId, ConcertStatus};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed [`CapacityStore`] implementation.
///
/// Seat adjustments use optimistic concurrency: the row is read, validated
/// in the domain entity, and written back conditioned on the version column
/// observed at the read. A lost race surfaces as `Conflict` and the caller
/// retries the whole adjustment.
#[derive(Clone)]
pub struct PostgresCapacityStore {
    pool: PgPool,
}

impl PostgresCapacityStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_concert(&self, concert_id: ConcertId) -> AppResult<Option<Concert>> {
        let row = sqlx::query_as::<_, ConcertRow>(
            r#"
            SELECT id, name, description, venue, starts_at, total_seats,
                   reserved_seats, status, version, created_at
            FROM concerts
            WHERE id = $1
            "#,
        )
        .bind(concert_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load concert '{concert_id}': {error}"))
        })?;

        row.map(ConcertRow::into_concert).transpose()
    }
}

#[derive(Debug, FromRow)]
struct ConcertRow {
    id: Uuid,
    name: String,
    description: String,
    venue: String,
    starts_at: DateTime<Utc>,
    total_seats: i32,
    reserved_seats: i32,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl ConcertRow {
    fn into_concert(self) -> AppResult<Concert> {
        let total_seats = u32::try_from(self.total_seats).map_err(|_| {
            AppError::Internal(format!(
                "stored concert '{}' has negative total seats",
                self.id
            ))
        })?;
        let reserved_seats = u32::try_from(self.reserved_seats).map_err(|_| {
            AppError::Internal(format!(
                "stored concert '{}' has negative reserved seats",
                self.id
            ))
        })?;

        Concert::from_stored(
            ConcertId::from_uuid(self.id),
            NonEmptyString::new(self.name)?,
            self.description,
            self.venue,
            self.starts_at,
            total_seats,
            reserved_seats,
            ConcertStatus::parse(self.status.as_str())?,
            self.version,
            self.created_at,
        )
    }
}

#[async_trait]
impl CapacityStore for PostgresCapacityStore {
    async fn create_concert(&self, concert: Concert) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO concerts (
                id, name, description, venue, starts_at, total_seats,
                reserved_seats, status, version, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(concert.id().as_uuid())
        .bind(concert.name().as_str())
        .bind(concert.description())
        .bind(concert.venue())
        .bind(concert.starts_at())
        .bind(i64::from(concert.total_seats()))
        .bind(i64::from(concert.reserved_seats()))
        .bind(concert.status().as_str())
        .bind(concert.version())
        .bind(concert.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to create concert '{}': {error}",
                concert.id()
            ))
        })?;

        Ok(())
    }

    async fn find_concert(&self, concert_id: ConcertId) -> AppResult<Option<Concert>> {
        self.load_concert(concert_id).await
    }

    async fn list_concerts(&self) -> AppResult<Vec<Concert>> {
        let rows = sqlx::query_as::<_, ConcertRow>(
            r#"
            SELECT id, name, description, venue, starts_at, total_seats,
                   reserved_seats, status, version, created_at
            FROM concerts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list concerts: {error}")))?;

        rows.into_iter().map(ConcertRow::into_concert).collect()
    }

    async fn try_adjust_seats(&self, concert_id: ConcertId, delta: i32) -> AppResult<Concert> {
        let observed = self
            .load_concert(concert_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("concert '{concert_id}' does not exist")))?;
        let observed_version = observed.version();

        // Bound checks and status derivation happen in the entity against
        // the freshly read counters; nothing is written when they refuse.
        let mut adjusted = observed;
        adjusted.apply_seat_delta(delta)?;

        let updated = sqlx::query(
            r#"
            UPDATE concerts
            SET reserved_seats = $2, status = $3, version = $4
            WHERE id = $1 AND version = $5
            "#,
        )
        .bind(concert_id.as_uuid())
        .bind(i64::from(adjusted.reserved_seats()))
        .bind(adjusted.status().as_str())
        .bind(adjusted.version())
        .bind(observed_version)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to adjust seats for concert '{concert_id}': {error}"
            ))
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "concert '{concert_id}' was modified concurrently"
            )));
        }

        Ok(adjusted)
    }

    async fn delete_if_unreserved(&self, concert_id: ConcertId) -> AppResult<()> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM concerts
            WHERE id = $1 AND reserved_seats = 0
            "#,
        )
        .bind(concert_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete concert '{concert_id}': {error}"))
        })?;

        if deleted.rows_affected() == 0 {
            return match self.load_concert(concert_id).await? {
                Some(concert) => Err(AppError::Conflict(format!(
                    "concert '{concert_id}' cannot be deleted while {} seats are reserved",
                    concert.reserved_seats()
                ))),
                None => Err(AppError::NotFound(format!(
                    "concert '{concert_id}' does not exist"
                ))),
            };
        }

        Ok(())
    }
}
