//! PostgreSQL-backed append-only audit trail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_application::AuditRepository;
use encore_core::{AppError, AppResult, NonEmptyString, Username};
use encore_domain::{AuditAction, AuditEntry, AuditEntryId, ConcertId, ReservationId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed [`AuditRepository`] implementation.
#[derive(Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditEntryRow {
    id: Uuid,
    username: String,
    action: String,
    concert_id: Uuid,
    concert_name: String,
    reservation_id: Option<Uuid>,
    detail: String,
    recorded_at: DateTime<Utc>,
}

impl AuditEntryRow {
    fn into_entry(self) -> AppResult<AuditEntry> {
        Ok(AuditEntry::from_stored(
            AuditEntryId::from_uuid(self.id),
            Username::new(self.username)?,
            AuditAction::parse(self.action.as_str())?,
            ConcertId::from_uuid(self.concert_id),
            NonEmptyString::new(self.concert_name)?,
            self.reservation_id.map(ReservationId::from_uuid),
            self.detail,
            self.recorded_at,
        ))
    }
}

const AUDIT_COLUMNS: &str =
    "id, username, action, concert_id, concert_name, reservation_id, detail, recorded_at";

#[async_trait]
impl AuditRepository for PostgresAuditLog {
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (
                id, username, action, concert_id, concert_name,
                reservation_id, detail, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.username().as_str())
        .bind(entry.action().as_str())
        .bind(entry.concert_id().as_uuid())
        .bind(entry.concert_name().as_str())
        .bind(entry.reservation_id().map(|id| id.as_uuid()))
        .bind(entry.detail())
        .bind(entry.recorded_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append audit entry '{}': {error}", entry.id()))
        })?;

        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<AuditEntry>> {
        let capped_limit = i64::try_from(limit.clamp(1, 1_000)).unwrap_or(1_000);
        let rows = sqlx::query_as::<_, AuditEntryRow>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_entries
            ORDER BY recorded_at DESC
            LIMIT $1
            "#,
        ))
        .bind(capped_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit entries: {error}")))?;

        rows.into_iter().map(AuditEntryRow::into_entry).collect()
    }

    async fn list_by_user(&self, username: &Username) -> AppResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_entries
            WHERE username = $1
            ORDER BY recorded_at DESC
            "#,
        ))
        .bind(username.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list audit entries for user '{username}': {error}"
            ))
        })?;

        rows.into_iter().map(AuditEntryRow::into_entry).collect()
    }

    async fn list_by_concert(&self, concert_id: ConcertId) -> AppResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_entries
            WHERE concert_id = $1
            ORDER BY recorded_at DESC
            "#,
        ))
        .bind(concert_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list audit entries for concert '{concert_id}': {error}"
            ))
        })?;

        rows.into_iter().map(AuditEntryRow::into_entry).collect()
    }

    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(&format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_entries
            WHERE recorded_at >= $1 AND recorded_at <= $2
            ORDER BY recorded_at DESC
            "#,
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit entries by range: {error}"))
        })?;

        rows.into_iter().map(AuditEntryRow::into_entry).collect()
    }
}
