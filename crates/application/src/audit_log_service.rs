//! Read facade over the append-only audit trail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use encore_core::{AppError, AppResult, Username};
use encore_domain::{AuditEntry, ConcertId};

use crate::ports::AuditRepository;

/// Default number of entries returned by recent-entry listings.
const DEFAULT_RECENT_LIMIT: usize = 100;

/// Application service exposing audit trail reads.
#[derive(Clone)]
pub struct AuditLogService {
    audit_repository: Arc<dyn AuditRepository>,
}

impl AuditLogService {
    /// Creates the service from an audit repository implementation.
    #[must_use]
    pub fn new(audit_repository: Arc<dyn AuditRepository>) -> Self {
        Self { audit_repository }
    }

    /// Lists the most recent entries, newest first.
    pub async fn list_recent(&self, limit: Option<usize>) -> AppResult<Vec<AuditEntry>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(1, 1_000);
        self.audit_repository.list_recent(limit).await
    }

    /// Lists entries recorded for one user, newest first.
    pub async fn list_for_user(&self, username: &Username) -> AppResult<Vec<AuditEntry>> {
        self.audit_repository.list_by_user(username).await
    }

    /// Lists entries recorded for one concert, newest first.
    pub async fn list_for_concert(&self, concert_id: ConcertId) -> AppResult<Vec<AuditEntry>> {
        self.audit_repository.list_by_concert(concert_id).await
    }

    /// Lists entries recorded within the inclusive time range, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditEntry>> {
        if end < start {
            return Err(AppError::Validation(
                "range end must not precede range start".to_owned(),
            ));
        }

        self.audit_repository.list_between(start, end).await
    }
}
