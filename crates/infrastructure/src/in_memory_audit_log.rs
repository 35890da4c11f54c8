//! In-memory audit trail used by tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use encore_application::AuditRepository;
use encore_core::{AppResult, Username};
use encore_domain::{AuditEntry, ConcertId};
use tokio::sync::RwLock;

/// In-memory append-only [`AuditRepository`] implementation.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    /// Creates an empty in-memory audit log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

fn newest_first(entries: &mut [AuditEntry]) {
    entries.sort_by(|left, right| right.recorded_at().cmp(&left.recorded_at()));
}

#[async_trait]
impl AuditRepository for InMemoryAuditLog {
    async fn append_entry(&self, entry: AuditEntry) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<AuditEntry> = entries.clone();
        newest_first(&mut listed);
        listed.truncate(limit);
        Ok(listed)
    }

    async fn list_by_user(&self, username: &Username) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<AuditEntry> = entries
            .iter()
            .filter(|entry| entry.username() == username)
            .cloned()
            .collect();
        newest_first(&mut listed);
        Ok(listed)
    }

    async fn list_by_concert(&self, concert_id: ConcertId) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<AuditEntry> = entries
            .iter()
            .filter(|entry| entry.concert_id() == concert_id)
            .cloned()
            .collect();
        newest_first(&mut listed);
        Ok(listed)
    }

    async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<AuditEntry> = entries
            .iter()
            .filter(|entry| entry.recorded_at() >= start && entry.recorded_at() <= end)
            .cloned()
            .collect();
        newest_first(&mut listed);
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use encore_application::AuditRepository;
    use encore_core::{NonEmptyString, Username};
    use encore_domain::{AuditAction, AuditEntry, ConcertId};

    use super::InMemoryAuditLog;

    fn entry(username: &str, concert_id: ConcertId) -> AuditEntry {
        AuditEntry::new(
            Username::new(username).unwrap_or_else(|_| unreachable!()),
            AuditAction::Reserve,
            concert_id,
            NonEmptyString::new("The Gig").unwrap_or_else(|_| unreachable!()),
            None,
            "reserved a seat",
        )
    }

    #[tokio::test]
    async fn listings_filter_by_user_and_concert() {
        let audit_log = InMemoryAuditLog::new();
        let left_concert = ConcertId::new();
        let right_concert = ConcertId::new();

        assert!(audit_log.append_entry(entry("alice", left_concert)).await.is_ok());
        assert!(audit_log.append_entry(entry("bob", right_concert)).await.is_ok());

        let alice = Username::new("alice").unwrap_or_else(|_| unreachable!());
        let for_alice = audit_log.list_by_user(&alice).await.unwrap_or_default();
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].concert_id(), left_concert);

        let for_right = audit_log
            .list_by_concert(right_concert)
            .await
            .unwrap_or_default();
        assert_eq!(for_right.len(), 1);
        assert_eq!(for_right[0].username().as_str(), "bob");
    }

    #[tokio::test]
    async fn range_listing_is_inclusive_and_bounded() {
        let audit_log = InMemoryAuditLog::new();
        let concert_id = ConcertId::new();
        assert!(audit_log.append_entry(entry("alice", concert_id)).await.is_ok());

        let now = Utc::now();
        let inside = audit_log
            .list_between(now - Duration::minutes(1), now + Duration::minutes(1))
            .await
            .unwrap_or_default();
        assert_eq!(inside.len(), 1);

        let outside = audit_log
            .list_between(now + Duration::minutes(1), now + Duration::minutes(2))
            .await
            .unwrap_or_default();
        assert!(outside.is_empty());
    }
}
