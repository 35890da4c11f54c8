//! In-memory capacity store used by tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use encore_application::CapacityStore;
use encore_core::{AppError, AppResult};
use encore_domain::{Concert, ConcertId};
use tokio::sync::RwLock;

/// In-memory [`CapacityStore`] implementation.
///
/// Every conditional operation runs under a single write guard, so the
/// read-validate-write sequence of an adjustment is indivisible and the
/// version discipline matches the Postgres adapter's observable behavior.
#[derive(Debug, Default)]
pub struct InMemoryCapacityStore {
    concerts: RwLock<HashMap<ConcertId, Concert>>,
}

impl InMemoryCapacityStore {
    /// Creates an empty in-memory capacity store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            concerts: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CapacityStore for InMemoryCapacityStore {
    async fn create_concert(&self, concert: Concert) -> AppResult<()> {
        let mut concerts = self.concerts.write().await;

        if concerts.contains_key(&concert.id()) {
            return Err(AppError::Conflict(format!(
                "concert '{}' already exists",
                concert.id()
            )));
        }

        concerts.insert(concert.id(), concert);
        Ok(())
    }

    async fn find_concert(&self, concert_id: ConcertId) -> AppResult<Option<Concert>> {
        Ok(self.concerts.read().await.get(&concert_id).cloned())
    }

    async fn list_concerts(&self) -> AppResult<Vec<Concert>> {
        let concerts = self.concerts.read().await;

        let mut listed: Vec<Concert> = concerts.values().cloned().collect();
        listed.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(listed)
    }

    async fn try_adjust_seats(&self, concert_id: ConcertId, delta: i32) -> AppResult<Concert> {
        let mut concerts = self.concerts.write().await;

        let concert = concerts
            .get_mut(&concert_id)
            .ok_or_else(|| AppError::NotFound(format!("concert '{concert_id}' does not exist")))?;

        concert.apply_seat_delta(delta)?;
        Ok(concert.clone())
    }

    async fn delete_if_unreserved(&self, concert_id: ConcertId) -> AppResult<()> {
        let mut concerts = self.concerts.write().await;

        let concert = concerts
            .get(&concert_id)
            .ok_or_else(|| AppError::NotFound(format!("concert '{concert_id}' does not exist")))?;

        if concert.reserved_seats() > 0 {
            return Err(AppError::Conflict(format!(
                "concert '{}' cannot be deleted while {} seats are reserved",
                concert_id,
                concert.reserved_seats()
            )));
        }

        concerts.remove(&concert_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use encore_application::CapacityStore;
    use encore_core::AppError;
    use encore_domain::{Concert, ConcertId, ConcertStatus};

    use super::InMemoryCapacityStore;

    fn concert(total_seats: u32) -> Concert {
        Concert::new("The Gig", "", "Main Hall", Utc::now(), total_seats)
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn adjust_updates_count_and_derived_status() {
        let store = InMemoryCapacityStore::new();
        let concert = concert(1);
        let concert_id = concert.id();
        assert!(store.create_concert(concert).await.is_ok());

        let adjusted = store.try_adjust_seats(concert_id, 1).await;
        assert!(adjusted.is_ok());
        let adjusted = adjusted.unwrap_or_else(|_| unreachable!());
        assert_eq!(adjusted.reserved_seats(), 1);
        assert_eq!(adjusted.status(), ConcertStatus::SoldOut);
    }

    #[tokio::test]
    async fn adjust_refuses_overshoot_without_writing() {
        let store = InMemoryCapacityStore::new();
        let concert = concert(1);
        let concert_id = concert.id();
        assert!(store.create_concert(concert).await.is_ok());
        assert!(store.try_adjust_seats(concert_id, 1).await.is_ok());

        let refused = store.try_adjust_seats(concert_id, 1).await;
        assert!(matches!(refused, Err(AppError::SoldOut(_))));

        let stored = store.find_concert(concert_id).await.unwrap_or_default();
        assert!(stored.is_some_and(|concert| concert.reserved_seats() == 1));
    }

    #[tokio::test]
    async fn adjust_fails_not_found_for_unknown_concert() {
        let store = InMemoryCapacityStore::new();
        let result = store.try_adjust_seats(ConcertId::new(), 1).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_refuses_while_seats_are_reserved() {
        let store = InMemoryCapacityStore::new();
        let concert = concert(2);
        let concert_id = concert.id();
        assert!(store.create_concert(concert).await.is_ok());
        assert!(store.try_adjust_seats(concert_id, 1).await.is_ok());

        let refused = store.delete_if_unreserved(concert_id).await;
        assert!(matches!(refused, Err(AppError::Conflict(_))));

        assert!(store.try_adjust_seats(concert_id, -1).await.is_ok());
        assert!(store.delete_if_unreserved(concert_id).await.is_ok());
        let remaining = store.find_concert(concert_id).await.unwrap_or_default();
        assert!(remaining.is_none());
    }
}
