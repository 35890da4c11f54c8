//! Concert administration: creation, lookup, and guarded deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use encore_core::{AppError, AppResult};
use encore_domain::{Concert, ConcertId};

use crate::ports::CapacityStore;

/// Validated input for creating a concert.
#[derive(Debug, Clone)]
pub struct CreateConcertInput {
    /// Concert name; must be non-empty.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Venue name.
    pub venue: String,
    /// When the concert starts.
    pub starts_at: DateTime<Utc>,
    /// Fixed capacity; must be at least 1.
    pub total_seats: u32,
}

/// Application service for concert administration.
#[derive(Clone)]
pub struct ConcertService {
    capacity_store: Arc<dyn CapacityStore>,
}

impl ConcertService {
    /// Creates the service from a capacity store implementation.
    #[must_use]
    pub fn new(capacity_store: Arc<dyn CapacityStore>) -> Self {
        Self { capacity_store }
    }

    /// Creates a new concert with zero reserved seats.
    pub async fn create_concert(&self, input: CreateConcertInput) -> AppResult<Concert> {
        let concert = Concert::new(
            input.name,
            input.description,
            input.venue,
            input.starts_at,
            input.total_seats,
        )?;

        self.capacity_store.create_concert(concert.clone()).await?;
        Ok(concert)
    }

    /// Lists all concerts, newest first.
    pub async fn list_concerts(&self) -> AppResult<Vec<Concert>> {
        self.capacity_store.list_concerts().await
    }

    /// Returns one concert by identifier.
    pub async fn get_concert(&self, concert_id: ConcertId) -> AppResult<Concert> {
        self.capacity_store
            .find_concert(concert_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("concert '{concert_id}' does not exist")))
    }

    /// Deletes a concert, refusing while any seat is still reserved.
    ///
    /// The guard is evaluated atomically inside the store against the same
    /// reserved-count field the orchestrator adjusts, so it cannot race with
    /// a concurrent reserve.
    pub async fn delete_concert(&self, concert_id: ConcertId) -> AppResult<()> {
        self.capacity_store.delete_if_unreserved(concert_id).await
    }
}
