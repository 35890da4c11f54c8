//! Request and response payloads for the HTTP surface.

use chrono::{DateTime, Utc};
use encore_application::{CancellationOutcome, ReservationOutcome};
use encore_domain::{AuditEntry, Concert, Reservation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Generic confirmation payload.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Payload for creating a concert.
#[derive(Debug, Deserialize)]
pub struct CreateConcertRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub total_seats: u32,
}

/// API representation of a concert.
#[derive(Debug, Serialize)]
pub struct ConcertResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub venue: String,
    pub starts_at: DateTime<Utc>,
    pub total_seats: u32,
    pub reserved_seats: u32,
    pub available_seats: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Concert> for ConcertResponse {
    fn from(value: Concert) -> Self {
        Self {
            id: value.id().as_uuid(),
            name: value.name().as_str().to_owned(),
            description: value.description().to_owned(),
            venue: value.venue().to_owned(),
            starts_at: value.starts_at(),
            total_seats: value.total_seats(),
            reserved_seats: value.reserved_seats(),
            available_seats: value.available_seats(),
            status: value.status().as_str().to_owned(),
            created_at: value.created_at(),
        }
    }
}

/// Payload for reserving a seat.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub username: String,
    pub concert_id: Uuid,
}

/// Payload for cancelling a reservation; identifies the requesting user.
#[derive(Debug, Deserialize)]
pub struct CancelReservationRequest {
    pub username: String,
}

/// API representation of a reservation.
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub username: String,
    pub concert_id: Uuid,
    pub concert_name: String,
    pub status: String,
    pub reserved_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        Self {
            id: value.id().as_uuid(),
            username: value.username().as_str().to_owned(),
            concert_id: value.concert_id().as_uuid(),
            concert_name: value.concert_name().as_str().to_owned(),
            status: value.status().as_str().to_owned(),
            reserved_at: value.reserved_at(),
            cancelled_at: value.cancelled_at(),
        }
    }
}

/// Response for a successful reserve.
#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    pub reservation: ReservationResponse,
    /// False when the reservation stands but its audit entry was lost.
    pub audit_recorded: bool,
}

impl From<ReservationOutcome> for ReserveResponse {
    fn from(value: ReservationOutcome) -> Self {
        Self {
            reservation: ReservationResponse::from(value.reservation),
            audit_recorded: value.audit_recorded,
        }
    }
}

/// Response for a successful cancellation.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub message: String,
    pub reservation: ReservationResponse,
    pub audit_recorded: bool,
}

impl From<CancellationOutcome> for CancelResponse {
    fn from(value: CancellationOutcome) -> Self {
        Self {
            message: value.message,
            reservation: ReservationResponse::from(value.reservation),
            audit_recorded: value.audit_recorded,
        }
    }
}

/// API representation of an audit entry.
#[derive(Debug, Serialize)]
pub struct AuditEntryResponse {
    pub id: Uuid,
    pub username: String,
    pub action: String,
    pub concert_id: Uuid,
    pub concert_name: String,
    pub reservation_id: Option<Uuid>,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryResponse {
    fn from(value: AuditEntry) -> Self {
        Self {
            id: value.id().as_uuid(),
            username: value.username().as_str().to_owned(),
            action: value.action().as_str().to_owned(),
            concert_id: value.concert_id().as_uuid(),
            concert_name: value.concert_name().as_str().to_owned(),
            reservation_id: value.reservation_id().map(|id| id.as_uuid()),
            detail: value.detail().to_owned(),
            recorded_at: value.recorded_at(),
        }
    }
}

/// Query filters for the audit log listing.
///
/// `start`/`end` take precedence over `username`, which takes precedence
/// over `concert_id`; with no filter the most recent entries are returned.
#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub username: Option<String>,
    pub concert_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}
