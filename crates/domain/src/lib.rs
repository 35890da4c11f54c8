//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod concert;
mod reservation;

pub use audit::{AuditAction, AuditEntry, AuditEntryId};
pub use concert::{Concert, ConcertId, ConcertStatus};
pub use reservation::{Reservation, ReservationId, ReservationStatus};
