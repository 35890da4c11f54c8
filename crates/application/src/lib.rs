//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_service;
mod concert_service;
mod ports;
mod reservation_service;

pub use audit_log_service::AuditLogService;
pub use concert_service::{ConcertService, CreateConcertInput};
pub use ports::{AuditRepository, CapacityStore, ReservationLedger};
pub use reservation_service::{CancellationOutcome, ReservationOutcome, ReservationService};
