//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_log;
mod in_memory_capacity_store;
mod in_memory_reservation_ledger;
mod postgres_audit_log;
mod postgres_capacity_store;
mod postgres_reservation_ledger;

pub use in_memory_audit_log::InMemoryAuditLog;
pub use in_memory_capacity_store::InMemoryCapacityStore;
pub use in_memory_reservation_ledger::InMemoryReservationLedger;
pub use postgres_audit_log::PostgresAuditLog;
pub use postgres_capacity_store::PostgresCapacityStore;
pub use postgres_reservation_ledger::PostgresReservationLedger;
