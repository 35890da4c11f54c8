pub mod audit_log;
pub mod concerts;
pub mod health;
pub mod reservations;
