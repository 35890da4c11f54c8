use encore_application::{AuditLogService, ConcertService, ReservationService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub concert_service: ConcertService,
    pub reservation_service: ReservationService,
    pub audit_log_service: AuditLogService,
}
