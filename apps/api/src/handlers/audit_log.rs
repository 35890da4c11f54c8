use axum::Json;
use axum::extract::{Query, State};
use encore_core::{AppError, Username};
use encore_domain::ConcertId;

use crate::dto::{AuditEntryResponse, AuditLogQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditEntryResponse>>> {
    let entries = match (query.start, query.end) {
        (Some(start), Some(end)) => state.audit_log_service.list_between(start, end).await?,
        (Some(_), None) | (None, Some(_)) => {
            return Err(
                AppError::Validation("start and end must be provided together".to_owned()).into(),
            );
        }
        (None, None) => {
            if let Some(username) = query.username {
                let username = Username::new(username)?;
                state.audit_log_service.list_for_user(&username).await?
            } else if let Some(concert_id) = query.concert_id {
                state
                    .audit_log_service
                    .list_for_concert(ConcertId::from_uuid(concert_id))
                    .await?
            } else {
                state.audit_log_service.list_recent(query.limit).await?
            }
        }
    };

    Ok(Json(entries.into_iter().map(AuditEntryResponse::from).collect()))
}
