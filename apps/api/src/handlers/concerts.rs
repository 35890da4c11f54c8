use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use encore_application::CreateConcertInput;
use encore_domain::ConcertId;
use uuid::Uuid;

use crate::dto::{ConcertResponse, CreateConcertRequest, ReservationResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_concert_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateConcertRequest>,
) -> ApiResult<(StatusCode, Json<ConcertResponse>)> {
    let concert = state
        .concert_service
        .create_concert(CreateConcertInput {
            name: payload.name,
            description: payload.description,
            venue: payload.venue,
            starts_at: payload.starts_at,
            total_seats: payload.total_seats,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ConcertResponse::from(concert))))
}

pub async fn list_concerts_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ConcertResponse>>> {
    let concerts = state
        .concert_service
        .list_concerts()
        .await?
        .into_iter()
        .map(ConcertResponse::from)
        .collect();

    Ok(Json(concerts))
}

pub async fn get_concert_handler(
    State(state): State<AppState>,
    Path(concert_id): Path<Uuid>,
) -> ApiResult<Json<ConcertResponse>> {
    let concert = state
        .concert_service
        .get_concert(ConcertId::from_uuid(concert_id))
        .await?;

    Ok(Json(ConcertResponse::from(concert)))
}

pub async fn delete_concert_handler(
    State(state): State<AppState>,
    Path(concert_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .concert_service
        .delete_concert(ConcertId::from_uuid(concert_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_concert_reservations_handler(
    State(state): State<AppState>,
    Path(concert_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReservationResponse>>> {
    let reservations = state
        .reservation_service
        .list_active_for_concert(ConcertId::from_uuid(concert_id))
        .await?
        .into_iter()
        .map(ReservationResponse::from)
        .collect();

    Ok(Json(reservations))
}
