use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use encore_core::Username;
use encore_domain::{ConcertId, ReservationId};
use uuid::Uuid;

use crate::dto::{
    CancelReservationRequest, CancelResponse, CreateReservationRequest, ReservationResponse,
    ReserveResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_reservation_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateReservationRequest>,
) -> ApiResult<(StatusCode, Json<ReserveResponse>)> {
    let username = Username::new(payload.username)?;
    let outcome = state
        .reservation_service
        .reserve(username, ConcertId::from_uuid(payload.concert_id))
        .await?;

    Ok((StatusCode::CREATED, Json(ReserveResponse::from(outcome))))
}

pub async fn cancel_reservation_handler(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
    Json(payload): Json<CancelReservationRequest>,
) -> ApiResult<Json<CancelResponse>> {
    let username = Username::new(payload.username)?;
    let outcome = state
        .reservation_service
        .cancel(ReservationId::from_uuid(reservation_id), &username)
        .await?;

    Ok(Json(CancelResponse::from(outcome)))
}

pub async fn get_reservation_handler(
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> ApiResult<Json<ReservationResponse>> {
    let reservation = state
        .reservation_service
        .find_reservation(ReservationId::from_uuid(reservation_id))
        .await?;

    Ok(Json(ReservationResponse::from(reservation)))
}

pub async fn list_reservations_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ReservationResponse>>> {
    let reservations = state
        .reservation_service
        .list_all_reservations()
        .await?
        .into_iter()
        .map(ReservationResponse::from)
        .collect();

    Ok(Json(reservations))
}

pub async fn list_user_reservations_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<ReservationResponse>>> {
    let username = Username::new(username)?;
    let reservations = state
        .reservation_service
        .list_reservations_for_user(&username)
        .await?
        .into_iter()
        .map(ReservationResponse::from)
        .collect();

    Ok(Json(reservations))
}
