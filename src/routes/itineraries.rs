use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        itinerary::{ItineraryDeleteRequest, ItineraryRequest, ItineraryResponse},
        ResponseDto,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/:trip_id/itineraries",
        get(list_itineraries)
            .post(insert_itineraries)
            .put(update_itineraries)
            .delete(delete_itineraries),
    )
}

async fn list_itineraries(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> Result<Json<ResponseDto<Vec<ItineraryResponse>>>, AppError> {
    let itineraries = state.itineraries.get_itineraries_by_trip_id(trip_id).await?;
    Ok(Json(ResponseDto::ok("itineraries", itineraries)))
}

async fn insert_itineraries(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Json(requests): Json<Vec<ItineraryRequest>>,
) -> Result<Json<ResponseDto<Vec<ItineraryResponse>>>, AppError> {
    let user = current.require_user()?;
    let created = state
        .itineraries
        .insert_itineraries(trip_id, user.id, &requests)
        .await?;
    Ok(Json(ResponseDto::ok("itineraries inserted", created)))
}

async fn update_itineraries(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Json(requests): Json<Vec<ItineraryRequest>>,
) -> Result<Json<ResponseDto<Vec<ItineraryResponse>>>, AppError> {
    let user = current.require_user()?;
    let updated = state
        .itineraries
        .update_itineraries(trip_id, user.id, &requests)
        .await?;
    Ok(Json(ResponseDto::ok("itineraries updated", updated)))
}

async fn delete_itineraries(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Json(request): Json<ItineraryDeleteRequest>,
) -> Result<Json<ResponseDto<Vec<i64>>>, AppError> {
    let user = current.require_user()?;
    let deleted = state
        .itineraries
        .delete_itineraries(trip_id, user.id, &request.itinerary_ids)
        .await?;
    Ok(Json(ResponseDto::ok("itineraries deleted", deleted)))
}
