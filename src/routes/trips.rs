use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{
        like::LikeResponse,
        trip::{TripDetailResponse, TripRequest, TripResponse},
        ResponseDto,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(insert_trip))
        .route("/mine", get(my_trips))
        .route("/liked", get(liked_trips))
        .route(
            "/:trip_id",
            get(trip_detail).put(update_trip).delete(delete_trip),
        )
        .route("/:trip_id/like", post(toggle_like))
}

#[derive(Deserialize)]
struct SearchQuery {
    keyword: Option<String>,
}

async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ResponseDto<Vec<TripResponse>>>, AppError> {
    let Some(keyword) = query.keyword.filter(|keyword| !keyword.is_empty()) else {
        let trips = state.trips.get_all_trips().await?;
        return Ok(Json(ResponseDto::ok("all trips", trips)));
    };

    let trips = state.trips.get_trip_by_keyword(&keyword).await?;
    let message = if trips.is_empty() {
        "no trips found"
    } else {
        "trip search complete"
    };
    Ok(Json(ResponseDto::ok(message, trips)))
}

async fn insert_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(request): Json<TripRequest>,
) -> Result<Json<ResponseDto<TripResponse>>, AppError> {
    let user = current.require_user()?;
    request.validate()?;
    let trip = state.trips.insert_trip(user.id, &request).await?;
    Ok(Json(ResponseDto::ok("trip created", trip)))
}

async fn my_trips(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ResponseDto<Vec<TripResponse>>>, AppError> {
    let user = current.require_user()?;
    let trips = state.trips.get_trips_by_user_id(user.id).await?;
    Ok(Json(ResponseDto::ok("my trips", trips)))
}

async fn liked_trips(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ResponseDto<Vec<TripResponse>>>, AppError> {
    let user = current.require_user()?;
    let trips = state.likes.get_liked_trips(user.id).await?;
    Ok(Json(ResponseDto::ok("liked trips", trips)))
}

async fn trip_detail(
    State(state): State<AppState>,
    Path(trip_id): Path<i64>,
) -> Result<Json<ResponseDto<TripDetailResponse>>, AppError> {
    let detail = state.trips.get_trip_detail(trip_id).await?;
    Ok(Json(ResponseDto::ok("trip detail", detail)))
}

async fn update_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Json(request): Json<TripRequest>,
) -> Result<Json<ResponseDto<TripResponse>>, AppError> {
    let user = current.require_user()?;
    request.validate()?;
    let trip = state.trips.update_trip(user.id, trip_id, &request).await?;
    Ok(Json(ResponseDto::ok("trip updated", trip)))
}

async fn delete_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<ResponseDto<TripResponse>>, AppError> {
    let user = current.require_user()?;
    let trip = state.trips.delete_trip(user.id, trip_id).await?;
    Ok(Json(ResponseDto::ok("trip deleted", trip)))
}

async fn toggle_like(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<ResponseDto<LikeResponse>>, AppError> {
    let user = current.require_user()?;
    let like = state.likes.toggle_like(user.id, trip_id).await?;
    Ok(Json(ResponseDto::ok("like toggled", like)))
}
