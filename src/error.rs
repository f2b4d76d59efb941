use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("start date must not be later than end date")]
    InvalidDateRange,

    #[error("no such user")]
    NoSuchUser,
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("no such trip")]
    NoSuchTrip,
    #[error("trip has already been deleted")]
    TripAlreadyDeleted,
    #[error("logged-in user does not own this trip")]
    NotMatchBetweenUserAndTrip,
    #[error("failed to save trip")]
    TripSaveFailed,

    #[error("no matching itinerary")]
    NoItinerary,
    #[error("itinerary has already been deleted")]
    ItineraryAlreadyDeleted,
    #[error("logged-in user does not own this itinerary")]
    NotMatchBetweenUserAndItinerary,
    #[error("no itinerary entries were given")]
    EmptyItinerary,
    #[error("itinerary order is not a contiguous sequence starting at 1")]
    IncorrectItineraryOrder,
    #[error("itinerary order is duplicated")]
    DuplicateItineraryOrder,
    #[error("departure place is missing")]
    EmptyDeparturePlace,
    #[error("arrival place is missing")]
    EmptyArrivalPlace,
    #[error("illegal itinerary type")]
    IllegalItineraryType,
    #[error("failed to save itinerary")]
    ItinerarySaveFailed,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migrate(_)
            | AppError::Other(_)
            | AppError::TripSaveFailed
            | AppError::ItinerarySaveFailed => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotMatchBetweenUserAndTrip
            | AppError::NotMatchBetweenUserAndItinerary => StatusCode::FORBIDDEN,
            AppError::NoSuchUser | AppError::NoSuchTrip | AppError::NoItinerary => {
                StatusCode::NOT_FOUND
            }
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::BadRequest(_)
            | AppError::InvalidDateRange
            | AppError::TripAlreadyDeleted
            | AppError::ItineraryAlreadyDeleted
            | AppError::EmptyItinerary
            | AppError::IncorrectItineraryOrder
            | AppError::DuplicateItineraryOrder
            | AppError::EmptyDeparturePlace
            | AppError::EmptyArrivalPlace
            | AppError::IllegalItineraryType => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migrate(_)
            | AppError::Other(_) => "INTERNAL_SERVER_ERROR",
            AppError::Token(_) => "INVALID_TOKEN",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::InvalidDateRange => "INVALID_DATE_RANGE",
            AppError::NoSuchUser => "NO_SUCH_USER",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::NoSuchTrip => "NO_SUCH_TRIP",
            AppError::TripAlreadyDeleted => "TRIP_ALREADY_DELETED",
            AppError::NotMatchBetweenUserAndTrip => "NOT_MATCH_BETWEEN_USER_AND_TRIP",
            AppError::TripSaveFailed => "TRIP_SAVE_FAILED",
            AppError::NoItinerary => "NO_ITINERARY",
            AppError::ItineraryAlreadyDeleted => "ITINERARY_ALREADY_DELETED",
            AppError::NotMatchBetweenUserAndItinerary => "NOT_MATCH_BETWEEN_USER_AND_ITINERARY",
            AppError::EmptyItinerary => "EMPTY_ITINERARY",
            AppError::IncorrectItineraryOrder => "INCORRECT_ITINERARY_ORDER",
            AppError::DuplicateItineraryOrder => "DUPLICATE_ITINERARY_ORDER",
            AppError::EmptyDeparturePlace => "EMPTY_DEPARTURE_PLACE",
            AppError::EmptyArrivalPlace => "EMPTY_ARRIVAL_PLACE",
            AppError::IllegalItineraryType => "ILLEGAL_ITINERARY_TYPE",
            AppError::ItinerarySaveFailed => "ITINERARY_SAVE_FAILED",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    status: u16,
    code: &'static str,
    message: String,
    data: Option<()>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "request failed: {self:?}");
        } else {
            debug!(code = self.code(), "request rejected: {self}");
        }

        // Infrastructure details stay in the logs.
        let message = match self.code() {
            "INTERNAL_SERVER_ERROR" => "internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorEnvelope {
            status: status.as_u16(),
            code: self.code(),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}
