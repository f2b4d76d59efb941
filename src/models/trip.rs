use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    error::AppError,
    models::itinerary::{Itinerary, ItineraryResponse},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_domestic: bool,
    pub likes_count: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub itineraries: Vec<Itinerary>,
}

impl Trip {
    pub fn from_row(row: TripRow, itineraries: Vec<Itinerary>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            is_domestic: row.is_domestic,
            likes_count: row.likes_count,
            deleted_at: row.deleted_at,
            itineraries,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    pub fn likes(&self) -> i64 {
        self.likes_count.unwrap_or(0)
    }

    /// Adds one like, or removes one without going below zero.
    pub fn adjust_likes(&mut self, increase: bool) {
        let current = self.likes();
        self.likes_count = Some(if increase {
            current + 1
        } else {
            (current - 1).max(0)
        });
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) -> Result<(), AppError> {
        if self.is_deleted() {
            return Err(AppError::TripAlreadyDeleted);
        }
        self.deleted_at = Some(at);
        Ok(())
    }

    pub fn update_from(&mut self, request: &TripRequest) {
        self.name = request.trip_name.trim().to_string();
        self.start_date = request.start_date;
        self.end_date = request.end_date;
        self.is_domestic = request.is_domestic;
    }

    /// Drops soft-deleted itineraries and sorts the rest by order index.
    pub fn retain_active_itineraries(&mut self) {
        self.itineraries.retain(|itinerary| !itinerary.is_deleted());
        self.itineraries.sort_by_key(|itinerary| itinerary.order);
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_domestic: bool,
    pub likes_count: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub user_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_domestic: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripRequest {
    pub trip_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_domestic")]
    pub is_domestic: bool,
}

fn default_domestic() -> bool {
    true
}

impl TripRequest {
    /// Request-level checks the HTTP layer runs before calling the service.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.trip_name.trim().is_empty() {
            return Err(AppError::BadRequest("trip name must not be empty".into()));
        }
        if self.start_date > self.end_date {
            return Err(AppError::InvalidDateRange);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripResponse {
    pub trip_id: i64,
    pub trip_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_domestic: bool,
    pub likes_count: i64,
}

impl From<&Trip> for TripResponse {
    fn from(trip: &Trip) -> Self {
        Self {
            trip_id: trip.id,
            trip_name: trip.name.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            is_domestic: trip.is_domestic,
            likes_count: trip.likes(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TripDetailResponse {
    #[serde(flatten)]
    pub trip: TripResponse,
    pub itineraries: Vec<ItineraryResponse>,
}

impl From<&Trip> for TripDetailResponse {
    fn from(trip: &Trip) -> Self {
        Self {
            trip: TripResponse::from(trip),
            itineraries: trip
                .itineraries
                .iter()
                .filter(|itinerary| !itinerary.is_deleted())
                .map(ItineraryResponse::from)
                .collect(),
        }
    }
}
