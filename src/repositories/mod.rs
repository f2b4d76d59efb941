//! Persistence gateways consumed by the services.

mod sqlite;

pub use sqlite::{
    SqliteItineraryRepository, SqliteLikeRepository, SqliteTripRepository, SqliteUserRepository,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        itinerary::{Itinerary, NewItinerary},
        like::LikeTrip,
        trip::{NewTrip, Trip},
        user::{NewUser, User},
    },
};

/// Trips are returned with every stored itinerary attached, deleted ones
/// included; read paths filter them.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn insert(&self, trip: &NewTrip) -> Result<Option<Trip>, AppError>;

    /// Writes name, dates and domesticity. `None` when the trip is missing or
    /// already deleted.
    async fn update_details(&self, trip: &Trip) -> Result<Option<Trip>, AppError>;

    /// `None` when the trip is missing or already deleted.
    async fn update_likes_count(
        &self,
        trip_id: i64,
        likes_count: i64,
    ) -> Result<Option<Trip>, AppError>;

    /// Marks the trip and its active itineraries deleted at `at` in one
    /// transaction. `None`, with nothing written, when the trip is missing
    /// or already deleted.
    async fn soft_delete_with_itineraries(
        &self,
        trip_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Trip>, AppError>;

    async fn find_by_id(&self, trip_id: i64) -> Result<Option<Trip>, AppError>;

    async fn find_all(&self) -> Result<Vec<Trip>, AppError>;

    async fn find_by_name_contains(&self, keyword: &str) -> Result<Vec<Trip>, AppError>;

    async fn find_all_by_user(&self, user_id: i64) -> Result<Vec<Trip>, AppError>;
}

#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    async fn save(&self, itinerary: &Itinerary) -> Result<Option<Itinerary>, AppError>;

    /// Writes every entry in one transaction.
    async fn save_all(&self, itineraries: &[Itinerary]) -> Result<Vec<Itinerary>, AppError>;

    /// Inserts every entry in one transaction, preserving input order.
    async fn insert_all(&self, itineraries: &[NewItinerary]) -> Result<Vec<Itinerary>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn insert(&self, user: &NewUser) -> Result<User, AppError>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find(&self, user_id: i64, trip_id: i64) -> Result<Option<LikeTrip>, AppError>;

    async fn save(&self, user_id: i64, trip_id: i64, is_like: bool)
        -> Result<LikeTrip, AppError>;

    async fn find_liked_trip_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError>;
}
