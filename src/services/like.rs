use std::sync::Arc;

use tracing::info;

use crate::{
    error::AppError,
    models::{like::LikeResponse, trip::TripResponse},
    repositories::LikeRepository,
    services::{locks::TripLocks, trip::TripService},
};

#[derive(Clone)]
pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    trips: TripService,
    locks: TripLocks,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikeRepository>, trips: TripService, locks: TripLocks) -> Self {
        Self {
            likes,
            trips,
            locks,
        }
    }

    /// Flips the caller's like on an active trip and adjusts its count. The
    /// read, the flip and the count change share one hold of the trip lock.
    pub async fn toggle_like(&self, user_id: i64, trip_id: i64) -> Result<LikeResponse, AppError> {
        let _guard = self.locks.acquire(trip_id).await;

        self.trips.get_trip_by_trip_id(trip_id).await?;

        let liked = match self.likes.find(user_id, trip_id).await? {
            Some(like) => !like.is_like,
            None => true,
        };
        self.likes.save(user_id, trip_id, liked).await?;
        let likes_count = self.trips.adjust_likes_count(trip_id, liked).await?;

        info!(trip_id, user_id, liked, likes_count, "trip like toggled");
        Ok(LikeResponse {
            trip_id,
            liked,
            likes_count,
        })
    }

    pub async fn get_liked_trips(&self, user_id: i64) -> Result<Vec<TripResponse>, AppError> {
        let trip_ids = self.likes.find_liked_trip_ids(user_id).await?;
        self.trips.get_trips_by_ids(&trip_ids).await
    }
}
