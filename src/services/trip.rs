use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    error::AppError,
    models::trip::{NewTrip, Trip, TripDetailResponse, TripRequest, TripResponse},
    repositories::TripRepository,
    services::{locks::TripLocks, user::UserService},
};

/// Every write to a trip row runs under that trip's entry in `TripLocks`.
#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn TripRepository>,
    users: UserService,
    locks: TripLocks,
}

impl TripService {
    pub fn new(trips: Arc<dyn TripRepository>, users: UserService, locks: TripLocks) -> Self {
        Self {
            trips,
            users,
            locks,
        }
    }

    /// Loads an active trip with its active itineraries sorted by order.
    pub async fn get_trip_by_trip_id(&self, trip_id: i64) -> Result<Trip, AppError> {
        let mut trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .ok_or(AppError::NoSuchTrip)?;

        if trip.is_deleted() {
            return Err(AppError::TripAlreadyDeleted);
        }

        trip.retain_active_itineraries();
        Ok(trip)
    }

    pub async fn get_trip_detail(&self, trip_id: i64) -> Result<TripDetailResponse, AppError> {
        let trip = self.get_trip_by_trip_id(trip_id).await?;
        Ok(TripDetailResponse::from(&trip))
    }

    pub async fn get_all_trips(&self) -> Result<Vec<TripResponse>, AppError> {
        let trips = self.trips.find_all().await?;
        Ok(active_responses(&trips))
    }

    pub async fn get_trip_by_keyword(&self, keyword: &str) -> Result<Vec<TripResponse>, AppError> {
        let trips = self.trips.find_by_name_contains(keyword).await?;
        debug!(keyword, hits = trips.len(), "trip keyword search");
        Ok(active_responses(&trips))
    }

    pub async fn get_trips_by_user_id(&self, user_id: i64) -> Result<Vec<TripResponse>, AppError> {
        let trips = self.trips.find_all_by_user(user_id).await?;
        Ok(active_responses(&trips))
    }

    /// Active trips among `trip_ids`, silently skipping missing or deleted ones.
    pub async fn get_trips_by_ids(&self, trip_ids: &[i64]) -> Result<Vec<TripResponse>, AppError> {
        let mut responses = Vec::with_capacity(trip_ids.len());
        for trip_id in trip_ids {
            if let Some(trip) = self.trips.find_by_id(*trip_id).await? {
                if !trip.is_deleted() {
                    responses.push(TripResponse::from(&trip));
                }
            }
        }
        Ok(responses)
    }

    /// Date order is checked by the caller.
    pub async fn insert_trip(
        &self,
        user_id: i64,
        request: &TripRequest,
    ) -> Result<TripResponse, AppError> {
        let user = self.users.get_user(user_id).await?;

        let trip = NewTrip {
            user_id: user.id,
            name: request.trip_name.trim().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            is_domestic: request.is_domestic,
        };

        let saved = self
            .trips
            .insert(&trip)
            .await?
            .ok_or(AppError::TripSaveFailed)?;
        info!(trip_id = saved.id, user_id, "trip created");
        Ok(TripResponse::from(&saved))
    }

    pub async fn update_trip(
        &self,
        user_id: i64,
        trip_id: i64,
        request: &TripRequest,
    ) -> Result<TripResponse, AppError> {
        let _guard = self.locks.acquire(trip_id).await;

        let mut trip = self.get_trip_by_trip_id(trip_id).await?;
        ensure_owner(user_id, &trip)?;

        trip.update_from(request);

        let saved = self
            .trips
            .update_details(&trip)
            .await?
            .ok_or(AppError::TripAlreadyDeleted)?;
        info!(trip_id, user_id, "trip updated");
        Ok(TripResponse::from(&saved))
    }

    /// Soft-deletes the trip and every active itinerary under it.
    pub async fn delete_trip(&self, user_id: i64, trip_id: i64) -> Result<TripResponse, AppError> {
        let _guard = self.locks.acquire(trip_id).await;

        let mut trip = self.get_trip_by_trip_id(trip_id).await?;
        ensure_owner(user_id, &trip)?;

        let now = Utc::now();
        trip.soft_delete(now)?;

        let saved = self
            .trips
            .soft_delete_with_itineraries(trip.id, now)
            .await?
            .ok_or(AppError::TripAlreadyDeleted)?;
        info!(
            trip_id,
            user_id,
            itineraries = trip.itineraries.len(),
            "trip deleted"
        );
        Ok(TripResponse::from(&saved))
    }

    /// Returns the like count after the adjustment.
    pub async fn update_likes_count(&self, trip_id: i64, increase: bool) -> Result<i64, AppError> {
        let _guard = self.locks.acquire(trip_id).await;
        self.adjust_likes_count(trip_id, increase).await
    }

    /// Like-count change for callers that already hold the trip lock.
    pub(crate) async fn adjust_likes_count(
        &self,
        trip_id: i64,
        increase: bool,
    ) -> Result<i64, AppError> {
        let mut trip = self.get_trip_by_trip_id(trip_id).await?;
        trip.adjust_likes(increase);

        let saved = self
            .trips
            .update_likes_count(trip.id, trip.likes())
            .await?
            .ok_or(AppError::TripAlreadyDeleted)?;
        debug!(trip_id, increase, likes = saved.likes(), "likes adjusted");
        Ok(saved.likes())
    }
}

fn ensure_owner(user_id: i64, trip: &Trip) -> Result<(), AppError> {
    if trip.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(AppError::NotMatchBetweenUserAndTrip)
    }
}

fn active_responses(trips: &[Trip]) -> Vec<TripResponse> {
    trips
        .iter()
        .filter(|trip| !trip.is_deleted())
        .map(TripResponse::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;
    use crate::{
        repositories::SqliteTripRepository,
        services::testing::{japan_trip_request, Fixture},
    };

    /// Sleeps after every lookup so a second call can start mid-operation.
    struct StallingTrips {
        inner: SqliteTripRepository,
        stall: Duration,
    }

    #[async_trait]
    impl TripRepository for StallingTrips {
        async fn insert(&self, trip: &NewTrip) -> Result<Option<Trip>, AppError> {
            self.inner.insert(trip).await
        }

        async fn update_details(&self, trip: &Trip) -> Result<Option<Trip>, AppError> {
            self.inner.update_details(trip).await
        }

        async fn update_likes_count(
            &self,
            trip_id: i64,
            likes_count: i64,
        ) -> Result<Option<Trip>, AppError> {
            self.inner.update_likes_count(trip_id, likes_count).await
        }

        async fn soft_delete_with_itineraries(
            &self,
            trip_id: i64,
            at: DateTime<Utc>,
        ) -> Result<Option<Trip>, AppError> {
            self.inner.soft_delete_with_itineraries(trip_id, at).await
        }

        async fn find_by_id(&self, trip_id: i64) -> Result<Option<Trip>, AppError> {
            let found = self.inner.find_by_id(trip_id).await?;
            tokio::time::sleep(self.stall).await;
            Ok(found)
        }

        async fn find_all(&self) -> Result<Vec<Trip>, AppError> {
            self.inner.find_all().await
        }

        async fn find_by_name_contains(&self, keyword: &str) -> Result<Vec<Trip>, AppError> {
            self.inner.find_by_name_contains(keyword).await
        }

        async fn find_all_by_user(&self, user_id: i64) -> Result<Vec<Trip>, AppError> {
            self.inner.find_all_by_user(user_id).await
        }
    }

    fn stalling_service(fx: &Fixture) -> TripService {
        TripService::new(
            Arc::new(StallingTrips {
                inner: SqliteTripRepository::new(fx.pool.clone()),
                stall: Duration::from_millis(100),
            }),
            fx.users.clone(),
            TripLocks::new(),
        )
    }

    #[tokio::test]
    async fn insert_trip_returns_generated_id_and_zero_likes() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;

        let response = fx
            .trips
            .insert_trip(owner, &japan_trip_request())
            .await
            .expect("insert trip");

        assert!(response.trip_id > 0);
        assert_eq!(response.trip_name, "Japan Trip");
        assert_eq!(response.start_date.to_string(), "2024-01-01");
        assert_eq!(response.end_date.to_string(), "2024-01-05");
        assert_eq!(response.likes_count, 0);
    }

    #[tokio::test]
    async fn insert_trip_for_unknown_user_fails() {
        let fx = Fixture::new().await;
        let err = fx
            .trips
            .insert_trip(999, &japan_trip_request())
            .await
            .expect_err("unknown user");
        assert!(matches!(err, AppError::NoSuchUser));
    }

    #[tokio::test]
    async fn missing_trip_is_reported() {
        let fx = Fixture::new().await;
        let err = fx.trips.get_trip_by_trip_id(42).await.expect_err("missing");
        assert!(matches!(err, AppError::NoSuchTrip));
    }

    #[tokio::test]
    async fn update_by_non_owner_is_rejected_without_mutation() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let stranger = fx.user("stranger@mail.com").await;
        let trip = fx.trip(owner).await;

        let mut request = japan_trip_request();
        request.trip_name = "Hijacked".into();
        let err = fx
            .trips
            .update_trip(stranger, trip, &request)
            .await
            .expect_err("not owner");
        assert!(matches!(err, AppError::NotMatchBetweenUserAndTrip));

        let stored = fx.trips.get_trip_by_trip_id(trip).await.expect("trip");
        assert_eq!(stored.name, "Japan Trip");
    }

    #[tokio::test]
    async fn owner_can_update_trip() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let trip = fx.trip(owner).await;

        let mut request = japan_trip_request();
        request.trip_name = "Osaka Trip".into();
        request.is_domestic = true;
        let response = fx
            .trips
            .update_trip(owner, trip, &request)
            .await
            .expect("update");
        assert_eq!(response.trip_name, "Osaka Trip");
        assert!(response.is_domestic);
    }

    #[tokio::test]
    async fn deleted_trip_disappears_from_reads() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let kept = fx.trip(owner).await;
        let removed = fx.trip(owner).await;

        fx.trips
            .delete_trip(owner, removed)
            .await
            .expect("delete trip");

        let all = fx.trips.get_all_trips().await.expect("all trips");
        let ids: Vec<i64> = all.iter().map(|t| t.trip_id).collect();
        assert_eq!(ids, vec![kept]);

        let err = fx
            .trips
            .get_trip_by_trip_id(removed)
            .await
            .expect_err("deleted");
        assert!(matches!(err, AppError::TripAlreadyDeleted));

        let mine = fx.trips.get_trips_by_user_id(owner).await.expect("mine");
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_rejected() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let stranger = fx.user("stranger@mail.com").await;
        let trip = fx.trip(owner).await;

        let err = fx
            .trips
            .delete_trip(stranger, trip)
            .await
            .expect_err("not owner");
        assert!(matches!(err, AppError::NotMatchBetweenUserAndTrip));
        assert!(fx.trips.get_trip_by_trip_id(trip).await.is_ok());
    }

    #[tokio::test]
    async fn keyword_search_skips_deleted_trips() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let trip = fx.trip(owner).await;
        let other = fx.trip(owner).await;
        fx.trips.delete_trip(owner, other).await.expect("delete");

        let hits = fx.trips.get_trip_by_keyword("Japan").await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].trip_id, trip);
        assert!(fx
            .trips
            .get_trip_by_keyword("Paris")
            .await
            .expect("search")
            .is_empty());
    }

    #[tokio::test]
    async fn likes_count_never_goes_negative() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let trip = fx.trip(owner).await;

        assert_eq!(fx.trips.update_likes_count(trip, false).await.expect("down"), 0);
        assert_eq!(fx.trips.update_likes_count(trip, true).await.expect("up"), 1);
        assert_eq!(fx.trips.update_likes_count(trip, true).await.expect("up"), 2);
        assert_eq!(fx.trips.update_likes_count(trip, false).await.expect("down"), 1);
    }

    #[tokio::test]
    async fn delete_arriving_during_update_still_deletes() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let trip = fx.trip(owner).await;
        let service = stalling_service(&fx);

        let renamed = TripRequest {
            trip_name: "Renamed".into(),
            ..japan_trip_request()
        };
        let (updated, deleted) = tokio::join!(service.update_trip(owner, trip, &renamed), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            service.delete_trip(owner, trip).await
        });
        assert_eq!(updated.expect("update").trip_name, "Renamed");
        deleted.expect("delete");

        let err = service
            .get_trip_by_trip_id(trip)
            .await
            .expect_err("stays deleted");
        assert!(matches!(err, AppError::TripAlreadyDeleted));
        let stored = fx
            .trip_repository
            .find_by_id(trip)
            .await
            .expect("find")
            .expect("row kept");
        assert!(stored.is_deleted());
        assert_eq!(stored.name, "Renamed");
    }

    #[tokio::test]
    async fn update_arriving_during_delete_is_rejected() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let trip = fx.trip(owner).await;
        let service = stalling_service(&fx);

        let renamed = TripRequest {
            trip_name: "Renamed".into(),
            ..japan_trip_request()
        };
        let (deleted, updated) = tokio::join!(service.delete_trip(owner, trip), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            service.update_trip(owner, trip, &renamed).await
        });
        deleted.expect("delete");
        assert!(matches!(updated, Err(AppError::TripAlreadyDeleted)));

        let stored = fx
            .trip_repository
            .find_by_id(trip)
            .await
            .expect("find")
            .expect("row kept");
        assert!(stored.is_deleted());
        assert_eq!(stored.name, "Japan Trip");
    }

    #[tokio::test]
    async fn likes_during_update_are_not_lost() {
        let fx = Fixture::new().await;
        let owner = fx.user("owner@mail.com").await;
        let trip = fx.trip(owner).await;
        let service = stalling_service(&fx);

        let renamed = TripRequest {
            trip_name: "Renamed".into(),
            ..japan_trip_request()
        };
        let (updated, likes) = tokio::join!(service.update_trip(owner, trip, &renamed), async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            service.update_likes_count(trip, true).await
        });
        updated.expect("update");
        assert_eq!(likes.expect("like"), 1);

        let stored = service.get_trip_by_trip_id(trip).await.expect("trip");
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.likes(), 1);
    }
}
