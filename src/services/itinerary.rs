use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    error::AppError,
    models::{
        itinerary::{Itinerary, ItineraryRequest, ItineraryResponse, NewItinerary},
        trip::Trip,
    },
    repositories::ItineraryRepository,
    services::{
        locks::TripLocks,
        ordering::{ensure_orders_free, validate_itineraries},
        trip::TripService,
    },
};

#[derive(Clone)]
pub struct ItineraryService {
    trips: TripService,
    itineraries: Arc<dyn ItineraryRepository>,
    locks: TripLocks,
}

impl ItineraryService {
    pub fn new(
        trips: TripService,
        itineraries: Arc<dyn ItineraryRepository>,
        locks: TripLocks,
    ) -> Self {
        Self {
            trips,
            itineraries,
            locks,
        }
    }

    /// Adds a validated batch to a trip. The batch may not reuse the order
    /// index of an itinerary the trip already has.
    pub async fn insert_itineraries(
        &self,
        trip_id: i64,
        user_id: i64,
        requests: &[ItineraryRequest],
    ) -> Result<Vec<ItineraryResponse>, AppError> {
        let _guard = self.locks.acquire(trip_id).await;

        let trip = self.owned_trip(trip_id, user_id).await?;
        let drafts = validate_itineraries(requests)?;
        ensure_orders_free(&trip.itineraries, &drafts)?;

        let created: Vec<NewItinerary> = drafts
            .iter()
            .map(|draft| NewItinerary::for_trip(trip.id, draft))
            .collect();
        let saved = self.itineraries.insert_all(&created).await?;
        if saved.len() != created.len() {
            return Err(AppError::ItinerarySaveFailed);
        }

        info!(trip_id, user_id, count = saved.len(), "itineraries inserted");
        Ok(saved.iter().map(ItineraryResponse::from).collect())
    }

    /// Entries whose id names an active itinerary of the trip are overwritten,
    /// the rest are inserted. Active itineraries the batch does not mention
    /// keep their order index, which the batch may not reuse.
    pub async fn update_itineraries(
        &self,
        trip_id: i64,
        user_id: i64,
        requests: &[ItineraryRequest],
    ) -> Result<Vec<ItineraryResponse>, AppError> {
        let _guard = self.locks.acquire(trip_id).await;

        let trip = self.owned_trip(trip_id, user_id).await?;
        let drafts = validate_itineraries(requests)?;

        let mut updated = Vec::new();
        let mut created = Vec::new();
        for draft in &drafts {
            let existing = draft
                .id
                .and_then(|id| trip.itineraries.iter().find(|itinerary| itinerary.id == id));
            match existing {
                Some(existing) if !updated.iter().any(|u: &Itinerary| u.id == existing.id) => {
                    let mut itinerary = existing.clone();
                    itinerary.apply(draft);
                    updated.push(itinerary);
                }
                _ => created.push(NewItinerary::for_trip(trip.id, draft)),
            }
        }

        let touched: HashSet<i64> = updated.iter().map(|itinerary| itinerary.id).collect();
        let untouched = trip
            .itineraries
            .iter()
            .filter(|itinerary| !touched.contains(&itinerary.id));
        ensure_orders_free(untouched, &drafts)?;

        let mut saved = self.itineraries.save_all(&updated).await?;
        if saved.len() != updated.len() {
            return Err(AppError::ItinerarySaveFailed);
        }
        let inserted = self.itineraries.insert_all(&created).await?;
        if inserted.len() != created.len() {
            return Err(AppError::ItinerarySaveFailed);
        }
        saved.extend(inserted);
        saved.sort_by_key(|itinerary| itinerary.order);

        info!(
            trip_id,
            user_id,
            updated = updated.len(),
            created = created.len(),
            "itineraries updated"
        );
        Ok(saved.iter().map(ItineraryResponse::from).collect())
    }

    /// Soft-deletes the given itineraries. Fails as a whole with
    /// `NoItinerary` if any id is not an active itinerary of the trip.
    pub async fn delete_itineraries(
        &self,
        trip_id: i64,
        user_id: i64,
        itinerary_ids: &[i64],
    ) -> Result<Vec<i64>, AppError> {
        let _guard = self.locks.acquire(trip_id).await;

        let trip = self.owned_trip(trip_id, user_id).await?;
        if itinerary_ids.is_empty() {
            return Err(AppError::EmptyItinerary);
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(itinerary_ids.len());
        for id in itinerary_ids {
            if !seen.insert(*id) {
                continue;
            }
            let itinerary = trip
                .itineraries
                .iter()
                .find(|itinerary| itinerary.id == *id)
                .ok_or(AppError::NoItinerary)?;
            targets.push(itinerary.clone());
        }

        let now = Utc::now();
        for itinerary in &mut targets {
            itinerary.soft_delete(now)?;
        }

        let saved = self.itineraries.save_all(&targets).await?;
        if saved.len() != targets.len() {
            return Err(AppError::ItinerarySaveFailed);
        }

        info!(trip_id, user_id, count = saved.len(), "itineraries deleted");
        Ok(saved.iter().map(|itinerary| itinerary.id).collect())
    }

    pub async fn delete_all_itinerary_by_trip(
        &self,
        trip: &mut Trip,
    ) -> Result<Vec<i64>, AppError> {
        cascade_soft_delete(self.itineraries.as_ref(), trip, Utc::now()).await
    }

    /// Active itineraries of the trip in ascending order.
    pub fn get_itinerary_response_list_by_trip(&self, trip: &Trip) -> Vec<ItineraryResponse> {
        let mut active: Vec<&Itinerary> = trip
            .itineraries
            .iter()
            .filter(|itinerary| !itinerary.is_deleted())
            .collect();
        active.sort_by_key(|itinerary| itinerary.order);
        active.into_iter().map(ItineraryResponse::from).collect()
    }

    pub async fn get_itineraries_by_trip_id(
        &self,
        trip_id: i64,
    ) -> Result<Vec<ItineraryResponse>, AppError> {
        let trip = self.trips.get_trip_by_trip_id(trip_id).await?;
        Ok(self.get_itinerary_response_list_by_trip(&trip))
    }

    async fn owned_trip(&self, trip_id: i64, user_id: i64) -> Result<Trip, AppError> {
        let trip = self.trips.get_trip_by_trip_id(trip_id).await?;
        if !trip.is_owned_by(user_id) {
            return Err(AppError::NotMatchBetweenUserAndItinerary);
        }
        Ok(trip)
    }
}

/// Marks every active itinerary of `trip` deleted at `at` and stores them.
/// Returns the ids that were deleted.
async fn cascade_soft_delete(
    repository: &dyn ItineraryRepository,
    trip: &mut Trip,
    at: DateTime<Utc>,
) -> Result<Vec<i64>, AppError> {
    let mut affected = Vec::new();
    for itinerary in trip
        .itineraries
        .iter_mut()
        .filter(|itinerary| !itinerary.is_deleted())
    {
        itinerary.soft_delete(at)?;
        affected.push(itinerary.clone());
    }

    if affected.is_empty() {
        return Ok(Vec::new());
    }

    let saved = repository.save_all(&affected).await?;
    if saved.len() != affected.len() {
        return Err(AppError::ItinerarySaveFailed);
    }
    Ok(saved.iter().map(|itinerary| itinerary.id).collect())
}
