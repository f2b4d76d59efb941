use std::{ops::Deref, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    db::{test_pool, DbPool},
    models::{
        itinerary::ItineraryRequest,
        trip::TripRequest,
        user::{Authority, NewUser},
    },
    repositories::{SqliteTripRepository, SqliteUserRepository, TripRepository, UserRepository},
    services::Services,
};

pub(crate) struct Fixture {
    pub pool: DbPool,
    pub services: Services,
    pub trip_repository: Arc<dyn TripRepository>,
}

impl Deref for Fixture {
    type Target = Services;

    fn deref(&self) -> &Services {
        &self.services
    }
}

impl Fixture {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        Self {
            services: Services::sqlite(pool.clone()),
            trip_repository: Arc::new(SqliteTripRepository::new(pool.clone())),
            pool,
        }
    }

    /// Stores a user directly, skipping password hashing.
    pub async fn user(&self, email: &str) -> i64 {
        SqliteUserRepository::new(self.pool.clone())
            .insert(&NewUser {
                email: email.into(),
                name: "tester".into(),
                password_hash: "unused".into(),
                authority: Authority::User,
            })
            .await
            .expect("insert user")
            .id
    }

    pub async fn trip(&self, owner: i64) -> i64 {
        self.services
            .trips
            .insert_trip(owner, &japan_trip_request())
            .await
            .expect("insert trip")
            .trip_id
    }
}

pub(crate) fn japan_trip_request() -> TripRequest {
    TripRequest {
        trip_name: "Japan Trip".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 5).expect("date"),
        is_domestic: false,
    }
}

fn departure_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .expect("datetime")
}

pub(crate) fn itinerary_request(order: i32, itinerary_type: &str) -> ItineraryRequest {
    ItineraryRequest {
        id: None,
        itinerary_type: itinerary_type.into(),
        name: format!("leg {order}"),
        start_date: departure_time(),
        end_date: departure_time(),
        order,
        departure_place: None,
        arrival_place: None,
    }
}

/// Flight ICN to NRT, a stay and a hotel, ordered 1..=3.
pub(crate) fn japan_itineraries() -> Vec<ItineraryRequest> {
    let mut flight = itinerary_request(1, "MOVEMENT");
    flight.departure_place = Some("ICN".into());
    flight.arrival_place = Some("NRT".into());
    vec![
        flight,
        itinerary_request(2, "STAY"),
        itinerary_request(3, "LODGEMENT"),
    ]
}
