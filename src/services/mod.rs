pub mod itinerary;
pub mod like;
pub mod locks;
pub mod ordering;
pub mod trip;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::{
    db::DbPool,
    repositories::{
        SqliteItineraryRepository, SqliteLikeRepository, SqliteTripRepository,
        SqliteUserRepository,
    },
};

use self::{
    itinerary::ItineraryService, like::LikeService, locks::TripLocks, trip::TripService,
    user::UserService,
};

/// Every service wired against one set of repositories and one lock table.
#[derive(Clone)]
pub struct Services {
    pub trips: TripService,
    pub itineraries: ItineraryService,
    pub users: UserService,
    pub likes: LikeService,
}

impl Services {
    pub fn sqlite(pool: DbPool) -> Self {
        let trip_repository = Arc::new(SqliteTripRepository::new(pool.clone()));
        let itinerary_repository = Arc::new(SqliteItineraryRepository::new(pool.clone()));
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let like_repository = Arc::new(SqliteLikeRepository::new(pool));
        let locks = TripLocks::new();

        let users = UserService::new(user_repository);
        let trips = TripService::new(trip_repository, users.clone(), locks.clone());
        let itineraries =
            ItineraryService::new(trips.clone(), itinerary_repository, locks.clone());
        let likes = LikeService::new(like_repository, trips.clone(), locks);

        Self {
            trips,
            itineraries,
            users,
            likes,
        }
    }
}
