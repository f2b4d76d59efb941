use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        itinerary::ItineraryService, like::LikeService, trip::TripService, user::UserService,
        Services,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub trips: TripService,
    pub itineraries: ItineraryService,
    pub users: UserService,
    pub likes: LikeService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let Services {
            trips,
            itineraries,
            users,
            likes,
        } = Services::sqlite(db.clone());
        Self {
            config,
            db,
            trips,
            itineraries,
            users,
            likes,
        }
    }
}
