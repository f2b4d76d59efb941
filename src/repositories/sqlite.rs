use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        itinerary::{Itinerary, ItineraryRow, NewItinerary},
        like::LikeTrip,
        trip::{NewTrip, Trip, TripRow},
        user::{NewUser, User},
    },
};

use super::{ItineraryRepository, LikeRepository, TripRepository, UserRepository};

const TRIP_COLUMNS: &str =
    "id, user_id, name, start_date, end_date, is_domestic, likes_count, deleted_at";

const ITINERARY_COLUMNS: &str = "id, trip_id, itinerary_type, name, start_date, end_date, \
     item_order, departure_place, arrival_place, deleted_at";

const USER_COLUMNS: &str = "id, email, name, password_hash, authority, created_at, deleted_at";

async fn load_itineraries(pool: &DbPool, trip_id: i64) -> Result<Vec<Itinerary>, AppError> {
    let rows = sqlx::query_as::<_, ItineraryRow>(&format!(
        "SELECT {ITINERARY_COLUMNS} FROM itineraries WHERE trip_id = ? ORDER BY item_order, id"
    ))
    .bind(trip_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Itinerary::try_from).collect()
}

#[derive(Clone)]
pub struct SqliteTripRepository {
    pool: DbPool,
}

impl SqliteTripRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, rows: Vec<TripRow>) -> Result<Vec<Trip>, AppError> {
        let mut trips = Vec::with_capacity(rows.len());
        for row in rows {
            let itineraries = load_itineraries(&self.pool, row.id).await?;
            trips.push(Trip::from_row(row, itineraries));
        }
        Ok(trips)
    }
}

#[async_trait]
impl TripRepository for SqliteTripRepository {
    async fn insert(&self, trip: &NewTrip) -> Result<Option<Trip>, AppError> {
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO trips (user_id, name, start_date, end_date, is_domestic, likes_count, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, 0, ?, ?)
               RETURNING id"#,
        )
        .bind(trip.user_id)
        .bind(&trip.name)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.is_domestic)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match id {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn update_details(&self, trip: &Trip) -> Result<Option<Trip>, AppError> {
        let result = sqlx::query(
            r#"UPDATE trips
               SET name = ?, start_date = ?, end_date = ?, is_domestic = ?, updated_at = ?
               WHERE id = ? AND deleted_at IS NULL"#,
        )
        .bind(&trip.name)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.is_domestic)
        .bind(Utc::now())
        .bind(trip.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(trip.id).await
    }

    async fn update_likes_count(
        &self,
        trip_id: i64,
        likes_count: i64,
    ) -> Result<Option<Trip>, AppError> {
        let result = sqlx::query(
            "UPDATE trips SET likes_count = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(likes_count)
        .bind(Utc::now())
        .bind(trip_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(trip_id).await
    }

    async fn soft_delete_with_itineraries(
        &self,
        trip_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Trip>, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let trip = sqlx::query(
            "UPDATE trips SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(now)
        .bind(trip_id)
        .execute(&mut *tx)
        .await?;
        if trip.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let itineraries = sqlx::query(
            r#"UPDATE itineraries SET deleted_at = ?, updated_at = ?
               WHERE trip_id = ? AND deleted_at IS NULL"#,
        )
        .bind(at)
        .bind(now)
        .bind(trip_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(
            trip_id,
            itineraries = itineraries.rows_affected(),
            "trip soft-deleted"
        );
        self.find_by_id(trip_id).await
    }

    async fn find_by_id(&self, trip_id: i64) -> Result<Option<Trip>, AppError> {
        let row = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?"
        ))
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let itineraries = load_itineraries(&self.pool, row.id).await?;
                Ok(Some(Trip::from_row(row, itineraries)))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Trip>, AppError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn find_by_name_contains(&self, keyword: &str) -> Result<Vec<Trip>, AppError> {
        // instr() is case-sensitive, unlike LIKE.
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE instr(name, ?) > 0 ORDER BY id"
        ))
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn find_all_by_user(&self, user_id: i64) -> Result<Vec<Trip>, AppError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE user_id = ? ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }
}

#[derive(Clone)]
pub struct SqliteItineraryRepository {
    pool: DbPool,
}

impl SqliteItineraryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const UPDATE_ITINERARY: &str = r#"UPDATE itineraries
    SET itinerary_type = ?, name = ?, start_date = ?, end_date = ?, item_order = ?,
        departure_place = ?, arrival_place = ?, deleted_at = ?, updated_at = ?
    WHERE id = ? AND trip_id = ?"#;

#[async_trait]
impl ItineraryRepository for SqliteItineraryRepository {
    async fn save(&self, itinerary: &Itinerary) -> Result<Option<Itinerary>, AppError> {
        let saved = self.save_all(std::slice::from_ref(itinerary)).await?;
        Ok(saved.into_iter().next())
    }

    async fn save_all(&self, itineraries: &[Itinerary]) -> Result<Vec<Itinerary>, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(itineraries.len());
        for itinerary in itineraries {
            let result = sqlx::query(UPDATE_ITINERARY)
                .bind(itinerary.kind.itinerary_type().as_str())
                .bind(&itinerary.name)
                .bind(itinerary.start_date)
                .bind(itinerary.end_date)
                .bind(itinerary.order)
                .bind(itinerary.kind.departure_place())
                .bind(itinerary.kind.arrival_place())
                .bind(itinerary.deleted_at)
                .bind(now)
                .bind(itinerary.id)
                .bind(itinerary.trip_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 1 {
                saved.push(itinerary.clone());
            }
        }
        tx.commit().await?;
        debug!(
            requested = itineraries.len(),
            saved = saved.len(),
            "itineraries updated"
        );
        Ok(saved)
    }

    async fn insert_all(&self, itineraries: &[NewItinerary]) -> Result<Vec<Itinerary>, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(itineraries.len());
        for itinerary in itineraries {
            let id = sqlx::query_scalar::<_, i64>(
                r#"INSERT INTO itineraries
                   (trip_id, itinerary_type, name, start_date, end_date, item_order,
                    departure_place, arrival_place, created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                   RETURNING id"#,
            )
            .bind(itinerary.trip_id)
            .bind(itinerary.kind.itinerary_type().as_str())
            .bind(&itinerary.name)
            .bind(itinerary.start_date)
            .bind(itinerary.end_date)
            .bind(itinerary.order)
            .bind(itinerary.kind.departure_place())
            .bind(itinerary.kind.arrival_place())
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            saved.push(Itinerary {
                id,
                trip_id: itinerary.trip_id,
                name: itinerary.name.clone(),
                start_date: itinerary.start_date,
                end_date: itinerary.end_date,
                order: itinerary.order,
                kind: itinerary.kind.clone(),
                deleted_at: None,
            });
        }
        tx.commit().await?;
        debug!(inserted = saved.len(), "itineraries inserted");
        Ok(saved)
    }
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: &NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (email, name, password_hash, authority, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING {USER_COLUMNS}"#
        ))
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.authority.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            // Lost a race with a concurrent signup for the same email.
            if let sqlx::Error::Database(db) = &err {
                if db.is_unique_violation() {
                    return AppError::DuplicateEmail;
                }
            }
            AppError::from(err)
        })?;
        Ok(created)
    }
}

#[derive(Clone)]
pub struct SqliteLikeRepository {
    pool: DbPool,
}

impl SqliteLikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for SqliteLikeRepository {
    async fn find(&self, user_id: i64, trip_id: i64) -> Result<Option<LikeTrip>, AppError> {
        let like = sqlx::query_as::<_, LikeTrip>(
            "SELECT id, user_id, trip_id, is_like FROM like_trips WHERE user_id = ? AND trip_id = ?",
        )
        .bind(user_id)
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(like)
    }

    async fn save(
        &self,
        user_id: i64,
        trip_id: i64,
        is_like: bool,
    ) -> Result<LikeTrip, AppError> {
        let now = Utc::now();
        let like = sqlx::query_as::<_, LikeTrip>(
            r#"INSERT INTO like_trips (user_id, trip_id, is_like, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (user_id, trip_id)
               DO UPDATE SET is_like = excluded.is_like, updated_at = excluded.updated_at
               RETURNING id, user_id, trip_id, is_like"#,
        )
        .bind(user_id)
        .bind(trip_id)
        .bind(is_like)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(like)
    }

    async fn find_liked_trip_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT trip_id FROM like_trips WHERE user_id = ? AND is_like = 1 ORDER BY trip_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
