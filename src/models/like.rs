use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LikeTrip {
    pub id: i64,
    pub user_id: i64,
    pub trip_id: i64,
    pub is_like: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LikeResponse {
    pub trip_id: i64,
    pub liked: bool,
    pub likes_count: i64,
}
