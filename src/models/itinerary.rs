use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItineraryType {
    Movement,
    Stay,
    Lodgement,
}

impl ItineraryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItineraryType::Movement => "MOVEMENT",
            ItineraryType::Stay => "STAY",
            ItineraryType::Lodgement => "LODGEMENT",
        }
    }
}

impl fmt::Display for ItineraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItineraryType {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MOVEMENT" => Ok(ItineraryType::Movement),
            "STAY" => Ok(ItineraryType::Stay),
            "LODGEMENT" => Ok(ItineraryType::Lodgement),
            _ => Err(AppError::IllegalItineraryType),
        }
    }
}

/// Variant-specific part of an itinerary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItineraryKind {
    Movement {
        departure_place: String,
        arrival_place: String,
    },
    Stay,
    Lodgement,
}

impl ItineraryKind {
    /// Builds the variant for `itinerary_type`. Places are only read for
    /// movements and must then be non-blank.
    pub fn from_parts(
        itinerary_type: ItineraryType,
        departure_place: Option<&str>,
        arrival_place: Option<&str>,
    ) -> Result<Self, AppError> {
        match itinerary_type {
            ItineraryType::Movement => {
                let departure_place =
                    non_blank(departure_place).ok_or(AppError::EmptyDeparturePlace)?;
                let arrival_place = non_blank(arrival_place).ok_or(AppError::EmptyArrivalPlace)?;
                Ok(ItineraryKind::Movement {
                    departure_place,
                    arrival_place,
                })
            }
            ItineraryType::Stay => Ok(ItineraryKind::Stay),
            ItineraryType::Lodgement => Ok(ItineraryKind::Lodgement),
        }
    }

    pub fn itinerary_type(&self) -> ItineraryType {
        match self {
            ItineraryKind::Movement { .. } => ItineraryType::Movement,
            ItineraryKind::Stay => ItineraryType::Stay,
            ItineraryKind::Lodgement => ItineraryType::Lodgement,
        }
    }

    pub fn departure_place(&self) -> Option<&str> {
        match self {
            ItineraryKind::Movement {
                departure_place, ..
            } => Some(departure_place),
            _ => None,
        }
    }

    pub fn arrival_place(&self) -> Option<&str> {
        match self {
            ItineraryKind::Movement { arrival_place, .. } => Some(arrival_place),
            _ => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub id: i64,
    pub trip_id: i64,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub order: i32,
    pub kind: ItineraryKind,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Itinerary {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) -> Result<(), AppError> {
        if self.is_deleted() {
            return Err(AppError::ItineraryAlreadyDeleted);
        }
        self.deleted_at = Some(at);
        Ok(())
    }

    /// Overwrites the mutable fields from a validated draft.
    pub fn apply(&mut self, draft: &ItineraryDraft) {
        self.name = draft.name.clone();
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.order = draft.order;
        self.kind = draft.kind.clone();
    }
}

/// An itinerary that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItinerary {
    pub trip_id: i64,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub order: i32,
    pub kind: ItineraryKind,
}

impl NewItinerary {
    pub fn for_trip(trip_id: i64, draft: &ItineraryDraft) -> Self {
        Self {
            trip_id,
            name: draft.name.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            order: draft.order,
            kind: draft.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ItineraryRow {
    pub id: i64,
    pub trip_id: i64,
    pub itinerary_type: String,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub item_order: i32,
    pub departure_place: Option<String>,
    pub arrival_place: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ItineraryRow> for Itinerary {
    type Error = AppError;

    fn try_from(row: ItineraryRow) -> Result<Self, Self::Error> {
        let itinerary_type = row.itinerary_type.parse()?;
        let kind = ItineraryKind::from_parts(
            itinerary_type,
            row.departure_place.as_deref(),
            row.arrival_place.as_deref(),
        )?;
        Ok(Self {
            id: row.id,
            trip_id: row.trip_id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            order: row.item_order,
            kind,
            deleted_at: row.deleted_at,
        })
    }
}

/// Raw itinerary entry as submitted by a client.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryRequest {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub itinerary_type: String,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub order: i32,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub departure_place: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub arrival_place: Option<String>,
}

/// A request entry that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryDraft {
    pub id: Option<i64>,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub order: i32,
    pub kind: ItineraryKind,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItineraryResponse {
    pub itinerary_id: i64,
    pub trip_id: i64,
    pub name: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub order: i32,
    #[serde(flatten)]
    pub kind: ItineraryKind,
}

impl From<&Itinerary> for ItineraryResponse {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            itinerary_id: itinerary.id,
            trip_id: itinerary.trip_id,
            name: itinerary.name.clone(),
            start_date: itinerary.start_date,
            end_date: itinerary.end_date,
            order: itinerary.order,
            kind: itinerary.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryDeleteRequest {
    pub itinerary_ids: Vec<i64>,
}
