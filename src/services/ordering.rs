//! Itinerary batch validation.
//!
//! A batch of N entries must carry the order indices 1..=N exactly once each,
//! and every movement must name both of its places. Entries are checked in
//! input order and the first violation wins.

use std::collections::HashSet;

use crate::{
    error::AppError,
    models::itinerary::{Itinerary, ItineraryDraft, ItineraryKind, ItineraryRequest, ItineraryType},
};

pub fn validate_itineraries(
    requests: &[ItineraryRequest],
) -> Result<Vec<ItineraryDraft>, AppError> {
    if requests.is_empty() {
        return Err(AppError::EmptyItinerary);
    }

    let size = requests.len();
    let mut taken = vec![false; size];
    let mut drafts = Vec::with_capacity(size);

    for request in requests {
        let itinerary_type: ItineraryType = request.itinerary_type.parse()?;

        let slot = order_slot(request.order, size)?;
        if std::mem::replace(&mut taken[slot], true) {
            return Err(AppError::DuplicateItineraryOrder);
        }

        let kind = ItineraryKind::from_parts(
            itinerary_type,
            request.departure_place.as_deref(),
            request.arrival_place.as_deref(),
        )?;

        drafts.push(ItineraryDraft {
            id: request.id,
            name: request.name.trim().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            order: request.order,
            kind,
        });
    }

    // N in-range indices without repeats cover 1..=N.
    Ok(drafts)
}

fn order_slot(order: i32, size: usize) -> Result<usize, AppError> {
    usize::try_from(order)
        .ok()
        .filter(|order| (1..=size).contains(order))
        .map(|order| order - 1)
        .ok_or(AppError::IncorrectItineraryOrder)
}

/// Fails when a draft reuses the order index of an active sibling that the
/// batch leaves untouched.
pub fn ensure_orders_free<'a>(
    untouched: impl IntoIterator<Item = &'a Itinerary>,
    drafts: &[ItineraryDraft],
) -> Result<(), AppError> {
    let occupied: HashSet<i32> = untouched
        .into_iter()
        .filter(|itinerary| !itinerary.is_deleted())
        .map(|itinerary| itinerary.order)
        .collect();

    if drafts.iter().any(|draft| occupied.contains(&draft.order)) {
        return Err(AppError::DuplicateItineraryOrder);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, Utc};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|date| date.and_hms_opt(8, 0, 0))
            .expect("valid datetime")
    }

    fn request(order: i32, itinerary_type: &str) -> ItineraryRequest {
        ItineraryRequest {
            id: None,
            itinerary_type: itinerary_type.into(),
            name: format!("leg {order}"),
            start_date: now(),
            end_date: now(),
            order,
            departure_place: None,
            arrival_place: None,
        }
    }

    fn movement(order: i32, departure: Option<&str>, arrival: Option<&str>) -> ItineraryRequest {
        ItineraryRequest {
            departure_place: departure.map(str::to_string),
            arrival_place: arrival.map(str::to_string),
            ..request(order, "MOVEMENT")
        }
    }

    fn japan_batch() -> Vec<ItineraryRequest> {
        vec![
            movement(1, Some("ICN"), Some("NRT")),
            request(2, "STAY"),
            request(3, "LODGEMENT"),
        ]
    }

    #[test]
    fn accepts_contiguous_orders_in_any_sequence() {
        let mut batch = japan_batch();
        batch.reverse();
        let drafts = validate_itineraries(&batch).expect("valid batch");
        let orders: Vec<i32> = drafts.iter().map(|d| d.order).collect();
        assert_eq!(orders, vec![3, 2, 1]);
        assert_eq!(drafts[2].kind.departure_place(), Some("ICN"));
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            validate_itineraries(&[]),
            Err(AppError::EmptyItinerary)
        ));
    }

    #[test]
    fn repeated_order_is_a_duplicate() {
        let mut batch = japan_batch();
        batch.push(request(3, "STAY"));
        assert!(matches!(
            validate_itineraries(&batch),
            Err(AppError::DuplicateItineraryOrder)
        ));
    }

    #[test]
    fn gaps_and_non_positive_orders_are_incorrect() {
        let gap = vec![request(1, "STAY"), request(3, "STAY")];
        assert!(matches!(
            validate_itineraries(&gap),
            Err(AppError::IncorrectItineraryOrder)
        ));

        let zero = vec![request(0, "STAY")];
        assert!(matches!(
            validate_itineraries(&zero),
            Err(AppError::IncorrectItineraryOrder)
        ));

        let negative = vec![request(-1, "STAY"), request(1, "STAY")];
        assert!(matches!(
            validate_itineraries(&negative),
            Err(AppError::IncorrectItineraryOrder)
        ));
    }

    #[test]
    fn movement_without_places_fails_with_matching_error() {
        let no_departure = vec![movement(1, None, Some("NRT"))];
        assert!(matches!(
            validate_itineraries(&no_departure),
            Err(AppError::EmptyDeparturePlace)
        ));

        let no_arrival = vec![movement(1, Some("ICN"), Some(" "))];
        assert!(matches!(
            validate_itineraries(&no_arrival),
            Err(AppError::EmptyArrivalPlace)
        ));
    }

    #[test]
    fn stays_and_lodgements_never_need_places() {
        let batch = vec![request(1, "STAY"), request(2, "LODGEMENT")];
        assert!(validate_itineraries(&batch).is_ok());
    }

    #[test]
    fn unknown_type_is_illegal() {
        let batch = vec![request(1, "CRUISE")];
        assert!(matches!(
            validate_itineraries(&batch),
            Err(AppError::IllegalItineraryType)
        ));
    }

    #[test]
    fn first_violation_in_input_order_wins() {
        let batch = vec![movement(1, None, None), request(1, "STAY")];
        assert!(matches!(
            validate_itineraries(&batch),
            Err(AppError::EmptyDeparturePlace)
        ));

        let batch = vec![request(5, "STAY"), movement(1, None, None)];
        assert!(matches!(
            validate_itineraries(&batch),
            Err(AppError::IncorrectItineraryOrder)
        ));
    }

    #[test]
    fn untouched_siblings_block_their_orders() {
        let existing = Itinerary {
            id: 10,
            trip_id: 1,
            name: "Hotel".into(),
            start_date: now(),
            end_date: now(),
            order: 2,
            kind: ItineraryKind::Lodgement,
            deleted_at: None,
        };
        let drafts = validate_itineraries(&japan_batch()).expect("valid batch");
        assert!(matches!(
            ensure_orders_free([&existing], &drafts),
            Err(AppError::DuplicateItineraryOrder)
        ));

        let deleted = Itinerary {
            deleted_at: Some(Utc::now()),
            ..existing
        };
        assert!(ensure_orders_free([&deleted], &drafts).is_ok());
    }
}
