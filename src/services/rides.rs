use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::ride::{self, RideStatus};
use crate::entities::ride_event;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::geo;
use crate::utils::recency::RecencyWindow;

/// Input for booking a new ride. Coordinates are (lat, lng) pairs.
#[derive(Debug, Clone)]
pub struct BookRide {
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup: (f64, f64),
    pub dropoff: (f64, f64),
    pub pickup_time: DateTime<Utc>,
}

/// Filters accepted by `list`.
#[derive(Debug, Clone, Default)]
pub struct RideFilter {
    pub status: Option<RideStatus>,
    pub rider_email: Option<String>,
    /// Restrict to rides whose pickup_time falls inside the recency window.
    pub recent_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideOrdering {
    /// Pickup time descending (default).
    PickupTime,
    /// Distance to the reference point ascending; falls back to pickup
    /// time when no valid reference point was supplied.
    DistanceKm,
}

/// One ride as returned by `list`: the ride itself, its distance to the
/// caller's reference point (when annotated), and its recent events.
#[derive(Debug, Clone)]
pub struct RideListing {
    pub ride: ride::Model,
    pub distance_km: Option<f64>,
    pub recent_events: Vec<ride_event::Model>,
}

fn validate_coordinate(name: &str, (lat, lng): (f64, f64)) -> AppResult<()> {
    if !geo::is_valid_coordinate(lat, lng) {
        return Err(AppError::BadRequest(format!(
            "{} coordinate out of range: ({}, {})",
            name, lat, lng
        )));
    }
    Ok(())
}

/// Book a ride: create it with status `Pickup` and record the matching
/// first event in the same transaction.
pub async fn book(
    db: &DatabaseConnection,
    input: BookRide,
    now: DateTime<Utc>,
) -> AppResult<(ride::Model, ride_event::Model)> {
    validate_coordinate("Pickup", input.pickup)?;
    validate_coordinate("Drop-off", input.dropoff)?;

    let rider = user::Entity::find_by_id(input.rider_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Unknown rider".to_string()))?;

    if !rider.is_active {
        return Err(AppError::BadRequest(
            "Rider account is inactive".to_string(),
        ));
    }

    if let Some(driver_id) = input.driver_id {
        let driver = user::Entity::find_by_id(driver_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::BadRequest("Unknown driver".to_string()))?;

        if driver.role != UserRole::Driver {
            return Err(AppError::BadRequest(
                "Assigned user is not a driver".to_string(),
            ));
        }
    }

    let created = db
        .transaction::<_, (ride::Model, ride_event::Model), AppError>(move |txn| {
            Box::pin(async move {
                let ride = ride::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    rider_id: Set(Some(input.rider_id)),
                    driver_id: Set(input.driver_id),
                    status: Set(RideStatus::Pickup),
                    pickup_lat: Set(input.pickup.0),
                    pickup_lng: Set(input.pickup.1),
                    dropoff_lat: Set(input.dropoff.0),
                    dropoff_lng: Set(input.dropoff.1),
                    pickup_time: Set(input.pickup_time.into()),
                    created_at: Set(now.into()),
                }
                .insert(txn)
                .await?;

                let event = ride_event::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    ride_id: Set(ride.id),
                    description: Set(RideStatus::Pickup.describe().to_string()),
                    created: Set(now.into()),
                }
                .insert(txn)
                .await?;

                Ok((ride, event))
            })
        })
        .await?;

    Ok(created)
}

/// Move a ride to `new_status` and append the canonical event for it.
/// The status update and the event insert are one atomic unit: a crash
/// between them must never leave the ride and its log inconsistent.
///
/// The transition graph is unconstrained: any status may follow any
/// other. Concurrent transitions on the same ride serialize on the row;
/// last writer wins on status while both events stay in the log.
pub async fn transition(
    db: &DatabaseConnection,
    ride_id: Uuid,
    new_status: RideStatus,
    now: DateTime<Utc>,
) -> AppResult<(ride::Model, ride_event::Model)> {
    let ride = ride::Entity::find_by_id(ride_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let result = db
        .transaction::<_, (ride::Model, ride_event::Model), AppError>(move |txn| {
            Box::pin(async move {
                let mut active: ride::ActiveModel = ride.into();
                active.status = Set(new_status.clone());
                let updated = active.update(txn).await?;

                let event = ride_event::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    ride_id: Set(updated.id),
                    description: Set(new_status.describe().to_string()),
                    created: Set(now.into()),
                }
                .insert(txn)
                .await?;

                Ok((updated, event))
            })
        })
        .await?;

    Ok(result)
}

/// Hard-delete a ride. Irreversible; the owning relation cascades the
/// delete to every event of the ride.
pub async fn delete_forever(db: &DatabaseConnection, ride_id: Uuid) -> AppResult<()> {
    let result = ride::Entity::delete_by_id(ride_id).exec(db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Ride not found".to_string()));
    }

    Ok(())
}

/// List rides matching `filter`, each annotated with its distance to
/// `reference` (when fully supplied and in range) and carrying its
/// recent events.
pub async fn list(
    db: &DatabaseConnection,
    filter: RideFilter,
    reference: Option<(f64, f64)>,
    ordering: RideOrdering,
    window: RecencyWindow,
    now: DateTime<Utc>,
) -> AppResult<Vec<RideListing>> {
    let mut query = ride::Entity::find();

    if let Some(status) = filter.status.clone() {
        query = query.filter(ride::Column::Status.eq(status));
    }

    if let Some(email) = &filter.rider_email {
        let rider = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?;

        match rider {
            Some(rider) => query = query.filter(ride::Column::RiderId.eq(rider.id)),
            None => return Ok(Vec::new()),
        }
    }

    if filter.recent_only {
        query = query.filter(ride::Column::PickupTime.gte(window.cutoff(now)));
    }

    let rides = query
        .order_by_desc(ride::Column::PickupTime)
        .order_by_desc(ride::Column::Id)
        .all(db)
        .await?;

    let ride_ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();
    let events = if ride_ids.is_empty() {
        Vec::new()
    } else {
        ride_event::Entity::find()
            .filter(ride_event::Column::RideId.is_in(ride_ids))
            .filter(ride_event::Column::Created.gte(window.cutoff(now)))
            .order_by_asc(ride_event::Column::Created)
            .all(db)
            .await?
    };

    Ok(assemble_listings(rides, events, reference, ordering))
}

/// Pure assembly step of `list`: group events under their rides,
/// annotate distances, and apply the requested ordering. `rides` are
/// expected pre-sorted by pickup_time desc, id desc.
fn assemble_listings(
    rides: Vec<ride::Model>,
    events: Vec<ride_event::Model>,
    reference: Option<(f64, f64)>,
    ordering: RideOrdering,
) -> Vec<RideListing> {
    let reference = reference.filter(|&(lat, lng)| geo::is_valid_coordinate(lat, lng));

    let mut events_by_ride: HashMap<Uuid, Vec<ride_event::Model>> = HashMap::new();
    for event in events {
        events_by_ride.entry(event.ride_id).or_default().push(event);
    }

    let mut listings: Vec<RideListing> = rides
        .into_iter()
        .map(|ride| {
            let distance_km = geo::annotate(ride.pickup_lat, ride.pickup_lng, reference);
            let recent_events = events_by_ride.remove(&ride.id).unwrap_or_default();

            RideListing {
                ride,
                distance_km,
                recent_events,
            }
        })
        .collect();

    // Distance ordering only applies once the collection is annotated;
    // otherwise the pickup-time order from the query stands.
    if ordering == RideOrdering::DistanceKm && reference.is_some() {
        listings.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.ride.id.cmp(&a.ride.id))
        });
    }

    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn ride_at(id: Uuid, pickup: (f64, f64), pickup_time: DateTime<Utc>) -> ride::Model {
        ride::Model {
            id,
            rider_id: None,
            driver_id: None,
            status: RideStatus::Pickup,
            pickup_lat: pickup.0,
            pickup_lng: pickup.1,
            dropoff_lat: pickup.0 + 0.1,
            dropoff_lng: pickup.1 - 0.1,
            pickup_time: pickup_time.into(),
            created_at: pickup_time.into(),
        }
    }

    fn event_for(ride_id: Uuid, description: &str, created: DateTime<Utc>) -> ride_event::Model {
        ride_event::Model {
            id: Uuid::new_v4(),
            ride_id,
            description: description.to_string(),
            created: created.into(),
        }
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(validate_coordinate("Pickup", (40.0, -73.0)).is_ok());
        assert!(validate_coordinate("Pickup", (90.0, 180.0)).is_ok());
        assert!(matches!(
            validate_coordinate("Pickup", (90.5, 0.0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_coordinate("Drop-off", (0.0, 200.0)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_listings_annotated_against_reference() {
        let now = Utc::now();
        let near = ride_at(Uuid::new_v4(), (40.0, -73.0), now);
        let far = ride_at(Uuid::new_v4(), (41.0, -73.0), now - Duration::hours(1));

        let listings = assemble_listings(
            vec![near.clone(), far.clone()],
            Vec::new(),
            Some((40.0, -73.0)),
            RideOrdering::PickupTime,
        );

        assert_eq!(listings.len(), 2);
        assert!(listings[0].distance_km.unwrap() < 0.001);
        let d = listings[1].distance_km.unwrap();
        assert!((d - 111.32).abs() < 0.01);
    }

    #[test]
    fn test_invalid_reference_skips_annotation_entirely() {
        let now = Utc::now();
        let rides = vec![ride_at(Uuid::new_v4(), (40.0, -73.0), now)];

        let listings =
            assemble_listings(rides, Vec::new(), Some((120.0, -73.0)), RideOrdering::DistanceKm);

        assert_eq!(listings[0].distance_km, None);
    }

    #[test]
    fn test_distance_ordering() {
        let now = Utc::now();
        // Most recent pickup is the farthest away
        let far = ride_at(Uuid::new_v4(), (42.0, -73.0), now);
        let near = ride_at(Uuid::new_v4(), (40.1, -73.0), now - Duration::hours(2));
        let mid = ride_at(Uuid::new_v4(), (41.0, -73.0), now - Duration::hours(1));

        let listings = assemble_listings(
            vec![far.clone(), mid.clone(), near.clone()],
            Vec::new(),
            Some((40.0, -73.0)),
            RideOrdering::DistanceKm,
        );

        assert_eq!(listings[0].ride.id, near.id);
        assert_eq!(listings[1].ride.id, mid.id);
        assert_eq!(listings[2].ride.id, far.id);
    }

    #[test]
    fn test_events_grouped_under_their_ride() {
        let now = Utc::now();
        let a = ride_at(Uuid::new_v4(), (40.0, -73.0), now);
        let b = ride_at(Uuid::new_v4(), (40.5, -73.0), now);

        let events = vec![
            event_for(a.id, "Driver is on the way.", now - Duration::minutes(30)),
            event_for(a.id, "Ride completed.", now),
            event_for(b.id, "Driver is on the way.", now),
        ];

        let listings =
            assemble_listings(vec![a.clone(), b.clone()], events, None, RideOrdering::PickupTime);

        let for_a = listings.iter().find(|l| l.ride.id == a.id).unwrap();
        let for_b = listings.iter().find(|l| l.ride.id == b.id).unwrap();
        assert_eq!(for_a.recent_events.len(), 2);
        assert_eq!(for_a.recent_events[0].description, "Driver is on the way.");
        assert_eq!(for_a.recent_events[1].description, "Ride completed.");
        assert_eq!(for_b.recent_events.len(), 1);
    }

    #[tokio::test]
    async fn test_book_rejects_out_of_range_coordinates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = book(
            &db,
            BookRide {
                rider_id: Uuid::new_v4(),
                driver_id: None,
                pickup: (95.0, -73.0),
                dropoff: (40.1, -73.1),
                pickup_time: Utc::now(),
            },
            Utc::now(),
        )
        .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_transition_updates_status_and_appends_event() {
        let now = Utc::now();
        let before = ride_at(Uuid::new_v4(), (40.0, -73.0), now);
        let mut after = before.clone();
        after.status = RideStatus::Completed;
        let event = event_for(before.id, RideStatus::Completed.describe(), now);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![before.clone()]])
            .append_query_results([vec![after.clone()]])
            .append_query_results([vec![event.clone()]])
            .into_connection();

        let (updated, recorded) = transition(&db, before.id, RideStatus::Completed, now)
            .await
            .unwrap();

        assert_eq!(updated.status, RideStatus::Completed);
        assert_eq!(recorded.ride_id, before.id);
        assert_eq!(recorded.description, "Ride completed.");
    }

    #[tokio::test]
    async fn test_transition_unknown_ride_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ride::Model>::new()])
            .into_connection();

        let result = transition(&db, Uuid::new_v4(), RideStatus::Cancelled, Utc::now()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
