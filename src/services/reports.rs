use std::collections::{BTreeMap, HashMap};

use chrono::Duration;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::ride::{self, RideStatus};
use crate::entities::ride_event;
use crate::entities::user;
use crate::error::AppResult;

/// A trip counts as "long" when its drop-off event lands more than this
/// many hours after its pickup event.
pub const LONG_TRIP_THRESHOLD_HOURS: i64 = 1;

/// One row of the monthly driver report: how many of a driver's trips
/// ran over the threshold in a given month.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverTripRow {
    pub driver_name: String,
    /// Month of the drop-off event, formatted `YYYY-MM`.
    pub month: String,
    pub trips_over_threshold: u64,
}

/// Monthly per-driver count of trips whose pickup-to-dropoff gap in the
/// event log exceeded the threshold. Trips are paired through the
/// canonical pickup and drop-off event descriptions; rides without a
/// driver are skipped.
pub async fn driver_trips_over_threshold(
    db: &DatabaseConnection,
) -> AppResult<Vec<DriverTripRow>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::DriverId.is_not_null())
        .all(db)
        .await?;

    let ride_ids: Vec<Uuid> = rides.iter().map(|r| r.id).collect();
    let events = if ride_ids.is_empty() {
        Vec::new()
    } else {
        ride_event::Entity::find()
            .filter(ride_event::Column::RideId.is_in(ride_ids))
            .filter(
                Condition::any()
                    .add(ride_event::Column::Description.starts_with(RideStatus::Pickup.describe()))
                    .add(
                        ride_event::Column::Description
                            .starts_with(RideStatus::Dropoff.describe()),
                    ),
            )
            .all(db)
            .await?
    };

    let users = user::Entity::find().all(db).await?;

    Ok(assemble_report(rides, events, users))
}

/// Pure aggregation step: pair every pickup event with every drop-off
/// event of the same ride, keep the pairs whose gap exceeds the
/// threshold, and count them per driver name and drop-off month.
fn assemble_report(
    rides: Vec<ride::Model>,
    events: Vec<ride_event::Model>,
    users: Vec<user::Model>,
) -> Vec<DriverTripRow> {
    let driver_by_ride: HashMap<Uuid, Uuid> = rides
        .iter()
        .filter_map(|r| r.driver_id.map(|driver_id| (r.id, driver_id)))
        .collect();
    let name_by_user: HashMap<Uuid, &str> =
        users.iter().map(|u| (u.id, u.name.as_str())).collect();

    let mut pickups_by_ride: HashMap<Uuid, Vec<&ride_event::Model>> = HashMap::new();
    let mut dropoffs_by_ride: HashMap<Uuid, Vec<&ride_event::Model>> = HashMap::new();
    for event in &events {
        if event.description.starts_with(RideStatus::Pickup.describe()) {
            pickups_by_ride.entry(event.ride_id).or_default().push(event);
        } else if event.description.starts_with(RideStatus::Dropoff.describe()) {
            dropoffs_by_ride.entry(event.ride_id).or_default().push(event);
        }
    }

    let threshold = Duration::hours(LONG_TRIP_THRESHOLD_HOURS);
    // BTreeMap keeps the report ordered by driver name, then month
    let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();

    for (ride_id, pickups) in &pickups_by_ride {
        let Some(driver_id) = driver_by_ride.get(ride_id) else {
            continue;
        };
        let Some(name) = name_by_user.get(driver_id) else {
            continue;
        };
        let Some(dropoffs) = dropoffs_by_ride.get(ride_id) else {
            continue;
        };

        for pickup in pickups {
            for dropoff in dropoffs {
                if dropoff.created - pickup.created > threshold {
                    let month = dropoff.created.format("%Y-%m").to_string();
                    *counts.entry((name.to_string(), month)).or_insert(0) += 1;
                }
            }
        }
    }

    counts
        .into_iter()
        .map(|((driver_name, month), trips_over_threshold)| DriverTripRow {
            driver_name,
            month,
            trips_over_threshold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use chrono::{DateTime, Utc};

    fn driver(name: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: format!("{}@ridehail.local", name.to_lowercase()),
            password_hash: "hash".to_string(),
            name: name.to_string(),
            phone_number: None,
            role: UserRole::Driver,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn ride_with_driver(driver_id: Uuid) -> ride::Model {
        ride::Model {
            id: Uuid::new_v4(),
            rider_id: None,
            driver_id: Some(driver_id),
            status: RideStatus::Completed,
            pickup_lat: 40.0,
            pickup_lng: -73.0,
            dropoff_lat: 40.1,
            dropoff_lng: -73.1,
            pickup_time: Utc::now().into(),
            created_at: Utc::now().into(),
        }
    }

    fn event_at(ride_id: Uuid, status: RideStatus, created: DateTime<Utc>) -> ride_event::Model {
        ride_event::Model {
            id: Uuid::new_v4(),
            ride_id,
            description: status.describe().to_string(),
            created: created.into(),
        }
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        rfc3339.parse().unwrap()
    }

    #[test]
    fn test_counts_only_trips_over_the_threshold() {
        let d = driver("Pat Doe");
        let long = ride_with_driver(d.id);
        let short = ride_with_driver(d.id);
        let exact = ride_with_driver(d.id);

        let events = vec![
            event_at(long.id, RideStatus::Pickup, at("2026-03-01T10:00:00Z")),
            event_at(long.id, RideStatus::Dropoff, at("2026-03-01T12:30:00Z")),
            event_at(short.id, RideStatus::Pickup, at("2026-03-02T10:00:00Z")),
            event_at(short.id, RideStatus::Dropoff, at("2026-03-02T10:20:00Z")),
            // Exactly one hour is not over the threshold
            event_at(exact.id, RideStatus::Pickup, at("2026-03-03T10:00:00Z")),
            event_at(exact.id, RideStatus::Dropoff, at("2026-03-03T11:00:00Z")),
        ];

        let rows = assemble_report(vec![long, short, exact], events, vec![d]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].driver_name, "Pat Doe");
        assert_eq!(rows[0].month, "2026-03");
        assert_eq!(rows[0].trips_over_threshold, 1);
    }

    #[test]
    fn test_groups_by_driver_and_dropoff_month() {
        let a = driver("Alex Ray");
        let b = driver("Sam Lee");
        let a_march = ride_with_driver(a.id);
        let a_april = ride_with_driver(a.id);
        let b_march = ride_with_driver(b.id);

        let events = vec![
            event_at(a_march.id, RideStatus::Pickup, at("2026-03-10T08:00:00Z")),
            event_at(a_march.id, RideStatus::Dropoff, at("2026-03-10T10:00:00Z")),
            event_at(a_april.id, RideStatus::Pickup, at("2026-04-02T08:00:00Z")),
            event_at(a_april.id, RideStatus::Dropoff, at("2026-04-02T11:00:00Z")),
            event_at(b_march.id, RideStatus::Pickup, at("2026-03-15T20:00:00Z")),
            event_at(b_march.id, RideStatus::Dropoff, at("2026-03-15T21:30:00Z")),
        ];

        let rows = assemble_report(vec![a_march, a_april, b_march], events, vec![a, b]);

        assert_eq!(
            rows,
            vec![
                DriverTripRow {
                    driver_name: "Alex Ray".to_string(),
                    month: "2026-03".to_string(),
                    trips_over_threshold: 1,
                },
                DriverTripRow {
                    driver_name: "Alex Ray".to_string(),
                    month: "2026-04".to_string(),
                    trips_over_threshold: 1,
                },
                DriverTripRow {
                    driver_name: "Sam Lee".to_string(),
                    month: "2026-03".to_string(),
                    trips_over_threshold: 1,
                },
            ]
        );
    }

    #[test]
    fn test_incomplete_trips_are_skipped() {
        let d = driver("Pat Doe");
        let no_dropoff = ride_with_driver(d.id);

        let events = vec![event_at(
            no_dropoff.id,
            RideStatus::Pickup,
            at("2026-03-01T10:00:00Z"),
        )];

        let rows = assemble_report(vec![no_dropoff], events, vec![d]);

        assert!(rows.is_empty());
    }
}
