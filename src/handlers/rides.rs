use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::ride::{self, RideStatus};
use crate::entities::ride_event;
use crate::error::{AppError, AppResult};
use crate::services::{events, rides};
use crate::utils::recency::RecencyWindow;

#[derive(Debug, Serialize)]
pub struct RideEventResponse {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub description: String,
    pub created: DateTime<Utc>,
}

impl From<ride_event::Model> for RideEventResponse {
    fn from(e: ride_event::Model) -> Self {
        Self {
            id: e.id,
            ride_id: e.ride_id,
            description: e.description,
            created: e.created.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub rider_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: &'static str,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub pickup_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub recent_events: Vec<RideEventResponse>,
}

impl RideResponse {
    fn new(ride: ride::Model, distance_km: Option<f64>, events: Vec<ride_event::Model>) -> Self {
        Self {
            id: ride.id,
            rider_id: ride.rider_id,
            driver_id: ride.driver_id,
            status: ride.status.code(),
            pickup_lat: ride.pickup_lat,
            pickup_lng: ride.pickup_lng,
            dropoff_lat: ride.dropoff_lat,
            dropoff_lng: ride.dropoff_lng,
            pickup_time: ride.pickup_time.with_timezone(&Utc),
            distance_km,
            recent_events: events.into_iter().map(RideEventResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRidesQuery {
    pub status: Option<String>,
    pub rider_email: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    /// `pickup_time` (default, most recent first) or `distance_km`.
    pub ordering: Option<String>,
    /// Restrict to rides picked up inside the recency window.
    pub recent: Option<bool>,
}

/// List rides with filtering, distance annotation, and recent events
pub async fn list_rides(
    State(state): State<AppState>,
    Query(query): Query<ListRidesQuery>,
) -> AppResult<Json<Vec<RideResponse>>> {
    let status = match &query.status {
        Some(code) => Some(
            RideStatus::from_code(code).ok_or_else(|| AppError::InvalidStatus(code.clone()))?,
        ),
        None => None,
    };

    // Both-or-neither: a half-specified reference point disables the
    // distance feature for the whole listing, same as no point at all.
    let reference = match (query.lat, query.long) {
        (Some(lat), Some(long)) => Some((lat, long)),
        _ => None,
    };

    let ordering = match query.ordering.as_deref() {
        Some("distance_km") => rides::RideOrdering::DistanceKm,
        _ => rides::RideOrdering::PickupTime,
    };

    let filter = rides::RideFilter {
        status,
        rider_email: query.rider_email.clone(),
        recent_only: query.recent.unwrap_or(false),
    };

    let window = RecencyWindow::new(state.config.recency_window_hours);
    let listings = rides::list(&*state.db, filter, reference, ordering, window, Utc::now()).await?;

    let responses = listings
        .into_iter()
        .map(|l| RideResponse::new(l.ride, l.distance_km, l.recent_events))
        .collect();

    Ok(Json(responses))
}

/// Get one ride with its recent events
pub async fn get_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let ride = ride::Entity::find_by_id(ride_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let window = RecencyWindow::new(state.config.recency_window_hours);
    let events = events::recent_for_ride(&*state.db, ride.id, window, Utc::now()).await?;

    Ok(Json(RideResponse::new(ride, None, events)))
}

// ============ Booking ============

#[derive(Debug, Deserialize)]
pub struct BookRideRequest {
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub pickup_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct BookRideResponse {
    pub message: String,
    pub ride: RideResponse,
}

/// Book a ride. There is no ride edit endpoint by design: a change of
/// mind is a `Cancelled` transition followed by a new booking.
pub async fn book(
    State(state): State<AppState>,
    Json(payload): Json<BookRideRequest>,
) -> AppResult<Json<BookRideResponse>> {
    let input = rides::BookRide {
        rider_id: payload.rider_id,
        driver_id: payload.driver_id,
        pickup: (payload.pickup_lat, payload.pickup_lng),
        dropoff: (payload.dropoff_lat, payload.dropoff_lng),
        pickup_time: payload.pickup_time,
    };

    let (ride, event) = rides::book(&*state.db, input, Utc::now()).await?;

    Ok(Json(BookRideResponse {
        message: "Rider will be picked up soon".to_string(),
        ride: RideResponse::new(ride, None, vec![event]),
    }))
}

// ============ Status Transitions ============

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub status: &'static str,
    pub event: RideEventResponse,
}

/// Move a ride to a new status; the change is recorded as an event
pub async fn update_status(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<UpdateStatusResponse>> {
    let new_status = RideStatus::from_code(&payload.status)
        .ok_or_else(|| AppError::InvalidStatus(payload.status.clone()))?;

    let (ride, event) = rides::transition(&*state.db, ride_id, new_status, Utc::now()).await?;

    Ok(Json(UpdateStatusResponse {
        message: format!("Ride status changed to '{}'", ride.status.display_name()),
        status: ride.status.code(),
        event: RideEventResponse::from(event),
    }))
}

/// Hard-delete a ride and its whole event history. Not a soft delete;
/// there is no way back.
pub async fn delete_forever(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    rides::delete_forever(&*state.db, ride_id).await?;

    Ok(Json(
        serde_json::json!({ "message": format!("Ride {} is deleted forever", ride_id) }),
    ))
}
