use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::rides::RideEventResponse;
use crate::services::events;

// Events are historical data: they can be appended and, for compliance
// cleanup, individually deleted, but never edited. A status change is an
// event, but an event is not always a status change; status changes go
// through the ride status endpoint instead of this one.

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub ride_id: Uuid,
    pub description: String,
}

/// Append a free-text event to a ride's history
pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<Json<RideEventResponse>> {
    let event = events::record(&*state.db, payload.ride_id, &payload.description, Utc::now()).await?;

    Ok(Json(RideEventResponse::from(event)))
}

/// Delete a single event permanently
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    events::delete(&*state.db, event_id).await?;

    Ok(Json(
        serde_json::json!({ "message": format!("Ride event {} deleted successfully", event_id) }),
    ))
}
