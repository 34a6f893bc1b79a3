use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;
use crate::error::AppResult;
use crate::services::reports::{self, DriverTripRow};

#[derive(Debug, Serialize)]
pub struct DriverTripReportRow {
    pub driver_name: String,
    pub month: String,
    pub trips_over_1_hour: u64,
}

impl From<DriverTripRow> for DriverTripReportRow {
    fn from(row: DriverTripRow) -> Self {
        Self {
            driver_name: row.driver_name,
            month: row.month,
            trips_over_1_hour: row.trips_over_threshold,
        }
    }
}

/// Monthly per-driver count of trips that took more than an hour from
/// pickup to drop-off, measured on the ride's event log (admin)
pub async fn driver_trips(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<DriverTripReportRow>>> {
    let rows = reports::driver_trips_over_threshold(&*state.db).await?;

    Ok(Json(rows.into_iter().map(DriverTripReportRow::from).collect()))
}
