use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a ride. The transition graph is deliberately
/// unconstrained: any status may move to any other status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
pub enum RideStatus {
    #[sea_orm(string_value = "PU")]
    Pickup,
    #[sea_orm(string_value = "ER")]
    Enroute,
    #[sea_orm(string_value = "DO")]
    Dropoff,
    #[sea_orm(string_value = "CP")]
    Completed,
    #[sea_orm(string_value = "CL")]
    Cancelled,
}

impl RideStatus {
    /// Parse a two-letter wire code. Returns `None` for anything outside
    /// the status set.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PU" => Some(Self::Pickup),
            "ER" => Some(Self::Enroute),
            "DO" => Some(Self::Dropoff),
            "CP" => Some(Self::Completed),
            "CL" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Pickup => "PU",
            Self::Enroute => "ER",
            Self::Dropoff => "DO",
            Self::Completed => "CP",
            Self::Cancelled => "CL",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pickup => "Pick-Up",
            Self::Enroute => "En Route",
            Self::Dropoff => "Drop-Off",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Canonical event text recorded when a ride enters this status.
    /// The match is exhaustive, so the status set and the description
    /// table cannot drift apart.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Pickup => "Driver is on the way.",
            Self::Enroute => "On the way to destination.",
            Self::Dropoff => "Arrived at destination.",
            Self::Completed => "Ride completed.",
            Self::Cancelled => "Booking is cancelled.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ride")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rider_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub status: RideStatus,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub pickup_time: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RiderId",
        to = "super::user::Column::Id"
    )]
    Rider,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(has_many = "super::ride_event::Entity")]
    Events,
}

impl Related<super::ride_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_a_stable_description() {
        for status in [
            RideStatus::Pickup,
            RideStatus::Enroute,
            RideStatus::Dropoff,
            RideStatus::Completed,
            RideStatus::Cancelled,
        ] {
            assert!(!status.describe().is_empty());
            assert!(!status.code().is_empty());
        }

        assert_eq!(RideStatus::Pickup.describe(), "Driver is on the way.");
        assert_eq!(RideStatus::Enroute.describe(), "On the way to destination.");
        assert_eq!(RideStatus::Dropoff.describe(), "Arrived at destination.");
        assert_eq!(RideStatus::Completed.describe(), "Ride completed.");
        assert_eq!(RideStatus::Cancelled.describe(), "Booking is cancelled.");
    }

    #[test]
    fn codes_round_trip() {
        for status in [
            RideStatus::Pickup,
            RideStatus::Enroute,
            RideStatus::Dropoff,
            RideStatus::Completed,
            RideStatus::Cancelled,
        ] {
            assert_eq!(RideStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(RideStatus::from_code("XX"), None);
        assert_eq!(RideStatus::from_code(""), None);
        assert_eq!(RideStatus::from_code("pu"), None);
    }
}
