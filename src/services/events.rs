use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{ride, ride_event};
use crate::error::{AppError, AppResult};
use crate::utils::recency::RecencyWindow;

pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Trim and bound-check a free-text event description.
pub fn validate_description(description: &str) -> AppResult<&str> {
    let trimmed = description.trim();

    if trimmed.is_empty() {
        return Err(AppError::BadRequest(
            "Event description must not be empty".to_string(),
        ));
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::BadRequest(format!(
            "Event description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }

    Ok(trimmed)
}

/// Append a free-text event to a ride's history. Status changes go
/// through the ride transition instead; this is for operator notes.
pub async fn record(
    db: &DatabaseConnection,
    ride_id: Uuid,
    description: &str,
    now: DateTime<Utc>,
) -> AppResult<ride_event::Model> {
    let description = validate_description(description)?;

    ride::Entity::find_by_id(ride_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let event = ride_event::ActiveModel {
        id: Set(Uuid::new_v4()),
        ride_id: Set(ride_id),
        description: Set(description.to_string()),
        created: Set(now.into()),
    }
    .insert(db)
    .await?;

    Ok(event)
}

/// Events of one ride inside the recency window, oldest first.
pub async fn recent_for_ride(
    db: &DatabaseConnection,
    ride_id: Uuid,
    window: RecencyWindow,
    now: DateTime<Utc>,
) -> AppResult<Vec<ride_event::Model>> {
    let events = ride_event::Entity::find()
        .filter(ride_event::Column::RideId.eq(ride_id))
        .filter(ride_event::Column::Created.gte(window.cutoff(now)))
        .order_by_asc(ride_event::Column::Created)
        .all(db)
        .await?;

    Ok(events)
}

/// Remove a single event permanently. The owning ride is untouched.
pub async fn delete(db: &DatabaseConnection, event_id: Uuid) -> AppResult<()> {
    let result = ride_event::Entity::delete_by_id(event_id).exec(db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Ride event not found".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[test]
    fn test_description_bounds() {
        assert_eq!(validate_description("Flat tire, driver swapped").unwrap(),
            "Flat tire, driver swapped");
        assert_eq!(validate_description("  padded  ").unwrap(), "padded");

        assert!(matches!(
            validate_description(""),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_description("   "),
            Err(AppError::BadRequest(_))
        ));

        let at_limit = "x".repeat(MAX_DESCRIPTION_LEN);
        assert!(validate_description(&at_limit).is_ok());

        let over_limit = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(matches!(
            validate_description(&over_limit),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_record_requires_existing_ride() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ride::Model>::new()])
            .into_connection();

        let result = record(&db, Uuid::new_v4(), "note", Utc::now()).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_rejects_empty_description_before_touching_store() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = record(&db, Uuid::new_v4(), "   ", Utc::now()).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
