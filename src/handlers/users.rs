use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone_number: u.phone_number,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

/// List all users (admin)
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find().all(&*state.db).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// ============ Role Changes ============

// Changing a role is a separate concern from editing profile data, so it
// gets its own endpoint rather than riding along in a generic update.
// The role arrives as a plain string so an unknown name comes back as a
// 400 with a message instead of a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Update a user's role (admin)
pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let role = UserRole::from_name(&payload.role)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid role: {}", payload.role)))?;

    let user = user::Entity::find_by_id(user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    active.role = Set(role);
    let updated = active.update(&*state.db).await?;

    Ok(Json(UserResponse::from(updated)))
}

// ============ Soft Delete ============

/// Set a user inactive (admin). Soft delete: the account and its ride
/// references stay in place, it just can no longer authenticate or book.
pub async fn set_inactive(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::BadRequest(format!(
            "{} is already inactive",
            user.name
        )));
    }

    let name = user.name.clone();
    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(false);
    active.update(&*state.db).await?;

    Ok(Json(
        serde_json::json!({ "message": format!("{} is set to inactive", name) }),
    ))
}

// ============ Profile Updates ============

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Partially update a user's profile (admin). Role and active flag have
/// their own endpoints.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }

    if let Some(email) = payload.email {
        active.email = Set(email);
    }

    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(Some(phone_number));
    }

    let updated = active.update(&*state.db).await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Hard-delete a user (admin). Rides referencing the user keep existing;
/// the database nulls their rider/driver reference.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = user::Entity::delete_by_id(user_id).exec(&*state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}
