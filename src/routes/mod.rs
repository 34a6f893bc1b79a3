use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::{auth, events, reports, rides, users};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::create_public_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // IP-based governor for the unauthenticated routes
    let public_governor = create_public_governor();

    // Public routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor);

    // Everything below is an operator surface (requires auth + admin role)
    let admin_routes = Router::new()
        // Rides
        .route("/rides", get(rides::list_rides))
        .route("/rides", post(rides::book))
        .route("/rides/{id}", get(rides::get_ride))
        .route("/rides/{id}", delete(rides::delete_forever))
        .route("/rides/{id}/status", post(rides::update_status))
        // Ride events
        .route("/ride-events", post(events::create_event))
        .route("/ride-events/{id}", delete(events::delete_event))
        // Reports
        .route("/reports/driver-trips", get(reports::driver_trips))
        // User management
        .route("/users", get(users::list_users))
        .route("/users/{id}", patch(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/role", post(users::update_role))
        .route("/users/{id}/set-inactive", post(users::set_inactive))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", admin_routes)
        .with_state(state)
}
