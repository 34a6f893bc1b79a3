pub mod auth;
pub mod events;
pub mod reports;
pub mod rides;
pub mod users;
