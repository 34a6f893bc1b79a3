pub mod ride;
pub mod ride_event;
pub mod user;
