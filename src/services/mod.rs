pub mod events;
pub mod reports;
pub mod rides;
