pub mod admission;
pub mod auth;
pub mod checkin;
pub mod identity;
pub mod stats;
pub mod token;
pub mod verify;
