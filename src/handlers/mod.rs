pub mod checkin;
pub mod health;

pub use checkin::{checkin_stats, verify_qr, verify_qr_preflight};
pub use health::health_check;
