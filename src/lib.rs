//! QR check-in service.
//!
//! Scanners post a signed ticket token to `/verify-qr`; the service checks the
//! signature, authenticates and authorizes the scanning user, evaluates the
//! ticket's admission day and records the check-in at most once per ticket.

pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
