//! TOTE: exotic-wager cost, structure and payout engine.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod sanitize;
pub mod cost;
pub mod payout;
pub mod optimizer;
pub mod comparison;
pub mod report;
