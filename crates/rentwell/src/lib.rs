pub mod config;
pub mod error;
pub mod rentals;
pub mod telemetry;
