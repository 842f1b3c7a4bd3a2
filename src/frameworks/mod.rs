// Frameworks: configuration, tracing and client wiring.

pub mod client;
pub mod config;
pub mod telemetry;
