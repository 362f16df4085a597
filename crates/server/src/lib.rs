//! HTTP surface and process wiring for the liftwatch collector.

pub mod api;
pub mod metrics;
pub mod state;
