//! EVSim Server Library
//!
//! Exposes host components for integration testing.

pub mod api;
pub mod manager;
pub mod sinks;
pub mod state;
