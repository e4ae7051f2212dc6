//! HTTP boundary for the findarr federated search service.

pub mod api;
pub mod metrics;
pub mod state;
