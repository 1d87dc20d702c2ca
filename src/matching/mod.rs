//! Vehicle/cargo matching.
//!
//! The engine is synchronous and reads the route and nearby-city indexes
//! through [`GeoIndex`]; [`service`] loads those indexes from the database.

mod engine;
mod index;
mod scoring;
pub mod service;
mod types;

pub use engine::MatchingEngine;
pub use index::{GeoIndex, IndexSnapshot, NearbyHit};
pub use scoring::ScoreWeights;
pub use types::{
    CargoRequest, CargoStop, MatchResult, MatchTier, PlaceKey, PlaceRef, StopKind,
    VehicleProfile, VehicleSummary,
};
