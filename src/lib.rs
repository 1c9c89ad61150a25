//! Pincode resolution and provider proximity matching.
//!
//! A raw pincode is validated, looked up in the built-in locality registry and
//! classified into an availability tier; providers are then ranked by
//! great-circle distance from the resolved locality. [`LocatorEngine`] wraps
//! both steps behind TTL caches.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod locality;
pub mod proximity;
pub mod server;
pub mod telemetry;

pub use config::{AppConfig, EngineConfig};
pub use engine::{LocatorEngine, PincodeRanking};
pub use error::{AppError, EngineError};
