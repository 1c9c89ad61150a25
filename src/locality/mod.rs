//! Locality subsystem: pincode validation, the built-in registry and
//! availability resolution.

pub mod registry;
pub mod resolver;
pub mod types;
pub mod validate;

pub use registry::{CityInfo, LocalityRegistry};
pub use resolver::AvailabilityResolver;
pub use types::{AvailabilityResult, AvailabilityTier, GeoPoint, LocalityRecord, PostalCode, ResolutionOutcome};
pub use validate::validate;
