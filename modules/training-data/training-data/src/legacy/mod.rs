//! Legacy implementation kept for fallback during the migration.
//!
//! Hand-built queries per entity, a single attempt per store call and
//! sequential item and count queries. Tenant scoping and payload rules are
//! the same as in the unified implementation.

mod service;

pub use service::LegacyTrainingData;
