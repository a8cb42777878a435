//! Training data module.
//!
//! Serves profiles, courses and enrollments through [`TrainingDataService`],
//! which routes every call to the unified repository implementation or the
//! legacy one according to the live migration switch.

pub mod config;
pub mod domain;
pub mod facade;
pub mod legacy;
pub mod module;

pub use config::TrainingDataConfig;
pub use domain::service::UnifiedTrainingData;
pub use facade::TrainingDataService;
pub use legacy::LegacyTrainingData;
pub use module::TrainingDataModule;
