#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Training Data SDK
//!
//! This crate provides the public API for the `training-data` module:
//! - `TrainingDataApi` trait covering profiles, courses and enrollments
//! - entity models with their create and patch payloads
//! - typed filters (`ProfileFilter`, `CourseFilter`, `EnrollmentFilter`)
//! - `DataError` for error handling
//!
//! ## Usage
//!
//! ```ignore
//! use training_data_sdk::{CourseFilter, TrainingDataApi};
//!
//! let filter = CourseFilter {
//!     search: Some("safety".to_owned()),
//!     ..CourseFilter::default()
//! };
//! let page = client.list_courses(&ctx, filter, PageRequest::new(1, 20)).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod filters;
pub mod models;

pub use api::TrainingDataApi;
pub use error::DataError;
pub use filters::{CourseFilter, EnrollmentFilter, ProfileFilter};
pub use models::{
    Course, CoursePatch, CourseStatus, Enrollment, EnrollmentPatch, EnrollmentStatus, NewCourse,
    NewEnrollment, NewProfile, Profile, ProfilePatch, ProfileStatus,
};

pub use datakit_db::ErrorKind;
pub use datakit_db::filter::{DateRange, IdFilter};
pub use datakit_db::pagination::{Page, PageInfo, PageRequest};
