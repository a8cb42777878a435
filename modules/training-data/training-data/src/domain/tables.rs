use datakit_db::ScopableTable;
use serde::Serialize;
use serde::de::DeserializeOwned;
use training_data_sdk::{Course, Enrollment, Profile};

/// A tenant-owned table together with the model its rows decode into.
pub trait EntityKind: ScopableTable + Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    /// Singular name used in error messages.
    const NAME: &'static str;

    /// Newest-first ordering column.
    const SORT_COLUMN: &'static str = "created_at";
}

pub struct Profiles;

impl ScopableTable for Profiles {
    const TABLE: &'static str = "profiles";
}

impl EntityKind for Profiles {
    type Model = Profile;
    const NAME: &'static str = "profile";
}

pub struct Courses;

impl ScopableTable for Courses {
    const TABLE: &'static str = "courses";
}

impl EntityKind for Courses {
    type Model = Course;
    const NAME: &'static str = "course";
}

pub struct Enrollments;

impl ScopableTable for Enrollments {
    const TABLE: &'static str = "enrollments";
}

impl EntityKind for Enrollments {
    type Model = Enrollment;
    const NAME: &'static str = "enrollment";
    const SORT_COLUMN: &'static str = "enrolled_at";
}
