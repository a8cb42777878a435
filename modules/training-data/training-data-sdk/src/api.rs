//! `TrainingDataApi` trait definition.
//!
//! All methods take the caller's `TenantContext`; every read and write is
//! restricted to the tenants it can reach.

use async_trait::async_trait;
use datakit_db::pagination::{Page, PageRequest};
use datakit_security::TenantContext;
use uuid::Uuid;

use crate::error::DataError;
use crate::filters::{CourseFilter, EnrollmentFilter, ProfileFilter};
use crate::models::{
    Course, CoursePatch, Enrollment, EnrollmentPatch, NewCourse, NewEnrollment, NewProfile,
    Profile, ProfilePatch,
};

/// Public API trait for the `training-data` module.
///
/// Rules shared by every entity:
/// - creates target the caller's primary tenant unless the payload names
///   another accessible tenant; an inaccessible one is `forbidden`
/// - get, update and delete of an id outside the caller's tenants is
///   `not-found`
/// - invalid payloads are `validation`
#[async_trait]
pub trait TrainingDataApi: Send + Sync {
    async fn list_profiles(
        &self,
        ctx: &TenantContext,
        filter: ProfileFilter,
        page: PageRequest,
    ) -> Result<Page<Profile>, DataError>;

    async fn get_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<Profile, DataError>;

    async fn create_profile(
        &self,
        ctx: &TenantContext,
        new_profile: NewProfile,
    ) -> Result<Profile, DataError>;

    async fn update_profile(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, DataError>;

    async fn delete_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError>;

    async fn list_courses(
        &self,
        ctx: &TenantContext,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>, DataError>;

    async fn get_course(&self, ctx: &TenantContext, id: Uuid) -> Result<Course, DataError>;

    async fn create_course(
        &self,
        ctx: &TenantContext,
        new_course: NewCourse,
    ) -> Result<Course, DataError>;

    async fn update_course(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Course, DataError>;

    async fn delete_course(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError>;

    async fn list_enrollments(
        &self,
        ctx: &TenantContext,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Page<Enrollment>, DataError>;

    async fn get_enrollment(&self, ctx: &TenantContext, id: Uuid)
    -> Result<Enrollment, DataError>;

    /// # Errors
    /// `not-found` when the profile or the course is not visible to the caller.
    async fn create_enrollment(
        &self,
        ctx: &TenantContext,
        new_enrollment: NewEnrollment,
    ) -> Result<Enrollment, DataError>;

    async fn update_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: EnrollmentPatch,
    ) -> Result<Enrollment, DataError>;

    async fn delete_enrollment(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError>;
}
