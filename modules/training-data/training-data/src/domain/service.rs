use std::sync::Arc;

use async_trait::async_trait;
use datakit_db::filter::{FilterCondition, FilterSet, id_value};
use datakit_db::pagination::{Page, PageRequest};
use datakit_db::secure::{ScopableTable, find};
use datakit_db::{CircuitState, DataAccessConfig, Store};
use datakit_security::TenantContext;
use tracing::instrument;
use training_data_sdk::{
    Course, CourseFilter, CoursePatch, DataError, Enrollment, EnrollmentFilter, EnrollmentPatch,
    ErrorKind, NewCourse, NewEnrollment, NewProfile, Profile, ProfileFilter, ProfilePatch,
    TrainingDataApi,
};
use uuid::Uuid;

use super::payload;
use super::repository::EntityRepository;
use super::tables::{Courses, Enrollments, EntityKind, Profiles};

/// The unified implementation: generic repositories with retry, timeout
/// and one circuit breaker per table.
pub struct UnifiedTrainingData {
    profiles: EntityRepository<Profiles>,
    courses: EntityRepository<Courses>,
    enrollments: EntityRepository<Enrollments>,
}

impl UnifiedTrainingData {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &DataAccessConfig) -> Self {
        Self {
            profiles: EntityRepository::new(Arc::clone(&store), config),
            courses: EntityRepository::new(Arc::clone(&store), config),
            enrollments: EntityRepository::new(store, config),
        }
    }

    /// Breaker states as `(table, state)`; empty without circuit breaking.
    #[must_use]
    pub fn circuit_states(&self) -> Vec<(&'static str, CircuitState)> {
        [
            (Profiles::TABLE, self.profiles.circuit_state()),
            (Courses::TABLE, self.courses.circuit_state()),
            (Enrollments::TABLE, self.enrollments.circuit_state()),
        ]
        .into_iter()
        .filter_map(|(table, state)| state.map(|s| (table, s)))
        .collect()
    }
}

#[async_trait]
impl TrainingDataApi for UnifiedTrainingData {
    #[instrument(level = "debug", skip_all, fields(caller = %ctx.caller_id()))]
    async fn list_profiles(
        &self,
        ctx: &TenantContext,
        filter: ProfileFilter,
        page: PageRequest,
    ) -> Result<Page<Profile>, DataError> {
        self.profiles.list(ctx, &filter, page).await
    }

    async fn get_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<Profile, DataError> {
        self.profiles.get(ctx, id).await
    }

    #[instrument(level = "debug", skip_all, fields(caller = %ctx.caller_id()))]
    async fn create_profile(
        &self,
        ctx: &TenantContext,
        new_profile: NewProfile,
    ) -> Result<Profile, DataError> {
        let profile = payload::new_profile(ctx, new_profile)?;
        self.profiles.insert(&profile).await
    }

    async fn update_profile(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, DataError> {
        let changes = payload::profile_changes(&patch)?;
        self.profiles.update(ctx, id, &changes).await
    }

    async fn delete_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.profiles.delete(ctx, id).await
    }

    #[instrument(level = "debug", skip_all, fields(caller = %ctx.caller_id()))]
    async fn list_courses(
        &self,
        ctx: &TenantContext,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>, DataError> {
        self.courses.list(ctx, &filter, page).await
    }

    async fn get_course(&self, ctx: &TenantContext, id: Uuid) -> Result<Course, DataError> {
        self.courses.get(ctx, id).await
    }

    async fn create_course(
        &self,
        ctx: &TenantContext,
        new_course: NewCourse,
    ) -> Result<Course, DataError> {
        let course = payload::new_course(ctx, new_course)?;
        self.courses.insert(&course).await
    }

    async fn update_course(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Course, DataError> {
        let changes = payload::course_changes(&patch)?;
        self.courses.update(ctx, id, &changes).await
    }

    async fn delete_course(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.courses.delete(ctx, id).await
    }

    #[instrument(level = "debug", skip_all, fields(caller = %ctx.caller_id()))]
    async fn list_enrollments(
        &self,
        ctx: &TenantContext,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Page<Enrollment>, DataError> {
        let mut query = find::<Enrollments>(ctx).where_many(&filter.to_conditions());
        if filter.joins_courses() {
            query = query.join(Courses::TABLE, "course_id", Courses::ID_COLUMN);
        }
        self.enrollments.list_query(query, page).await
    }

    async fn get_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<Enrollment, DataError> {
        self.enrollments.get(ctx, id).await
    }

    #[instrument(level = "debug", skip_all, fields(caller = %ctx.caller_id()))]
    async fn create_enrollment(
        &self,
        ctx: &TenantContext,
        new_enrollment: NewEnrollment,
    ) -> Result<Enrollment, DataError> {
        let enrollment = payload::new_enrollment(ctx, &new_enrollment)?;

        let (profile_visible, course_visible) = futures::try_join!(
            self.profiles.exists(ctx, enrollment.profile_id),
            self.courses.exists(ctx, enrollment.course_id),
        )?;
        if !profile_visible {
            return Err(DataError::not_found(Profiles::NAME, enrollment.profile_id));
        }
        if !course_visible {
            return Err(DataError::not_found(Courses::NAME, enrollment.course_id));
        }

        let already = self
            .enrollments
            .count(
                ctx,
                &[
                    FilterCondition::eq("profile_id", id_value(enrollment.profile_id)),
                    FilterCondition::eq("course_id", id_value(enrollment.course_id)),
                ],
            )
            .await?;
        if already > 0 {
            return Err(DataError::new(
                ErrorKind::Duplicate,
                "the profile is already enrolled in this course",
            ));
        }

        self.enrollments.insert(&enrollment).await
    }

    async fn update_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: EnrollmentPatch,
    ) -> Result<Enrollment, DataError> {
        let changes = payload::enrollment_changes(&patch)?;
        self.enrollments.update(ctx, id, &changes).await
    }

    async fn delete_enrollment(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.enrollments.delete(ctx, id).await
    }
}
