//! Compatibility facade.
//!
//! [`TrainingDataService`] is the only `TrainingDataApi` callers see. Each
//! method is routed under a stable operation name (`profiles.list`,
//! `courses.update`, ...) to the unified implementation ("new") or the
//! legacy one.

use std::sync::Arc;

use async_trait::async_trait;
use datakit_db::Store;
use datakit_db::pagination::{Page, PageRequest};
use datakit_migration::{MigrationRouter, MigrationSwitch, RoutingJournal};
use datakit_security::TenantContext;
use training_data_sdk::{
    Course, CourseFilter, CoursePatch, DataError, Enrollment, EnrollmentFilter, EnrollmentPatch,
    NewCourse, NewEnrollment, NewProfile, Profile, ProfileFilter, ProfilePatch, TrainingDataApi,
};
use uuid::Uuid;

use crate::config::TrainingDataConfig;
use crate::domain::service::UnifiedTrainingData;
use crate::legacy::LegacyTrainingData;

pub struct TrainingDataService {
    router: MigrationRouter,
    unified: Arc<dyn TrainingDataApi>,
    legacy: Arc<dyn TrainingDataApi>,
}

impl TrainingDataService {
    #[must_use]
    pub fn new(
        router: MigrationRouter,
        unified: Arc<dyn TrainingDataApi>,
        legacy: Arc<dyn TrainingDataApi>,
    ) -> Self {
        Self {
            router,
            unified,
            legacy,
        }
    }

    /// Wire both implementations over one store.
    #[must_use]
    pub fn from_config(store: Arc<dyn Store>, cfg: &TrainingDataConfig) -> Self {
        let journal = Arc::new(RoutingJournal::new(cfg.journal_capacity));
        let router =
            MigrationRouter::new(MigrationSwitch::new(cfg.migration)).with_journal(journal);

        let unified = UnifiedTrainingData::new(Arc::clone(&store), &cfg.data_access);
        let legacy = LegacyTrainingData::new(
            store,
            cfg.data_access.pagination,
            cfg.data_access.retry.timeout,
        );
        Self::new(router, Arc::new(unified), Arc::new(legacy))
    }

    /// Operator handle for flipping the migration flags at runtime.
    #[must_use]
    pub fn switch(&self) -> &MigrationSwitch {
        self.router.switch()
    }

    #[must_use]
    pub fn journal(&self) -> Option<&Arc<RoutingJournal>> {
        self.router.journal()
    }
}

#[async_trait]
impl TrainingDataApi for TrainingDataService {
    async fn list_profiles(
        &self,
        ctx: &TenantContext,
        filter: ProfileFilter,
        page: PageRequest,
    ) -> Result<Page<Profile>, DataError> {
        let fallback = filter.clone();
        self.router
            .route(
                "profiles.list",
                Some(ctx),
                || self.unified.list_profiles(ctx, filter, page),
                || self.legacy.list_profiles(ctx, fallback, page),
            )
            .await
    }

    async fn get_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<Profile, DataError> {
        self.router
            .route(
                "profiles.get",
                Some(ctx),
                || self.unified.get_profile(ctx, id),
                || self.legacy.get_profile(ctx, id),
            )
            .await
    }

    async fn create_profile(
        &self,
        ctx: &TenantContext,
        new_profile: NewProfile,
    ) -> Result<Profile, DataError> {
        let fallback = new_profile.clone();
        self.router
            .route(
                "profiles.create",
                Some(ctx),
                || self.unified.create_profile(ctx, new_profile),
                || self.legacy.create_profile(ctx, fallback),
            )
            .await
    }

    async fn update_profile(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, DataError> {
        let fallback = patch.clone();
        self.router
            .route(
                "profiles.update",
                Some(ctx),
                || self.unified.update_profile(ctx, id, patch),
                || self.legacy.update_profile(ctx, id, fallback),
            )
            .await
    }

    async fn delete_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.router
            .route(
                "profiles.delete",
                Some(ctx),
                || self.unified.delete_profile(ctx, id),
                || self.legacy.delete_profile(ctx, id),
            )
            .await
    }

    async fn list_courses(
        &self,
        ctx: &TenantContext,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>, DataError> {
        let fallback = filter.clone();
        self.router
            .route(
                "courses.list",
                Some(ctx),
                || self.unified.list_courses(ctx, filter, page),
                || self.legacy.list_courses(ctx, fallback, page),
            )
            .await
    }

    async fn get_course(&self, ctx: &TenantContext, id: Uuid) -> Result<Course, DataError> {
        self.router
            .route(
                "courses.get",
                Some(ctx),
                || self.unified.get_course(ctx, id),
                || self.legacy.get_course(ctx, id),
            )
            .await
    }

    async fn create_course(
        &self,
        ctx: &TenantContext,
        new_course: NewCourse,
    ) -> Result<Course, DataError> {
        let fallback = new_course.clone();
        self.router
            .route(
                "courses.create",
                Some(ctx),
                || self.unified.create_course(ctx, new_course),
                || self.legacy.create_course(ctx, fallback),
            )
            .await
    }

    async fn update_course(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Course, DataError> {
        let fallback = patch.clone();
        self.router
            .route(
                "courses.update",
                Some(ctx),
                || self.unified.update_course(ctx, id, patch),
                || self.legacy.update_course(ctx, id, fallback),
            )
            .await
    }

    async fn delete_course(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.router
            .route(
                "courses.delete",
                Some(ctx),
                || self.unified.delete_course(ctx, id),
                || self.legacy.delete_course(ctx, id),
            )
            .await
    }

    async fn list_enrollments(
        &self,
        ctx: &TenantContext,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Page<Enrollment>, DataError> {
        let fallback = filter.clone();
        self.router
            .route(
                "enrollments.list",
                Some(ctx),
                || self.unified.list_enrollments(ctx, filter, page),
                || self.legacy.list_enrollments(ctx, fallback, page),
            )
            .await
    }

    async fn get_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<Enrollment, DataError> {
        self.router
            .route(
                "enrollments.get",
                Some(ctx),
                || self.unified.get_enrollment(ctx, id),
                || self.legacy.get_enrollment(ctx, id),
            )
            .await
    }

    async fn create_enrollment(
        &self,
        ctx: &TenantContext,
        new_enrollment: NewEnrollment,
    ) -> Result<Enrollment, DataError> {
        let fallback = new_enrollment.clone();
        self.router
            .route(
                "enrollments.create",
                Some(ctx),
                || self.unified.create_enrollment(ctx, new_enrollment),
                || self.legacy.create_enrollment(ctx, fallback),
            )
            .await
    }

    async fn update_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: EnrollmentPatch,
    ) -> Result<Enrollment, DataError> {
        let fallback = patch.clone();
        self.router
            .route(
                "enrollments.update",
                Some(ctx),
                || self.unified.update_enrollment(ctx, id, patch),
                || self.legacy.update_enrollment(ctx, id, fallback),
            )
            .await
    }

    async fn delete_enrollment(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.router
            .route(
                "enrollments.delete",
                Some(ctx),
                || self.unified.delete_enrollment(ctx, id),
                || self.legacy.delete_enrollment(ctx, id),
            )
            .await
    }
}
