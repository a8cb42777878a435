use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use datakit_db::filter::{FilterCondition, FilterSet, id_value};
use datakit_db::pagination::{Page, PageRequest};
use datakit_db::{
    OperationWrapper, Paginator, QueryBuilder, RetryPolicy, Row, Scoped, SortDirection, Store,
    StoreError, TenantFilter,
};
use datakit_security::TenantContext;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use training_data_sdk::{
    Course, CourseFilter, CoursePatch, DataError, Enrollment, EnrollmentFilter, EnrollmentPatch,
    ErrorKind, NewCourse, NewEnrollment, NewProfile, Profile, ProfileFilter, ProfilePatch,
    TrainingDataApi,
};
use uuid::Uuid;

use crate::domain::mapping::{from_row, to_row};
use crate::domain::payload;

const PROFILES: &str = "profiles";
const COURSES: &str = "courses";
const ENROLLMENTS: &str = "enrollments";
const TENANT_COLUMN: &str = "tenant_id";

fn scoped(table: &str, ctx: &TenantContext) -> QueryBuilder<Scoped> {
    TenantFilter::apply_to_query(QueryBuilder::new(table), ctx, TENANT_COLUMN)
}

fn by_id(table: &str, ctx: &TenantContext, id: Uuid) -> QueryBuilder<Scoped> {
    scoped(table, ctx).where_condition(FilterCondition::eq("id", id_value(id)))
}

/// Legacy data service.
pub struct LegacyTrainingData {
    store: Arc<dyn Store>,
    paginator: Paginator,
    runner: OperationWrapper,
}

impl LegacyTrainingData {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, paginator: Paginator, timeout: Duration) -> Self {
        Self {
            store,
            paginator,
            runner: OperationWrapper::new(RetryPolicy::no_retry().with_timeout(timeout)),
        }
    }

    async fn run<T, F, Fut>(&self, op: &str, call: F) -> Result<T, DataError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        Ok(self.runner.execute_result(op, call).await?)
    }

    async fn page_of<T: DeserializeOwned>(
        &self,
        op: &str,
        entity: &str,
        query: QueryBuilder<Scoped>,
        page: PageRequest,
    ) -> Result<Page<T>, DataError> {
        let params = self.paginator.resolve(page);
        let store = &*self.store;

        let items = self
            .run(op, || query.clone().paginate_params(params).execute_simple(store))
            .await?;
        let total = self.run(op, || query.clone().count(store)).await?;

        Page::new(items, self.paginator.build_result(params.page, params.limit, total))
            .try_map(|row| from_row(entity, row))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        op: &str,
        entity: &str,
        table: &str,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<T, DataError> {
        let store = &*self.store;
        let row = self.run(op, || by_id(table, ctx, id).first(store)).await?;
        match row {
            Some(row) => from_row(entity, row),
            None => Err(DataError::not_found(entity, id)),
        }
    }

    async fn is_visible(
        &self,
        op: &str,
        table: &str,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<bool, DataError> {
        let store = &*self.store;
        Ok(self.run(op, || by_id(table, ctx, id).count(store)).await? > 0)
    }

    async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        op: &str,
        entity: &str,
        table: &str,
        model: &T,
    ) -> Result<T, DataError> {
        let row = to_row(entity, model)?;
        let store = &*self.store;
        let stored = self.run(op, || store.insert(table, row.clone())).await?;
        from_row(entity, stored)
    }

    async fn modify<T: DeserializeOwned>(
        &self,
        op: &str,
        entity: &str,
        table: &str,
        ctx: &TenantContext,
        id: Uuid,
        changes: &Row,
    ) -> Result<T, DataError> {
        let store = &*self.store;
        let touched = self
            .run(op, || by_id(table, ctx, id).update(store, changes))
            .await?;
        if touched == 0 {
            return Err(DataError::not_found(entity, id));
        }
        self.fetch(op, entity, table, ctx, id).await
    }

    async fn remove(
        &self,
        op: &str,
        entity: &str,
        table: &str,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<(), DataError> {
        let store = &*self.store;
        let removed = self.run(op, || by_id(table, ctx, id).delete(store)).await?;
        if removed == 0 {
            return Err(DataError::not_found(entity, id));
        }
        Ok(())
    }

    /// Ids of visible courses in `category`.
    async fn course_ids_in(
        &self,
        ctx: &TenantContext,
        category: &str,
    ) -> Result<Vec<Value>, DataError> {
        let query = scoped(COURSES, ctx).where_condition(FilterCondition::eq("category", category));
        let store = &*self.store;
        let rows = self
            .run("courses.by_category", || query.clone().execute_simple(store))
            .await?;
        Ok(rows.into_iter().filter_map(|mut row| row.remove("id")).collect())
    }
}

#[async_trait]
impl TrainingDataApi for LegacyTrainingData {
    async fn list_profiles(
        &self,
        ctx: &TenantContext,
        filter: ProfileFilter,
        page: PageRequest,
    ) -> Result<Page<Profile>, DataError> {
        let query = scoped(PROFILES, ctx)
            .where_many(&filter.to_conditions())
            .order_by("created_at", SortDirection::Desc)
            .order_by("id", SortDirection::Asc);
        self.page_of("profiles.list", "profile", query, page).await
    }

    async fn get_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<Profile, DataError> {
        self.fetch("profiles.get", "profile", PROFILES, ctx, id).await
    }

    async fn create_profile(
        &self,
        ctx: &TenantContext,
        new_profile: NewProfile,
    ) -> Result<Profile, DataError> {
        let profile = payload::new_profile(ctx, new_profile)?;
        self.insert("profiles.create", "profile", PROFILES, &profile).await
    }

    async fn update_profile(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<Profile, DataError> {
        let changes = payload::profile_changes(&patch)?;
        self.modify("profiles.update", "profile", PROFILES, ctx, id, &changes)
            .await
    }

    async fn delete_profile(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.remove("profiles.delete", "profile", PROFILES, ctx, id).await
    }

    async fn list_courses(
        &self,
        ctx: &TenantContext,
        filter: CourseFilter,
        page: PageRequest,
    ) -> Result<Page<Course>, DataError> {
        let query = scoped(COURSES, ctx)
            .where_many(&filter.to_conditions())
            .order_by("created_at", SortDirection::Desc)
            .order_by("id", SortDirection::Asc);
        self.page_of("courses.list", "course", query, page).await
    }

    async fn get_course(&self, ctx: &TenantContext, id: Uuid) -> Result<Course, DataError> {
        self.fetch("courses.get", "course", COURSES, ctx, id).await
    }

    async fn create_course(
        &self,
        ctx: &TenantContext,
        new_course: NewCourse,
    ) -> Result<Course, DataError> {
        let course = payload::new_course(ctx, new_course)?;
        self.insert("courses.create", "course", COURSES, &course).await
    }

    async fn update_course(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: CoursePatch,
    ) -> Result<Course, DataError> {
        let changes = payload::course_changes(&patch)?;
        self.modify("courses.update", "course", COURSES, ctx, id, &changes)
            .await
    }

    async fn delete_course(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.remove("courses.delete", "course", COURSES, ctx, id).await
    }

    async fn list_enrollments(
        &self,
        ctx: &TenantContext,
        filter: EnrollmentFilter,
        page: PageRequest,
    ) -> Result<Page<Enrollment>, DataError> {
        // category is resolved to course ids up front instead of joining
        let mut conditions: Vec<FilterCondition> = filter
            .to_conditions()
            .into_iter()
            .filter(|c| c.field != EnrollmentFilter::COURSE_CATEGORY_FIELD)
            .collect();
        if let Some(category) = filter.course_category.as_deref().filter(|c| !c.is_empty()) {
            let course_ids = self.course_ids_in(ctx, category).await?;
            if course_ids.is_empty() {
                let params = self.paginator.resolve(page);
                return Ok(Page::new(
                    Vec::new(),
                    self.paginator.build_result(params.page, params.limit, 0),
                ));
            }
            conditions.push(FilterCondition::in_list("course_id", course_ids));
        }

        let query = scoped(ENROLLMENTS, ctx)
            .where_many(&conditions)
            .order_by("enrolled_at", SortDirection::Desc)
            .order_by("id", SortDirection::Asc);
        self.page_of("enrollments.list", "enrollment", query, page)
            .await
    }

    async fn get_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> Result<Enrollment, DataError> {
        self.fetch("enrollments.get", "enrollment", ENROLLMENTS, ctx, id)
            .await
    }

    async fn create_enrollment(
        &self,
        ctx: &TenantContext,
        new_enrollment: NewEnrollment,
    ) -> Result<Enrollment, DataError> {
        let enrollment = payload::new_enrollment(ctx, &new_enrollment)?;

        if !self
            .is_visible("profiles.get", PROFILES, ctx, enrollment.profile_id)
            .await?
        {
            return Err(DataError::not_found("profile", enrollment.profile_id));
        }
        if !self
            .is_visible("courses.get", COURSES, ctx, enrollment.course_id)
            .await?
        {
            return Err(DataError::not_found("course", enrollment.course_id));
        }

        let store = &*self.store;
        let duplicate = scoped(ENROLLMENTS, ctx)
            .where_condition(FilterCondition::eq("profile_id", id_value(enrollment.profile_id)))
            .where_condition(FilterCondition::eq("course_id", id_value(enrollment.course_id)));
        let existing = self
            .run("enrollments.count", || duplicate.clone().count(store))
            .await?;
        if existing > 0 {
            return Err(DataError::new(
                ErrorKind::Duplicate,
                "the profile is already enrolled in this course",
            ));
        }

        self.insert("enrollments.create", "enrollment", ENROLLMENTS, &enrollment)
            .await
    }

    async fn update_enrollment(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: EnrollmentPatch,
    ) -> Result<Enrollment, DataError> {
        let changes = payload::enrollment_changes(&patch)?;
        self.modify("enrollments.update", "enrollment", ENROLLMENTS, ctx, id, &changes)
            .await
    }

    async fn delete_enrollment(&self, ctx: &TenantContext, id: Uuid) -> Result<(), DataError> {
        self.remove("enrollments.delete", "enrollment", ENROLLMENTS, ctx, id)
            .await
    }
}
