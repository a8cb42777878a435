//! Turning create and patch payloads into models and change sets.
//!
//! Shared by the unified and legacy implementations so both accept and
//! reject exactly the same input.

use chrono::Utc;
use datakit_db::{Row, TenantFilter};
use datakit_security::TenantContext;
use serde_json::Value;
use training_data_sdk::{
    Course, CoursePatch, CourseStatus, DataError, Enrollment, EnrollmentPatch, EnrollmentStatus,
    NewCourse, NewEnrollment, NewProfile, Profile, ProfilePatch, ProfileStatus,
};
use uuid::Uuid;

use super::mapping::changes_row;

/// Tenant a new record is written to: the requested one or the caller's primary.
///
/// # Errors
/// `forbidden` when that tenant is outside the caller's reach.
pub fn target_tenant(ctx: &TenantContext, requested: Option<Uuid>) -> Result<Uuid, DataError> {
    let tenant = requested.unwrap_or_else(|| ctx.primary_tenant_id());
    TenantFilter::require_access(ctx, tenant).map_err(|err| {
        tracing::debug!(error = %err, "create rejected");
        DataError::forbidden("the target tenant is not accessible")
    })?;
    Ok(tenant)
}

/// # Errors
/// `validation` for invalid input, `forbidden` for an inaccessible tenant.
pub fn new_profile(ctx: &TenantContext, input: NewProfile) -> Result<Profile, DataError> {
    input.validate()?;
    Ok(Profile {
        id: Uuid::new_v4(),
        tenant_id: target_tenant(ctx, input.tenant_id)?,
        email: input.email.trim().to_lowercase(),
        display_name: input.display_name.trim().to_owned(),
        role: input.role,
        status: input.status.unwrap_or(ProfileStatus::Active),
        created_at: Utc::now(),
    })
}

/// # Errors
/// `validation` for invalid input, `forbidden` for an inaccessible tenant.
pub fn new_course(ctx: &TenantContext, input: NewCourse) -> Result<Course, DataError> {
    input.validate()?;
    Ok(Course {
        id: Uuid::new_v4(),
        tenant_id: target_tenant(ctx, input.tenant_id)?,
        title: input.title.trim().to_owned(),
        description: input.description,
        category: input.category,
        status: input.status.unwrap_or(CourseStatus::Draft),
        duration_minutes: input.duration_minutes,
        created_at: Utc::now(),
    })
}

/// # Errors
/// `forbidden` for an inaccessible tenant.
pub fn new_enrollment(ctx: &TenantContext, input: &NewEnrollment) -> Result<Enrollment, DataError> {
    Ok(Enrollment {
        id: Uuid::new_v4(),
        tenant_id: target_tenant(ctx, input.tenant_id)?,
        profile_id: input.profile_id,
        course_id: input.course_id,
        status: input.status.unwrap_or(EnrollmentStatus::Enrolled),
        progress: 0,
        enrolled_at: Utc::now(),
    })
}

/// # Errors
/// `validation` for an empty or invalid patch.
pub fn profile_changes(patch: &ProfilePatch) -> Result<Row, DataError> {
    patch.validate()?;
    let mut normalized = patch.clone();
    normalized.email = patch.email.as_deref().map(|e| e.trim().to_lowercase());
    normalized.display_name = patch.display_name.as_deref().map(|n| n.trim().to_owned());
    changes_row("profile", &normalized)
}

/// # Errors
/// `validation` for an empty or invalid patch.
pub fn course_changes(patch: &CoursePatch) -> Result<Row, DataError> {
    patch.validate()?;
    changes_row("course", patch)
}

/// # Errors
/// `validation` for an empty or invalid patch.
pub fn enrollment_changes(patch: &EnrollmentPatch) -> Result<Row, DataError> {
    patch.validate()?;
    let mut row = changes_row("enrollment", patch)?;
    if let Some(status) = patch.effective_status() {
        row.insert("status".to_owned(), Value::from(status.as_str()));
    }
    Ok(row)
}
