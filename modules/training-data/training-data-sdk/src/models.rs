//! Entity models and their create/patch payloads.
//!
//! Field names match the store columns; rows convert to and from these types
//! through `serde`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DataError;

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum!(ProfileStatus {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
});

status_enum!(CourseStatus {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

status_enum!(EnrollmentStatus {
    Enrolled => "enrolled",
    InProgress => "in_progress",
    Completed => "completed",
    Dropped => "dropped",
});

fn require_text(field: &str, value: &str) -> Result<(), DataError> {
    if value.trim().is_empty() {
        return Err(DataError::validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn require_email(value: &str) -> Result<(), DataError> {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DataError::validation("email must be a valid address")),
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    /// Owning tenant; the caller's primary tenant when absent.
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub display_name: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<ProfileStatus>,
}

impl NewProfile {
    /// # Errors
    /// Returns a `validation` [`DataError`] for a blank name or role or a malformed email.
    pub fn validate(&self) -> Result<(), DataError> {
        require_email(&self.email)?;
        require_text("display_name", &self.display_name)?;
        require_text("role", &self.role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub status: Option<ProfileStatus>,
}

impl ProfilePatch {
    /// # Errors
    /// Returns a `validation` [`DataError`] for an empty patch or an invalid field.
    pub fn validate(&self) -> Result<(), DataError> {
        if self == &Self::default() {
            return Err(DataError::validation("patch contains no changes"));
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        if let Some(name) = &self.display_name {
            require_text("display_name", name)?;
        }
        if let Some(role) = &self.role {
            require_text("role", role)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: CourseStatus,
    pub duration_minutes: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<CourseStatus>,
    pub duration_minutes: u32,
}

impl NewCourse {
    /// # Errors
    /// Returns a `validation` [`DataError`] for a blank title or a zero duration.
    pub fn validate(&self) -> Result<(), DataError> {
        require_text("title", &self.title)?;
        if self.duration_minutes == 0 {
            return Err(DataError::validation("duration_minutes must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub status: Option<CourseStatus>,
    pub duration_minutes: Option<u32>,
}

impl CoursePatch {
    /// # Errors
    /// Returns a `validation` [`DataError`] for an empty patch or an invalid field.
    pub fn validate(&self) -> Result<(), DataError> {
        if self == &Self::default() {
            return Err(DataError::validation("patch contains no changes"));
        }
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if self.duration_minutes == Some(0) {
            return Err(DataError::validation("duration_minutes must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Enrollments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub profile_id: Uuid,
    pub course_id: Uuid,
    pub status: EnrollmentStatus,
    /// Percent complete, 0 to 100.
    pub progress: u8,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEnrollment {
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub profile_id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub status: Option<EnrollmentStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentPatch {
    pub status: Option<EnrollmentStatus>,
    pub progress: Option<u8>,
}

impl EnrollmentPatch {
    /// # Errors
    /// Returns a `validation` [`DataError`] for an empty patch or progress above 100.
    pub fn validate(&self) -> Result<(), DataError> {
        if self == &Self::default() {
            return Err(DataError::validation("patch contains no changes"));
        }
        if self.progress.is_some_and(|p| p > 100) {
            return Err(DataError::validation("progress must be between 0 and 100"));
        }
        Ok(())
    }

    /// Status implied by the patch: reaching 100% completes the enrollment
    /// unless a status is given explicitly.
    #[must_use]
    pub fn effective_status(&self) -> Option<EnrollmentStatus> {
        match (self.status, self.progress) {
            (Some(status), _) => Some(status),
            (None, Some(100)) => Some(EnrollmentStatus::Completed),
            (None, Some(p)) if p > 0 => Some(EnrollmentStatus::InProgress),
            _ => None,
        }
    }
}
