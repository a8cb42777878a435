//! Typed list filters.
//!
//! Each filter only contributes conditions for the fields that are set.
//! `search` matches case-insensitively across the entity's text columns.

use datakit_db::filter::{DateRange, FilterCondition, FilterSet, FilterSetBuilder, IdFilter, id_value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CourseStatus, EnrollmentStatus, ProfileStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFilter {
    pub status: Option<ProfileStatus>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub created: Option<DateRange>,
    pub ids: Option<IdFilter>,
    /// Narrow to one accessible tenant.
    pub tenant_id: Option<Uuid>,
}

impl ProfileFilter {
    pub const SEARCH_FIELDS: &'static [&'static str] = &["display_name", "email"];
}

impl FilterSet for ProfileFilter {
    fn conditions(&self) -> Vec<FilterCondition> {
        FilterSetBuilder::new()
            .eq_opt("status", self.status.map(ProfileStatus::as_str))
            .eq_opt("role", self.role.as_deref())
            .eq_opt("tenant_id", self.tenant_id.map(id_value))
            .ids("id", self.ids.as_ref())
            .date_range("created_at", self.created.as_ref())
            .search(self.search.as_deref(), Self::SEARCH_FIELDS)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseFilter {
    pub status: Option<CourseStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_duration: Option<u32>,
    pub max_duration: Option<u32>,
    pub created: Option<DateRange>,
    pub ids: Option<IdFilter>,
    pub tenant_id: Option<Uuid>,
}

impl CourseFilter {
    pub const SEARCH_FIELDS: &'static [&'static str] = &["title", "description"];
}

impl FilterSet for CourseFilter {
    fn conditions(&self) -> Vec<FilterCondition> {
        FilterSetBuilder::new()
            .eq_opt("status", self.status.map(CourseStatus::as_str))
            .eq_opt("category", self.category.as_deref())
            .eq_opt("tenant_id", self.tenant_id.map(id_value))
            .ids("id", self.ids.as_ref())
            .range("duration_minutes", self.min_duration, self.max_duration)
            .date_range("created_at", self.created.as_ref())
            .search(self.search.as_deref(), Self::SEARCH_FIELDS)
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentFilter {
    pub status: Option<EnrollmentStatus>,
    pub profile_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub min_progress: Option<u8>,
    pub max_progress: Option<u8>,
    pub enrolled: Option<DateRange>,
    pub ids: Option<IdFilter>,
    /// Category of the enrolled course; requires a join on `courses`.
    pub course_category: Option<String>,
    pub tenant_id: Option<Uuid>,
}

impl EnrollmentFilter {
    pub const COURSE_CATEGORY_FIELD: &'static str = "courses.category";

    /// True when the conditions reference course columns.
    #[must_use]
    pub fn joins_courses(&self) -> bool {
        self.course_category
            .as_deref()
            .is_some_and(|c| !c.is_empty())
    }
}

impl FilterSet for EnrollmentFilter {
    fn conditions(&self) -> Vec<FilterCondition> {
        FilterSetBuilder::new()
            .eq_opt("status", self.status.map(EnrollmentStatus::as_str))
            .eq_opt("profile_id", self.profile_id.map(id_value))
            .eq_opt("course_id", self.course_id.map(id_value))
            .eq_opt("tenant_id", self.tenant_id.map(id_value))
            .ids("id", self.ids.as_ref())
            .range("progress", self.min_progress, self.max_progress)
            .date_range("enrolled_at", self.enrolled.as_ref())
            .eq_opt(Self::COURSE_CATEGORY_FIELD, self.course_category.as_deref())
            .build()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use datakit_db::filter::{FilterOperator, JoinOperator};
    use serde_json::json;

    #[test]
    fn empty_filter_yields_no_conditions() {
        assert!(ProfileFilter::default().to_conditions().is_empty());
        assert!(CourseFilter::default().to_conditions().is_empty());
        assert!(EnrollmentFilter::default().to_conditions().is_empty());
    }

    #[test]
    fn profile_status_and_search() {
        let filter = ProfileFilter {
            status: Some(ProfileStatus::Active),
            search: Some("  jane ".to_owned()),
            ..ProfileFilter::default()
        };
        let conditions = filter.to_conditions();

        assert_eq!(conditions.len(), 3);
        assert_eq!(conditions[0], FilterCondition::eq("status", "active"));
        let searched: Vec<_> = conditions[1..]
            .iter()
            .map(|c| (c.field.as_str(), c.operator, c.value.clone(), c.join_operator))
            .collect();
        assert_eq!(
            searched,
            vec![
                ("display_name", FilterOperator::Like, json!("jane"), JoinOperator::Or),
                ("email", FilterOperator::Like, json!("jane"), JoinOperator::Or),
            ]
        );
    }

    #[test]
    fn blank_strings_are_dropped() {
        let filter = CourseFilter {
            category: Some(String::new()),
            search: Some("   ".to_owned()),
            ..CourseFilter::default()
        };
        assert!(filter.to_conditions().is_empty());
    }

    #[test]
    fn course_ranges_are_half_open_when_one_side_is_missing() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filter = CourseFilter {
            min_duration: Some(30),
            created: Some(DateRange::new(Some(start), None)),
            ..CourseFilter::default()
        };
        let conditions = filter.to_conditions();
        assert_eq!(
            conditions,
            vec![
                FilterCondition::gte("duration_minutes", 30),
                FilterCondition::gte("created_at", "2024-01-01T00:00:00.000000000Z"),
            ]
        );
    }

    #[test]
    fn enrollment_ids_and_category() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let filter = EnrollmentFilter {
            ids: Some(IdFilter::Many(vec![a, b])),
            course_category: Some("safety".to_owned()),
            ..EnrollmentFilter::default()
        };
        assert!(filter.joins_courses());

        let conditions = filter.to_conditions();
        assert_eq!(conditions[0].operator, FilterOperator::In);
        assert_eq!(conditions[0].value, json!([a.to_string(), b.to_string()]));
        assert_eq!(conditions[1], FilterCondition::eq("courses.category", "safety"));
    }
}
