//! Member model and related types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::borrowed_book::BorrowedBook;
use super::query::{push_opt, FilterSet, ListQuery, PageQuery, QueryParams, ResourceKind};
use super::{validate_not_blank, Draft};

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Active,
    Suspended,
    Expired,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Suspended => "SUSPENDED",
            MemberStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = crate::error::ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(MemberStatus::Active),
            "SUSPENDED" => Ok(MemberStatus::Suspended),
            "EXPIRED" => Ok(MemberStatus::Expired),
            other => Err(crate::error::ApiError::Validation(format!(
                "Unknown member status '{}'",
                other
            ))),
        }
    }
}

/// Library member as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub membership_date: Option<NaiveDateTime>,
    pub status: MemberStatus,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// Member together with their borrow records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWithBorrows {
    #[serde(flatten)]
    pub member: Member,
    /// Absent when the backend does not serialize the association
    #[serde(default)]
    pub borrowed_books: Vec<BorrowedBook>,
}

impl MemberWithBorrows {
    /// Records the member has not returned yet
    pub fn active_borrows(&self) -> impl Iterator<Item = &BorrowedBook> {
        self.borrowed_books.iter().filter(|record| record.status.is_open())
    }
}

/// Create/update member request.
///
/// Status and membership date are managed by the backend; use the
/// suspend/activate actions to change status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MemberDraft {
    #[validate(
        length(max = 100, message = "Name must not exceed 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(
        email(message = "Email should be valid"),
        length(max = 100, message = "Email must not exceed 100 characters")
    )]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20, message = "Phone must not exceed 20 characters"))]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200, message = "Address must not exceed 200 characters"))]
    pub address: Option<String>,
}

impl Draft for MemberDraft {}

impl From<&Member> for MemberDraft {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            address: member.address.clone(),
        }
    }
}

/// Member list filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MemberFilters {
    pub query: PageQuery,
    pub status: Option<MemberStatus>,
}

impl ListQuery for MemberFilters {
    const RESOURCE: ResourceKind = ResourceKind::Members;

    fn page_query(&self) -> &PageQuery {
        &self.query
    }

    fn page_query_mut(&mut self) -> &mut PageQuery {
        &mut self.query
    }

    fn push_constraint_params(&self, params: &mut QueryParams) {
        push_opt(params, "status", &self.status);
    }

    fn into_filter_set(self) -> FilterSet {
        FilterSet::Members(self)
    }
}
