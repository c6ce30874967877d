//! Borrow record model and related types

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::book::Book;
use super::member::Member;
use super::query::{push_opt, FilterSet, ListQuery, PageQuery, QueryParams, ResourceKind};
use super::Draft;
use crate::error::{ApiError, ApiResult};

/// Borrow record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
    Overdue,
    Lost,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "BORROWED",
            BorrowStatus::Returned => "RETURNED",
            BorrowStatus::Overdue => "OVERDUE",
            BorrowStatus::Lost => "LOST",
        }
    }

    /// Whether the book is still out with the member
    pub fn is_open(&self) -> bool {
        matches!(self, BorrowStatus::Borrowed | BorrowStatus::Overdue)
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BORROWED" => Ok(BorrowStatus::Borrowed),
            "RETURNED" => Ok(BorrowStatus::Returned),
            "OVERDUE" => Ok(BorrowStatus::Overdue),
            "LOST" => Ok(BorrowStatus::Lost),
            other => Err(ApiError::Validation(format!(
                "Unknown borrow status '{}'",
                other
            ))),
        }
    }
}

/// Borrow record with embedded book and member snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub id: i64,
    pub book: Book,
    pub member: Member,
    pub borrow_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl BorrowedBook {
    /// Overdue either per the backend status or because the due date has passed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.status {
            BorrowStatus::Overdue => true,
            BorrowStatus::Borrowed => self.due_date.map_or(false, |due| due < today),
            BorrowStatus::Returned | BorrowStatus::Lost => false,
        }
    }
}

/// Parameters of the borrow action
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct BorrowRequest {
    #[validate(range(min = 1, message = "Member id must be positive"))]
    pub member_id: i64,
    #[validate(range(min = 1, message = "Book id must be positive"))]
    pub book_id: i64,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 500, message = "Notes must not exceed 500 characters"))]
    pub notes: Option<String>,
}

impl BorrowRequest {
    pub fn new(member_id: i64, book_id: i64) -> Self {
        Self {
            member_id,
            book_id,
            due_date: None,
            notes: None,
        }
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn check(&self) -> ApiResult<()> {
        self.validate()?;
        Ok(())
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = vec![
            ("memberId".to_string(), self.member_id.to_string()),
            ("bookId".to_string(), self.book_id.to_string()),
        ];
        push_opt(&mut params, "dueDate", &self.due_date);
        push_opt(&mut params, "notes", &self.notes);
        params
    }
}

/// Update request for an existing borrow record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BorrowedBookDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BorrowStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "Notes must not exceed 500 characters"))]
    pub notes: Option<String>,
}

impl Draft for BorrowedBookDraft {}

/// Borrow record list filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BorrowedBookFilters {
    pub query: PageQuery,
    pub status: Option<BorrowStatus>,
    pub borrow_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListQuery for BorrowedBookFilters {
    const RESOURCE: ResourceKind = ResourceKind::BorrowedBooks;

    fn page_query(&self) -> &PageQuery {
        &self.query
    }

    fn page_query_mut(&mut self) -> &mut PageQuery {
        &mut self.query
    }

    fn validate_constraints(&self) -> ApiResult<()> {
        check_date_range(self.start_date, self.end_date)
    }

    fn push_constraint_params(&self, params: &mut QueryParams) {
        push_opt(params, "status", &self.status);
        push_opt(params, "borrowDate", &self.borrow_date);
        push_opt(params, "startDate", &self.start_date);
        push_opt(params, "endDate", &self.end_date);
    }

    fn into_filter_set(self) -> FilterSet {
        FilterSet::BorrowedBooks(self)
    }
}

pub(crate) fn check_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(ApiError::Validation(format!(
            "Start date {} is after end date {}",
            start, end
        ))),
        _ => Ok(()),
    }
}
