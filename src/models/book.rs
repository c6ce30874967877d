//! Book model and related types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::author::Author;
use super::query::{push_opt, FilterSet, ListQuery, PageQuery, QueryParams, ResourceKind};
use super::{validate_not_blank, Draft};
use crate::error::{ApiError, ApiResult};

/// At or below this many available copies a book is shown as low stock
pub const LOW_STOCK_THRESHOLD: u32 = 2;

/// Book as returned by the backend, with an embedded author snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub isbn: Option<String>,
    pub author: Author,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub total_copies: u32,
    #[serde(default)]
    pub available_copies: u32,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Stock badge shown next to a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Unavailable,
    LowStock,
    Available,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    pub fn availability(&self) -> Availability {
        match self.available_copies {
            0 => Availability::Unavailable,
            n if n <= LOW_STOCK_THRESHOLD => Availability::LowStock,
            _ => Availability::Available,
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Availability::Unavailable => "Unavailable",
            Availability::LowStock => "Low Stock",
            Availability::Available => "Available",
        };
        write!(f, "{}", label)
    }
}

/// Reference to an existing author inside a book draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorRef {
    pub id: i64,
}

/// Create/update book request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BookDraft {
    #[validate(
        length(max = 255, message = "Title must not exceed 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 10, max = 17, message = "ISBN must be between 10 and 17 characters"))]
    pub isbn: Option<String>,
    pub author: AuthorRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100, message = "Category must not exceed 100 characters"))]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 9999, message = "Publication year is out of range"))]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl Draft for BookDraft {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        if self.available_copies > self.total_copies {
            return Err(ApiError::Validation(
                "Available copies cannot exceed total copies".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            author: AuthorRef { id: book.author.id },
            category: book.category.clone(),
            publication_year: book.publication_year,
            publisher: book.publisher.clone(),
            description: book.description.clone(),
            total_copies: book.total_copies,
            available_copies: book.available_copies,
        }
    }
}

/// Book list filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BookFilters {
    pub query: PageQuery,
    pub category: Option<String>,
    pub author_id: Option<i64>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub available: Option<bool>,
}

impl ListQuery for BookFilters {
    const RESOURCE: ResourceKind = ResourceKind::Books;

    fn page_query(&self) -> &PageQuery {
        &self.query
    }

    fn page_query_mut(&mut self) -> &mut PageQuery {
        &mut self.query
    }

    fn validate_constraints(&self) -> ApiResult<()> {
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if start > end {
                return Err(ApiError::Validation(format!(
                    "Start year {} is after end year {}",
                    start, end
                )));
            }
        }
        if matches!(&self.category, Some(c) if c.trim().is_empty()) {
            return Err(ApiError::Validation("Category must not be blank".to_string()));
        }
        Ok(())
    }

    fn push_constraint_params(&self, params: &mut QueryParams) {
        push_opt(params, "category", &self.category);
        push_opt(params, "authorId", &self.author_id);
        push_opt(params, "startYear", &self.start_year);
        push_opt(params, "endYear", &self.end_year);
        push_opt(params, "available", &self.available);
    }

    fn into_filter_set(self) -> FilterSet {
        FilterSet::Books(self)
    }
}
