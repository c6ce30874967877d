//! Author model and related types

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::query::{FilterSet, ListQuery, PageQuery, ResourceKind};
use super::{validate_not_blank, Draft};

/// Author as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Create/update author request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthorDraft {
    #[validate(
        length(max = 100, message = "Author name must not exceed 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "Biography must not exceed 1000 characters"))]
    pub biography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50, message = "Nationality must not exceed 50 characters"))]
    pub nationality: Option<String>,
}

impl Draft for AuthorDraft {}

impl From<&Author> for AuthorDraft {
    fn from(author: &Author) -> Self {
        Self {
            name: author.name.clone(),
            biography: author.biography.clone(),
            birth_date: author.birth_date,
            nationality: author.nationality.clone(),
        }
    }
}

/// Author list filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AuthorFilters {
    pub query: PageQuery,
}

impl ListQuery for AuthorFilters {
    const RESOURCE: ResourceKind = ResourceKind::Authors;

    fn page_query(&self) -> &PageQuery {
        &self.query
    }

    fn page_query_mut(&mut self) -> &mut PageQuery {
        &mut self.query
    }

    fn into_filter_set(self) -> FilterSet {
        FilterSet::Authors(self)
    }
}
