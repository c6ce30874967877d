//! Pagination, sorting and filter-set types shared by every resource

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use super::author::AuthorFilters;
use super::book::BookFilters;
use super::borrowed_book::BorrowedBookFilters;
use super::member::MemberFilters;
use crate::error::{ApiError, ApiResult};

/// Query string as sent to the backend: ordered key/value pairs, unset fields omitted
pub type QueryParams = Vec<(String, String)>;

/// Backend resource collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Authors,
    Books,
    Members,
    BorrowedBooks,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Authors,
        ResourceKind::Books,
        ResourceKind::Members,
        ResourceKind::BorrowedBooks,
    ];

    /// Path segment under the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Authors => "authors",
            ResourceKind::Books => "books",
            ResourceKind::Members => "members",
            ResourceKind::BorrowedBooks => "borrowed-books",
        }
    }

    /// Human readable plural, used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Authors => "authors",
            ResourceKind::Books => "books",
            ResourceKind::Members => "members",
            ResourceKind::BorrowedBooks => "borrowed books",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ApiError::Validation(format!(
                "Unknown sort direction '{}'",
                other
            ))),
        }
    }
}

/// Pagination, sort and free-text search common to all list endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageQuery {
    /// Zero-based page index
    pub page: u32,
    /// Page size, must be positive
    pub size: u32,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
    pub search: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: PageQuery::DEFAULT_SIZE,
            sort_by: None,
            sort_dir: None,
            search: None,
        }
    }
}

impl PageQuery {
    pub const DEFAULT_SIZE: u32 = 10;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, dir: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_dir = Some(dir);
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.search = normalize_search(term);
        self
    }

    /// Trim free-text fields and drop the ones left blank
    pub fn canonicalize(&mut self) {
        self.search = self.search.as_deref().and_then(normalize_search);
        self.sort_by = self
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    pub fn validate(&self) -> ApiResult<()> {
        if self.size == 0 {
            return Err(ApiError::Validation(
                "Page size must be greater than zero".to_string(),
            ));
        }
        if let Some(field) = &self.sort_by {
            let valid = !field.is_empty()
                && field
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            if !valid {
                return Err(ApiError::Validation(format!(
                    "Invalid sort field '{}'",
                    field
                )));
            }
        }
        if matches!(&self.search, Some(s) if s.trim().is_empty()) {
            return Err(ApiError::Validation(
                "Search term must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    pub fn push_params(&self, params: &mut QueryParams) {
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("size".to_string(), self.size.to_string()));
        if let Some(sort_by) = &self.sort_by {
            params.push(("sortBy".to_string(), sort_by.clone()));
        }
        if let Some(dir) = self.sort_dir {
            params.push(("sortDir".to_string(), dir.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
    }
}

/// Trimmed search term, or `None` when nothing is left to search for
pub fn normalize_search(term: &str) -> Option<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Push an optional constraint as a query parameter
pub(crate) fn push_opt<T: ToString>(params: &mut QueryParams, key: &str, value: &Option<T>) {
    if let Some(v) = value {
        params.push((key.to_string(), v.to_string()));
    }
}

/// Filters accepted by a paginated list endpoint
pub trait ListQuery: Clone + Debug + PartialEq + Send + Sync + 'static {
    const RESOURCE: ResourceKind;

    fn page_query(&self) -> &PageQuery;

    fn page_query_mut(&mut self) -> &mut PageQuery;

    /// Entity-specific checks, run after the common ones
    fn validate_constraints(&self) -> ApiResult<()> {
        Ok(())
    }

    fn push_constraint_params(&self, _params: &mut QueryParams) {}

    fn into_filter_set(self) -> FilterSet;

    fn validate(&self) -> ApiResult<()> {
        self.page_query().validate()?;
        self.validate_constraints()
    }

    /// Copy with free-text fields trimmed and blanks removed
    fn canonical(&self) -> Self {
        let mut filters = self.clone();
        filters.page_query_mut().canonicalize();
        filters
    }

    fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        self.page_query().push_params(&mut params);
        self.push_constraint_params(&mut params);
        params
    }

    /// Canonical cache identity for these filters
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(Self::RESOURCE, self.clone().into_filter_set())
    }
}

/// Tagged filter variant over the four resources
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterSet {
    Authors(AuthorFilters),
    Books(BookFilters),
    Members(MemberFilters),
    BorrowedBooks(BorrowedBookFilters),
}

impl FilterSet {
    pub fn resource(&self) -> ResourceKind {
        match self {
            FilterSet::Authors(_) => ResourceKind::Authors,
            FilterSet::Books(_) => ResourceKind::Books,
            FilterSet::Members(_) => ResourceKind::Members,
            FilterSet::BorrowedBooks(_) => ResourceKind::BorrowedBooks,
        }
    }

    pub fn page_query(&self) -> &PageQuery {
        match self {
            FilterSet::Authors(f) => f.page_query(),
            FilterSet::Books(f) => f.page_query(),
            FilterSet::Members(f) => f.page_query(),
            FilterSet::BorrowedBooks(f) => f.page_query(),
        }
    }

    fn page_query_mut(&mut self) -> &mut PageQuery {
        match self {
            FilterSet::Authors(f) => f.page_query_mut(),
            FilterSet::Books(f) => f.page_query_mut(),
            FilterSet::Members(f) => f.page_query_mut(),
            FilterSet::BorrowedBooks(f) => f.page_query_mut(),
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        match self {
            FilterSet::Authors(f) => f.validate(),
            FilterSet::Books(f) => f.validate(),
            FilterSet::Members(f) => f.validate(),
            FilterSet::BorrowedBooks(f) => f.validate(),
        }
    }

    pub fn to_params(&self) -> QueryParams {
        match self {
            FilterSet::Authors(f) => f.to_params(),
            FilterSet::Books(f) => f.to_params(),
            FilterSet::Members(f) => f.to_params(),
            FilterSet::BorrowedBooks(f) => f.to_params(),
        }
    }

    pub fn canonical(mut self) -> Self {
        self.page_query_mut().canonicalize();
        self
    }
}

/// Identity of a cache entry: resource plus canonical filters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: ResourceKind,
    pub filters: FilterSet,
}

impl CacheKey {
    pub fn new(resource: ResourceKind, filters: FilterSet) -> Self {
        Self {
            resource,
            filters: filters.canonical(),
        }
    }
}
