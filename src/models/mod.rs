//! Data models for the library dashboard

pub mod author;
pub mod book;
pub mod borrowed_book;
pub mod member;
pub mod page;
pub mod query;

use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::error::ApiResult;

// Re-export commonly used types
pub use author::{Author, AuthorDraft, AuthorFilters};
pub use book::{Availability, Book, BookDraft, BookFilters};
pub use borrowed_book::{BorrowRequest, BorrowStatus, BorrowedBook, BorrowedBookDraft, BorrowedBookFilters};
pub use member::{Member, MemberDraft, MemberFilters, MemberStatus, MemberWithBorrows};
pub use page::Page;
pub use query::{CacheKey, FilterSet, ListQuery, PageQuery, QueryParams, ResourceKind, SortDirection};

/// Request body for create/update calls.
///
/// Drafts never carry server-assigned fields (id, createdAt, updatedAt) and are
/// checked locally before anything is sent.
pub trait Draft: Serialize + Validate + Send + Sync {
    fn check(&self) -> ApiResult<()> {
        self.validate()?;
        Ok(())
    }
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
