//! Borrowed books API: borrow records and the circulation actions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{Mutation, PagedResource, ResourceClient};
use crate::{
    error::ApiResult,
    models::{
        borrowed_book::check_date_range, BorrowRequest, BorrowedBook, BorrowedBookDraft,
        BorrowedBookFilters, Page, QueryParams, ResourceKind,
    },
    transport::{ApiRequest, Transport},
};

/// Circulation changes a book's available copies and a member's active
/// borrow count, so every write touches all three lists
const WRITE_INVALIDATES: &[ResourceKind] = &[
    ResourceKind::BorrowedBooks,
    ResourceKind::Books,
    ResourceKind::Members,
];

#[derive(Clone)]
pub struct BorrowedBooksApi {
    client: ResourceClient,
}

impl BorrowedBooksApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            client: ResourceClient::new(transport, ResourceKind::BorrowedBooks),
        }
    }

    pub async fn list(&self, filters: &BorrowedBookFilters) -> ApiResult<Page<BorrowedBook>> {
        self.client.list(filters).await
    }

    pub async fn all(&self) -> ApiResult<Vec<BorrowedBook>> {
        self.client.all().await
    }

    pub async fn get(&self, id: i64) -> ApiResult<BorrowedBook> {
        self.client.get(id).await
    }

    /// Records are opened with [`borrow`](Self::borrow); this is the plain
    /// create endpoint for back-office corrections
    pub async fn create(&self, draft: &BorrowedBookDraft) -> ApiResult<Mutation<BorrowedBook>> {
        let record = self.client.create(draft).await?;
        Ok(Mutation::new(record, WRITE_INVALIDATES))
    }

    pub async fn update(
        &self,
        id: i64,
        draft: &BorrowedBookDraft,
    ) -> ApiResult<Mutation<BorrowedBook>> {
        let record = self.client.update(id, draft).await?;
        Ok(Mutation::new(record, WRITE_INVALIDATES))
    }

    pub async fn remove(&self, id: i64) -> ApiResult<Mutation<()>> {
        self.client.remove(id).await?;
        tracing::info!(borrow_id = id, "Borrow record deleted");
        Ok(Mutation::new((), WRITE_INVALIDATES))
    }

    pub async fn search(&self, query: &str, page: u32, size: u32) -> ApiResult<Page<BorrowedBook>> {
        self.search_between(query, None, None, page, size).await
    }

    /// Search restricted to borrow dates within `[start, end]`
    pub async fn search_between(
        &self,
        query: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<BorrowedBook>> {
        check_date_range(start, end)?;
        let mut extra = QueryParams::new();
        if let Some(start) = start {
            extra.push(("startDate".to_string(), start.to_string()));
        }
        if let Some(end) = end {
            extra.push(("endDate".to_string(), end.to_string()));
        }
        self.client.search(query, page, size, extra).await
    }

    /// Lend a book to a member
    pub async fn borrow(&self, request: &BorrowRequest) -> ApiResult<Mutation<BorrowedBook>> {
        request.check()?;
        let record: BorrowedBook = self
            .client
            .fetch(ApiRequest::post(self.client.path("borrow")).params(request.to_params()))
            .await?;
        tracing::info!(
            borrow_id = record.id,
            member_id = request.member_id,
            book_id = request.book_id,
            "Book borrowed"
        );
        Ok(Mutation::new(record, WRITE_INVALIDATES))
    }

    pub async fn return_item(&self, id: i64) -> ApiResult<Mutation<BorrowedBook>> {
        self.circulation_action(id, "return").await
    }

    pub async fn mark_lost(&self, id: i64) -> ApiResult<Mutation<BorrowedBook>> {
        self.circulation_action(id, "mark-lost").await
    }

    pub async fn by_member(&self, member_id: i64) -> ApiResult<Vec<BorrowedBook>> {
        self.client
            .fetch(ApiRequest::get(self.client.path(&format!("member/{}", member_id))))
            .await
    }

    /// Records the member has not returned yet
    pub async fn active_by_member(&self, member_id: i64) -> ApiResult<Vec<BorrowedBook>> {
        self.client
            .fetch(ApiRequest::get(
                self.client.path(&format!("member/{}/active", member_id)),
            ))
            .await
    }

    pub async fn by_book(&self, book_id: i64) -> ApiResult<Vec<BorrowedBook>> {
        self.client
            .fetch(ApiRequest::get(self.client.path(&format!("book/{}", book_id))))
            .await
    }

    pub async fn overdue(&self) -> ApiResult<Vec<BorrowedBook>> {
        self.client
            .fetch(ApiRequest::get(self.client.path("overdue")))
            .await
    }

    pub async fn current_borrows_count(&self) -> ApiResult<u64> {
        self.client
            .fetch(ApiRequest::get(self.client.path("statistics/current-borrows")))
            .await
    }

    pub async fn overdue_count(&self) -> ApiResult<u64> {
        self.client
            .fetch(ApiRequest::get(self.client.path("statistics/overdue-count")))
            .await
    }

    async fn circulation_action(&self, id: i64, action: &str) -> ApiResult<Mutation<BorrowedBook>> {
        let record: BorrowedBook = self
            .client
            .fetch(ApiRequest::patch(self.client.path(&format!("{}/{}", id, action))))
            .await?;
        tracing::info!(borrow_id = id, action, status = %record.status, "Borrow record updated");
        Ok(Mutation::new(record, WRITE_INVALIDATES))
    }
}

#[async_trait]
impl PagedResource for BorrowedBooksApi {
    type Entity = BorrowedBook;
    type Filters = BorrowedBookFilters;

    async fn list(&self, filters: &BorrowedBookFilters) -> ApiResult<Page<BorrowedBook>> {
        BorrowedBooksApi::list(self, filters).await
    }
}
