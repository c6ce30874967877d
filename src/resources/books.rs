//! Books API

use std::sync::Arc;

use async_trait::async_trait;

use super::{Mutation, PagedResource, ResourceClient};
use crate::{
    error::{ApiError, ApiResult},
    models::{Book, BookDraft, BookFilters, Page, QueryParams, ResourceKind},
    transport::{ApiRequest, Transport},
};

const CREATE_INVALIDATES: &[ResourceKind] = &[ResourceKind::Books];
/// Borrow records embed a book snapshot
const WRITE_INVALIDATES: &[ResourceKind] = &[ResourceKind::Books, ResourceKind::BorrowedBooks];

#[derive(Clone)]
pub struct BooksApi {
    client: ResourceClient,
}

impl BooksApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            client: ResourceClient::new(transport, ResourceKind::Books),
        }
    }

    pub async fn list(&self, filters: &BookFilters) -> ApiResult<Page<Book>> {
        self.client.list(filters).await
    }

    pub async fn all(&self) -> ApiResult<Vec<Book>> {
        self.client.all().await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Book> {
        self.client.get(id).await
    }

    pub async fn create(&self, draft: &BookDraft) -> ApiResult<Mutation<Book>> {
        let book: Book = self.client.create(draft).await?;
        tracing::info!(book_id = book.id, title = %book.title, "Book created");
        Ok(Mutation::new(book, CREATE_INVALIDATES))
    }

    pub async fn update(&self, id: i64, draft: &BookDraft) -> ApiResult<Mutation<Book>> {
        let book = self.client.update(id, draft).await?;
        Ok(Mutation::new(book, WRITE_INVALIDATES))
    }

    pub async fn remove(&self, id: i64) -> ApiResult<Mutation<()>> {
        self.client.remove(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(Mutation::new((), WRITE_INVALIDATES))
    }

    pub async fn search(&self, query: &str, page: u32, size: u32) -> ApiResult<Page<Book>> {
        self.client.search(query, page, size, QueryParams::new()).await
    }

    /// Distinct categories known to the catalog
    pub async fn categories(&self) -> ApiResult<Vec<String>> {
        self.client
            .fetch(ApiRequest::get(self.client.path("categories")))
            .await
    }

    pub async fn by_category(&self, category: &str, page: u32, size: u32) -> ApiResult<Page<Book>> {
        let category = category.trim();
        if category.is_empty() {
            return Err(ApiError::Validation("Category must not be blank".to_string()));
        }
        let segment = urlencoding::encode(category);
        let request = ApiRequest::get(self.client.path(&format!("by-category/{}", segment)))
            .params(page_params(page, size));
        self.client.fetch_page(request).await
    }

    pub async fn by_author(&self, author_id: i64, page: u32, size: u32) -> ApiResult<Page<Book>> {
        let request = ApiRequest::get(self.client.path(&format!("by-author/{}", author_id)))
            .params(page_params(page, size));
        self.client.fetch_page(request).await
    }

    /// Whether at least one copy can be borrowed right now
    pub async fn availability(&self, id: i64) -> ApiResult<bool> {
        self.client
            .fetch(ApiRequest::get(self.client.path(&format!("{}/availability", id))))
            .await
    }
}

fn page_params(page: u32, size: u32) -> QueryParams {
    vec![
        ("page".to_string(), page.to_string()),
        ("size".to_string(), size.to_string()),
    ]
}

#[async_trait]
impl PagedResource for BooksApi {
    type Entity = Book;
    type Filters = BookFilters;

    async fn list(&self, filters: &BookFilters) -> ApiResult<Page<Book>> {
        BooksApi::list(self, filters).await
    }
}
