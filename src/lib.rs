//! Library Dashboard
//!
//! Typed, cached client for the library management REST API: paginated
//! listing and search of authors, books, members and borrow records, the
//! circulation actions, and list view controllers that stay consistent as
//! the data changes underneath them.

use std::future::Future;
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod resources;
pub mod transport;
pub mod views;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};

use cache::QueryClient;
use models::{AuthorFilters, BookFilters, BorrowedBookFilters, MemberFilters, PageQuery};
use resources::{Mutation, Resources};
use transport::{HttpTransport, Transport};
use views::{AuthorsView, BooksView, BorrowedBooksView, ListView, MembersView, Overview};

/// Application context: configuration, resource clients and their query caches
#[derive(Clone)]
pub struct Dashboard {
    pub config: Arc<AppConfig>,
    pub resources: Arc<Resources>,
    pub queries: QueryClient,
}

impl Dashboard {
    /// Build a dashboard talking HTTP to the configured backend
    pub fn new(config: AppConfig) -> ApiResult<Self> {
        let transport = HttpTransport::new(&config.api)?;
        tracing::debug!(base_url = %transport.base_url(), "HTTP transport ready");
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let resources = Resources::new(transport);
        let queries = QueryClient::new(&resources, &config.cache);
        Self {
            config: Arc::new(config),
            resources: Arc::new(resources),
            queries,
        }
    }

    /// Drop every cached result
    pub fn reset(&self) {
        self.queries.clear();
        tracing::debug!("Query caches cleared");
    }

    /// Run a write operation and invalidate the lists it affects
    pub async fn mutate<T, Fut>(&self, operation: Fut) -> ApiResult<T>
    where
        Fut: Future<Output = ApiResult<Mutation<T>>>,
    {
        let mutation = operation.await?;
        Ok(self.queries.apply(mutation))
    }

    pub fn authors_view(&self) -> AuthorsView {
        ListView::new(self.queries.authors.clone(), AuthorFilters::default())
    }

    pub fn books_view(&self) -> BooksView {
        ListView::new(self.queries.books.clone(), BookFilters::default())
    }

    pub fn members_view(&self) -> MembersView {
        ListView::new(self.queries.members.clone(), MemberFilters::default())
    }

    pub fn borrowed_books_view(&self) -> BorrowedBooksView {
        ListView::new(
            self.queries.borrowed_books.clone(),
            BorrowedBookFilters::default(),
        )
    }

    /// Collection totals and borrow statistics for the home page
    pub async fn overview(&self) -> ApiResult<Overview> {
        // Single-row pages: only totalElements is needed
        let authors = AuthorFilters {
            query: PageQuery::new(0, 1),
        };
        let books = BookFilters {
            query: PageQuery::new(0, 1),
            ..Default::default()
        };
        let members = MemberFilters {
            query: PageQuery::new(0, 1),
            ..Default::default()
        };

        let borrowed = &self.resources.borrowed_books;
        let (authors, books, members, current_borrows, overdue_borrows) = tokio::try_join!(
            self.queries.authors.fetch(&authors),
            self.queries.books.fetch(&books),
            self.queries.members.fetch(&members),
            borrowed.current_borrows_count(),
            borrowed.overdue_count(),
        )?;

        Ok(Overview {
            total_books: books.total_elements,
            total_members: members.total_elements,
            total_authors: authors.total_elements,
            current_borrows,
            overdue_borrows,
        })
    }
}
