//! Resource API modules: one typed client per backend collection

pub mod authors;
pub mod books;
pub mod borrowed_books;
pub mod members;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    models::{Draft, ListQuery, Page, QueryParams, ResourceKind},
    transport::{ApiRequest, Transport},
};

pub use authors::AuthorsApi;
pub use books::BooksApi;
pub use borrowed_books::BorrowedBooksApi;
pub use members::MembersApi;

/// Outcome of a write operation: the returned value and the resources whose
/// cached lists are no longer accurate
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    pub data: T,
    pub invalidates: Vec<ResourceKind>,
}

impl<T> Mutation<T> {
    pub fn new(data: T, invalidates: &[ResourceKind]) -> Self {
        Self {
            data,
            invalidates: invalidates.to_vec(),
        }
    }

    pub fn into_data(self) -> T {
        self.data
    }
}

/// A resource whose list endpoint can back a query cache
#[async_trait]
pub trait PagedResource: Clone + Send + Sync + 'static {
    type Entity: DeserializeOwned + Send + Sync + 'static;
    type Filters: ListQuery;

    async fn list(&self, filters: &Self::Filters) -> ApiResult<Page<Self::Entity>>;
}

/// Shared CRUD plumbing for one collection
#[derive(Clone)]
pub(crate) struct ResourceClient {
    transport: Arc<dyn Transport>,
    kind: ResourceKind,
}

impl ResourceClient {
    pub(crate) fn new(transport: Arc<dyn Transport>, kind: ResourceKind) -> Self {
        Self { transport, kind }
    }

    pub(crate) fn path(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.kind.path().to_string()
        } else {
            format!("{}/{}", self.kind.path(), suffix)
        }
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        self.transport.request(request).await
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        decode(self.send(request).await?)
    }

    pub(crate) async fn fetch_page<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<Page<T>> {
        let page: Page<T> = self.fetch(request).await?;
        page.check_invariants()?;
        Ok(page)
    }

    pub(crate) async fn list<F: ListQuery, T: DeserializeOwned>(&self, filters: &F) -> ApiResult<Page<T>> {
        let filters = filters.canonical();
        filters.validate()?;
        self.fetch_page(ApiRequest::get(self.path("")).params(filters.to_params()))
            .await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, id: i64) -> ApiResult<T> {
        self.fetch(ApiRequest::get(self.path(&id.to_string()))).await
    }

    pub(crate) async fn create<D: Draft, T: DeserializeOwned>(&self, draft: &D) -> ApiResult<T> {
        draft.check()?;
        let body = serde_json::to_value(draft)?;
        self.fetch(ApiRequest::post(self.path("")).body(body)).await
    }

    pub(crate) async fn update<D: Draft, T: DeserializeOwned>(&self, id: i64, draft: &D) -> ApiResult<T> {
        draft.check()?;
        let body = serde_json::to_value(draft)?;
        self.fetch(ApiRequest::put(self.path(&id.to_string())).body(body))
            .await
    }

    pub(crate) async fn remove(&self, id: i64) -> ApiResult<()> {
        self.send(ApiRequest::delete(self.path(&id.to_string())))
            .await
            .map(|_| ())
    }

    pub(crate) async fn search<T: DeserializeOwned>(
        &self,
        query: &str,
        page: u32,
        size: u32,
        extra: QueryParams,
    ) -> ApiResult<Page<T>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::Validation("Search query must not be blank".to_string()));
        }
        if size == 0 {
            return Err(ApiError::Validation("Page size must be greater than zero".to_string()));
        }
        let mut params = vec![
            ("query".to_string(), query.to_string()),
            ("page".to_string(), page.to_string()),
            ("size".to_string(), size.to_string()),
        ];
        params.extend(extra);
        self.fetch_page(ApiRequest::get(self.path("search")).params(params))
            .await
    }

    /// Unpaginated `GET /{resource}/all`
    pub(crate) async fn all<T: DeserializeOwned>(&self) -> ApiResult<Vec<T>> {
        self.fetch(ApiRequest::get(self.path("all"))).await
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(ApiError::from)
}

/// Container for all resource clients, sharing one transport
#[derive(Clone)]
pub struct Resources {
    pub authors: AuthorsApi,
    pub books: BooksApi,
    pub members: MembersApi,
    pub borrowed_books: BorrowedBooksApi,
}

impl Resources {
    /// Create all resource clients with the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            authors: AuthorsApi::new(transport.clone()),
            books: BooksApi::new(transport.clone()),
            members: MembersApi::new(transport.clone()),
            borrowed_books: BorrowedBooksApi::new(transport),
        }
    }
}
