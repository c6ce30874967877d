//! Authors API

use std::sync::Arc;

use async_trait::async_trait;

use super::{Mutation, PagedResource, ResourceClient};
use crate::{
    error::ApiResult,
    models::{Author, AuthorDraft, AuthorFilters, Page, QueryParams, ResourceKind},
    transport::Transport,
};

/// Creating an author only adds a row to the author lists
const CREATE_INVALIDATES: &[ResourceKind] = &[ResourceKind::Authors];
/// Books embed an author snapshot, so edits show up in book lists too
const WRITE_INVALIDATES: &[ResourceKind] = &[ResourceKind::Authors, ResourceKind::Books];

#[derive(Clone)]
pub struct AuthorsApi {
    client: ResourceClient,
}

impl AuthorsApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            client: ResourceClient::new(transport, ResourceKind::Authors),
        }
    }

    pub async fn list(&self, filters: &AuthorFilters) -> ApiResult<Page<Author>> {
        self.client.list(filters).await
    }

    /// All authors without pagination, for pickers
    pub async fn all(&self) -> ApiResult<Vec<Author>> {
        self.client.all().await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Author> {
        self.client.get(id).await
    }

    pub async fn create(&self, draft: &AuthorDraft) -> ApiResult<Mutation<Author>> {
        let author: Author = self.client.create(draft).await?;
        tracing::info!(author_id = author.id, "Author created");
        Ok(Mutation::new(author, CREATE_INVALIDATES))
    }

    pub async fn update(&self, id: i64, draft: &AuthorDraft) -> ApiResult<Mutation<Author>> {
        let author = self.client.update(id, draft).await?;
        Ok(Mutation::new(author, WRITE_INVALIDATES))
    }

    pub async fn remove(&self, id: i64) -> ApiResult<Mutation<()>> {
        self.client.remove(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(Mutation::new((), WRITE_INVALIDATES))
    }

    pub async fn search(&self, query: &str, page: u32, size: u32) -> ApiResult<Page<Author>> {
        self.client.search(query, page, size, QueryParams::new()).await
    }
}

#[async_trait]
impl PagedResource for AuthorsApi {
    type Entity = Author;
    type Filters = AuthorFilters;

    async fn list(&self, filters: &AuthorFilters) -> ApiResult<Page<Author>> {
        AuthorsApi::list(self, filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::resources::test_support::{author_json, page_json};
    use crate::transport::MockTransport;
    use reqwest::Method;

    #[tokio::test]
    async fn test_list_sends_filters() {
        let mut transport = MockTransport::new();
        transport
            .expect_request()
            .withf(|req| {
                req.method == Method::GET
                    && req.path == "authors"
                    && req.params.contains(&("search".to_string(), "le guin".to_string()))
            })
            .times(1)
            .returning(|_| Ok(page_json(vec![author_json(1)], 0, 10, 1)));

        let api = AuthorsApi::new(Arc::new(transport));
        let mut filters = AuthorFilters::default();
        filters.query.search = Some(" le guin ".to_string());
        let page = api.list(&filters).await.unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].name, "Author 1");
    }

    #[tokio::test]
    async fn test_update_invalidates_books() {
        let mut transport = MockTransport::new();
        transport
            .expect_request()
            .withf(|req| req.method == Method::PUT && req.path == "authors/1")
            .returning(|_| Ok(author_json(1)));

        let api = AuthorsApi::new(Arc::new(transport));
        let draft = AuthorDraft {
            name: "Author 1".to_string(),
            ..Default::default()
        };
        let mutation = api.update(1, &draft).await.unwrap();
        assert_eq!(
            mutation.invalidates,
            vec![ResourceKind::Authors, ResourceKind::Books]
        );
    }

    #[tokio::test]
    async fn test_invalid_draft_never_hits_network() {
        let mut transport = MockTransport::new();
        transport.expect_request().never();

        let api = AuthorsApi::new(Arc::new(transport));
        let result = api.create(&AuthorDraft::default()).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_search_rejected() {
        let mut transport = MockTransport::new();
        transport.expect_request().never();

        let api = AuthorsApi::new(Arc::new(transport));
        assert!(api.search("   ", 0, 10).await.is_err());
    }
}
