//! Members API

use std::sync::Arc;

use async_trait::async_trait;

use super::{Mutation, PagedResource, ResourceClient};
use crate::{
    error::ApiResult,
    models::{Member, MemberDraft, MemberFilters, MemberWithBorrows, Page, QueryParams, ResourceKind},
    transport::{ApiRequest, Transport},
};

const CREATE_INVALIDATES: &[ResourceKind] = &[ResourceKind::Members];
/// Borrow records embed a member snapshot
const WRITE_INVALIDATES: &[ResourceKind] = &[ResourceKind::Members, ResourceKind::BorrowedBooks];

#[derive(Clone)]
pub struct MembersApi {
    client: ResourceClient,
}

impl MembersApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            client: ResourceClient::new(transport, ResourceKind::Members),
        }
    }

    pub async fn list(&self, filters: &MemberFilters) -> ApiResult<Page<Member>> {
        self.client.list(filters).await
    }

    pub async fn all(&self) -> ApiResult<Vec<Member>> {
        self.client.all().await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Member> {
        self.client.get(id).await
    }

    /// Member profile with their borrow history embedded
    pub async fn with_borrowed_books(&self, id: i64) -> ApiResult<MemberWithBorrows> {
        self.client
            .fetch(ApiRequest::get(
                self.client.path(&format!("{}/with-borrowed-books", id)),
            ))
            .await
    }

    pub async fn create(&self, draft: &MemberDraft) -> ApiResult<Mutation<Member>> {
        let member: Member = self.client.create(draft).await?;
        tracing::info!(member_id = member.id, "Member created");
        Ok(Mutation::new(member, CREATE_INVALIDATES))
    }

    pub async fn update(&self, id: i64, draft: &MemberDraft) -> ApiResult<Mutation<Member>> {
        let member = self.client.update(id, draft).await?;
        Ok(Mutation::new(member, WRITE_INVALIDATES))
    }

    pub async fn remove(&self, id: i64) -> ApiResult<Mutation<()>> {
        self.client.remove(id).await?;
        tracing::info!(member_id = id, "Member deleted");
        Ok(Mutation::new((), WRITE_INVALIDATES))
    }

    pub async fn search(&self, query: &str, page: u32, size: u32) -> ApiResult<Page<Member>> {
        self.client.search(query, page, size, QueryParams::new()).await
    }

    pub async fn suspend(&self, id: i64) -> ApiResult<Mutation<Member>> {
        self.status_action(id, "suspend").await
    }

    pub async fn activate(&self, id: i64) -> ApiResult<Mutation<Member>> {
        self.status_action(id, "activate").await
    }

    /// Server-side borrowing eligibility check
    pub async fn can_borrow(&self, id: i64) -> ApiResult<bool> {
        self.client
            .fetch(ApiRequest::get(self.client.path(&format!("{}/can-borrow", id))))
            .await
    }

    /// Number of books the member currently has out
    pub async fn current_borrows_count(&self, id: i64) -> ApiResult<u64> {
        self.client
            .fetch(ApiRequest::get(
                self.client.path(&format!("{}/current-borrows-count", id)),
            ))
            .await
    }

    async fn status_action(&self, id: i64, action: &str) -> ApiResult<Mutation<Member>> {
        let member: Member = self
            .client
            .fetch(ApiRequest::patch(self.client.path(&format!("{}/{}", id, action))))
            .await?;
        tracing::info!(member_id = id, action, status = %member.status, "Member status changed");
        Ok(Mutation::new(member, WRITE_INVALIDATES))
    }
}

#[async_trait]
impl PagedResource for MembersApi {
    type Entity = Member;
    type Filters = MemberFilters;

    async fn list(&self, filters: &MemberFilters) -> ApiResult<Page<Member>> {
        MembersApi::list(self, filters).await
    }
}
