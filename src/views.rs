//! List view controllers
//!
//! A [`ListView`] owns the filters of one dashboard page and the state of its
//! latest load. Loads go through the query cache; a completion that belongs to
//! an older load is dropped so the view always reflects its current filters.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    cache::{PageResult, QueryCache},
    error::ApiError,
    models::{query::normalize_search, ListQuery, Page},
    resources::{AuthorsApi, BooksApi, BorrowedBooksApi, MembersApi, PagedResource},
};

pub type AuthorsView = ListView<AuthorsApi>;
pub type BooksView = ListView<BooksApi>;
pub type MembersView = ListView<MembersApi>;
pub type BorrowedBooksView = ListView<BorrowedBooksApi>;

/// Load state of a list view
#[derive(Debug)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(Arc<Page<T>>),
    Failed(ApiError),
}

impl<T> Clone for ViewState<T> {
    fn clone(&self) -> Self {
        match self {
            ViewState::Idle => ViewState::Idle,
            ViewState::Loading => ViewState::Loading,
            ViewState::Ready(page) => ViewState::Ready(page.clone()),
            ViewState::Failed(err) => ViewState::Failed(err.clone()),
        }
    }
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn page(&self) -> Option<&Arc<Page<T>>> {
        match self {
            ViewState::Ready(page) => Some(page),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ViewState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<PageResult<T>> for ViewState<T> {
    fn from(result: PageResult<T>) -> Self {
        match result {
            Ok(page) => ViewState::Ready(page),
            Err(err) => ViewState::Failed(err),
        }
    }
}

struct ViewInner<F, T> {
    filters: F,
    state: ViewState<T>,
    generation: u64,
}

/// Filters, pagination cursor and load state for one list page
pub struct ListView<R: PagedResource> {
    cache: Arc<QueryCache<R>>,
    inner: Mutex<ViewInner<R::Filters, R::Entity>>,
}

impl<R: PagedResource> ListView<R> {
    pub fn new(cache: Arc<QueryCache<R>>, filters: R::Filters) -> Self {
        Self {
            cache,
            inner: Mutex::new(ViewInner {
                filters: filters.canonical(),
                state: ViewState::Idle,
                generation: 0,
            }),
        }
    }

    pub fn state(&self) -> ViewState<R::Entity> {
        self.lock().state.clone()
    }

    pub fn filters(&self) -> R::Filters {
        self.lock().filters.clone()
    }

    /// Load the current filters, served from cache while fresh.
    ///
    /// The filters are captured when this is called, not when the returned
    /// future is first polled.
    pub fn refresh(&self) -> impl Future<Output = ViewState<R::Entity>> + '_ {
        let (generation, filters) = self.begin_load();
        self.complete_load(generation, filters, false)
    }

    /// Reload the current filters, bypassing cache freshness
    pub fn retry(&self) -> impl Future<Output = ViewState<R::Entity>> + '_ {
        let (generation, filters) = self.begin_load();
        self.complete_load(generation, filters, true)
    }

    fn begin_load(&self) -> (u64, R::Filters) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = ViewState::Loading;
        (inner.generation, inner.filters.clone())
    }

    async fn complete_load(
        &self,
        generation: u64,
        mut filters: R::Filters,
        force: bool,
    ) -> ViewState<R::Entity> {
        loop {
            let result = if force {
                self.cache.refetch(&filters).await
            } else {
                self.cache.fetch(&filters).await
            };

            filters = {
                let mut inner = self.lock();
                if inner.generation != generation {
                    tracing::trace!(
                        resource = %self.cache.resource(),
                        generation,
                        current = inner.generation,
                        "Dropping superseded view load"
                    );
                    return inner.state.clone();
                }

                // The selected page no longer exists, e.g. after deleting the
                // last row of the last page: fall back to the new last page
                let requested = filters.page_query().page;
                let clamp = match &result {
                    Ok(page) if page.is_past_end() => {
                        Some(page.total_pages.saturating_sub(1)).filter(|last| *last < requested)
                    }
                    _ => None,
                };
                let Some(last) = clamp else {
                    inner.state = ViewState::from(result);
                    return inner.state.clone();
                };

                tracing::debug!(
                    resource = %self.cache.resource(),
                    requested,
                    last,
                    "Selected page is past the end, reloading last page"
                );
                inner.filters.page_query_mut().page = last;
                inner.filters.clone()
            };
        }
    }

    /// Change filters. Pagination goes back to the first page.
    pub fn update_filters(&self, change: impl FnOnce(&mut R::Filters)) {
        self.set_filters(|filters| {
            change(filters);
            filters.page_query_mut().page = 0;
        });
    }

    /// Apply a search term; blank input clears the search
    pub fn submit_search(&self, term: &str) {
        let search = normalize_search(term);
        self.update_filters(|filters| filters.page_query_mut().search = search);
    }

    pub fn clear_search(&self) {
        self.update_filters(|filters| filters.page_query_mut().search = None);
    }

    /// Whether the last loaded page of the current filters has a successor
    pub fn can_go_next(&self) -> bool {
        self.current_page().is_some_and(|page| !page.last)
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page().is_some_and(|page| !page.first)
    }

    /// Move to the next page; returns false when already on the last one
    pub fn next_page(&self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.set_filters(|filters| filters.page_query_mut().page += 1);
        true
    }

    pub fn previous_page(&self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.set_filters(|filters| filters.page_query_mut().page -= 1);
        true
    }

    pub fn go_to_page(&self, page: u32) {
        self.set_filters(|filters| filters.page_query_mut().page = page);
    }

    /// "Showing 10 of 25 books for "dune"", once a page is loaded
    pub fn summary(&self) -> Option<String> {
        let inner = self.lock();
        let page = inner.state.page()?;
        let mut line = format!(
            "Showing {} of {} {}",
            page.number_of_elements,
            page.total_elements,
            <R::Filters as ListQuery>::RESOURCE.label()
        );
        if let Some(search) = &inner.filters.page_query().search {
            line.push_str(&format!(" for \"{}\"", search));
        }
        Some(line)
    }

    /// Loaded page, if it was loaded for the page index currently selected
    fn current_page(&self) -> Option<Arc<Page<R::Entity>>> {
        let inner = self.lock();
        let page = inner.state.page()?;
        (page.number == inner.filters.page_query().page).then(|| page.clone())
    }

    fn set_filters(&self, change: impl FnOnce(&mut R::Filters)) {
        let mut inner = self.lock();
        change(&mut inner.filters);
        inner.filters.page_query_mut().canonicalize();
        // Loads started for the previous filters must not land, and the
        // page loaded for them no longer describes the view
        inner.generation += 1;
        inner.state = ViewState::Loading;
    }

    fn lock(&self) -> MutexGuard<'_, ViewInner<R::Filters, R::Entity>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Home page counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overview {
    pub total_books: u64,
    pub total_members: u64,
    pub total_authors: u64,
    pub current_borrows: u64,
    pub overdue_borrows: u64,
}

impl fmt::Display for Overview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Books:           {}", self.total_books)?;
        writeln!(f, "Members:         {}", self.total_members)?;
        writeln!(f, "Authors:         {}", self.total_authors)?;
        writeln!(f, "Current borrows: {}", self.current_borrows)?;
        write!(f, "Overdue:         {}", self.overdue_borrows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::FakeAuthors;
    use crate::models::{AuthorFilters, PageQuery};
    use std::time::Duration;

    fn view(api: FakeAuthors) -> ListView<FakeAuthors> {
        let cache = Arc::new(QueryCache::new(api, Duration::from_secs(30)));
        ListView::new(cache, AuthorFilters::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_moves_to_ready() {
        let api = FakeAuthors::new(Duration::from_millis(10));
        let view = view(api.clone());
        assert!(matches!(view.state(), ViewState::Idle));

        let state = view.refresh().await;
        let page = state.page().unwrap();
        assert_eq!(page.total_elements, 25);
        assert!(matches!(view.state(), ViewState::Ready(_)));
        assert_eq!(
            view.summary().as_deref(),
            Some("Showing 1 of 25 authors")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_search_clears_filter() {
        let view = view(FakeAuthors::new(Duration::from_millis(10)));

        view.submit_search("  tolkien  ");
        assert_eq!(view.filters().query.search.as_deref(), Some("tolkien"));

        view.submit_search("   ");
        assert_eq!(view.filters().query.search, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_resets_page() {
        let view = view(FakeAuthors::new(Duration::from_millis(10)));
        view.go_to_page(2);
        assert_eq!(view.filters().query.page, 2);

        view.submit_search("le guin");
        assert_eq!(view.filters().query.page, 0);

        view.go_to_page(1);
        view.update_filters(|filters| filters.query.size = 20);
        assert_eq!(view.filters().query.page, 0);
        assert_eq!(view.filters().query.size, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_respects_bounds() {
        let view = view(FakeAuthors::new(Duration::from_millis(10)));
        assert!(!view.can_go_next());

        view.refresh().await;
        assert!(!view.can_go_previous());
        assert!(!view.previous_page());
        assert!(view.next_page());
        assert_eq!(view.filters().query.page, 1);
        // No second step until the new page is loaded
        assert!(!view.next_page());

        view.refresh().await;
        assert!(view.can_go_previous());
        view.go_to_page(2);
        view.refresh().await;
        assert!(!view.can_go_next());
        assert!(!view.next_page());
        assert_eq!(view.filters().query.page, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_then_retry() {
        let api = FakeAuthors::new(Duration::from_millis(10));
        api.set_failing(true);
        let view = view(api.clone());

        let state = view.refresh().await;
        assert!(matches!(state.error(), Some(ApiError::Network(_))));

        // A plain refresh is served the cached failure
        view.refresh().await;
        assert_eq!(api.calls(), 1);

        api.set_failing(false);
        let state = view.retry().await;
        assert!(state.page().is_some());
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_load_does_not_overwrite() {
        let api = FakeAuthors::new(Duration::from_millis(10)).slow_first(Duration::from_millis(500));
        let view = view(api.clone());

        view.update_filters(|filters| filters.query = PageQuery::new(0, 10).with_search("a"));
        let slow = view.refresh();
        view.submit_search("b");
        let fast = view.refresh();

        let (slow_state, fast_state) = tokio::join!(slow, fast);
        assert_eq!(fast_state.page().unwrap().content[0].id, 2);
        // The superseded load reports the current state instead of its own
        assert_eq!(slow_state.page().unwrap().content[0].id, 2);

        let current = view.state();
        assert_eq!(current.page().unwrap().content[0].id, 2);
        assert_eq!(view.filters().query.search.as_deref(), Some("b"));
        assert_eq!(
            view.summary().as_deref(),
            Some("Showing 1 of 25 authors for \"b\"")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_enters_loading() {
        let view = view(FakeAuthors::new(Duration::from_millis(10)));
        view.refresh().await;
        assert!(view.can_go_next());
        assert!(view.summary().is_some());

        view.submit_search("dune");
        assert!(view.state().is_loading());
        assert_eq!(view.summary(), None);
        assert!(!view.can_go_next());
        assert!(!view.can_go_previous());

        let state = view.refresh().await;
        assert!(state.page().is_some());
        assert_eq!(
            view.summary().as_deref(),
            Some("Showing 1 of 25 authors for \"dune\"")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleting_last_row_of_last_page_falls_back() {
        let api = FakeAuthors::new(Duration::from_millis(10));
        api.set_total(21);
        let cache = Arc::new(QueryCache::new(api.clone(), Duration::from_secs(30)));
        let view = ListView::new(cache.clone(), AuthorFilters::default());

        view.go_to_page(2);
        let state = view.refresh().await;
        assert_eq!(state.page().unwrap().number, 2);

        // The only row on page 2 is deleted elsewhere
        api.set_total(20);
        cache.invalidate();

        let state = view.refresh().await;
        let page = state.page().expect("view should land on the new last page");
        assert_eq!(page.number, 1);
        assert_eq!(page.content.len(), 1);
        assert_eq!(view.filters().query.page, 1);
        assert!(view.can_go_previous());
        assert!(!view.can_go_next());
        assert_eq!(api.calls(), 3);
    }

    #[test]
    fn test_overview_display() {
        let overview = Overview {
            total_books: 25,
            overdue_borrows: 3,
            ..Default::default()
        };
        let text = overview.to_string();
        assert!(text.contains("Books:           25"));
        assert!(text.ends_with("Overdue:         3"));
    }
}
