//! End-to-end dashboard scenarios: HTTP transport, query caches and views

use library_dashboard::{
    config::AppConfig,
    models::{BorrowRequest, MemberStatus, PageQuery, SortDirection},
    views::ViewState,
    ApiError, Dashboard,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};

const TOTAL_BOOKS: u64 = 25;

fn dashboard_for(server: &ServerGuard) -> Dashboard {
    let mut config = AppConfig::default();
    config.api.base_url = format!("{}/api", server.url());
    config.api.timeout_ms = 2_000;
    Dashboard::new(config).expect("Failed to build dashboard")
}

fn book(id: u64) -> Value {
    json!({
        "id": id,
        "title": format!("Title {:02}", id),
        "isbn": format!("978-0-00-0000{:02}-0", id),
        "author": { "id": 1, "name": "Frank Herbert" },
        "category": "Science Fiction",
        "publicationYear": 1965,
        "totalCopies": 3,
        "availableCopies": id % 4,
        "createdAt": "2024-01-05T10:15:30"
    })
}

/// One page of the 25-book catalog, sorted by title
fn books_page(number: u64, size: u64) -> Value {
    let start = number * size;
    let end = (start + size).min(TOTAL_BOOKS);
    let content: Vec<Value> = (start..end).map(|i| book(i + 1)).collect();
    let total_pages = TOTAL_BOOKS.div_ceil(size);
    json!({
        "content": content,
        "totalElements": TOTAL_BOOKS,
        "totalPages": total_pages,
        "size": size,
        "number": number,
        "first": number == 0,
        "last": number + 1 >= total_pages,
        "numberOfElements": end - start
    })
}

fn single_page(content: Vec<Value>, total: u64) -> Value {
    let size = content.len().max(1) as u64;
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": total.div_ceil(size),
        "size": size,
        "number": 0,
        "first": true,
        "last": total <= size,
        "numberOfElements": content.len()
    })
}

fn member(id: u64, status: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Member {}", id),
        "email": format!("member{}@example.org", id),
        "membershipDate": "2023-09-01T09:00:00",
        "status": status
    })
}

fn borrow_record(id: u64) -> Value {
    json!({
        "id": id,
        "book": book(2),
        "member": member(1, "ACTIVE"),
        "borrowDate": "2024-03-01",
        "dueDate": "2024-03-15",
        "status": "BORROWED"
    })
}

#[tokio::test]
async fn test_books_first_page_sorted_by_title() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/books")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "0".into()),
            Matcher::UrlEncoded("size".into(), "10".into()),
            Matcher::UrlEncoded("sortBy".into(), "title".into()),
            Matcher::UrlEncoded("sortDir".into(), "asc".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(books_page(0, 10).to_string())
        .expect(1)
        .create_async()
        .await;

    let dashboard = dashboard_for(&server);
    let view = dashboard.books_view();
    view.update_filters(|f| f.query = PageQuery::new(0, 10).sorted_by("title", SortDirection::Asc));

    let state = view.refresh().await;
    let page = state.page().expect("page should be loaded");
    assert_eq!(page.total_elements, 25);
    assert_eq!(page.total_pages, 3);
    assert!(page.first);
    assert!(!page.last);
    assert_eq!(page.content.len(), 10);
    assert_eq!(page.content[0].title, "Title 01");
    assert_eq!(page.content[0].publication_year, Some(1965));

    assert!(view.can_go_next());
    assert!(!view.can_go_previous());
    assert_eq!(view.summary().as_deref(), Some("Showing 10 of 25 books"));

    // Second load of the same filters is served from the cache
    view.refresh().await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_paging_through_catalog() {
    let mut server = Server::new_async().await;
    let mut mocks = Vec::new();
    for number in 0..3u64 {
        mocks.push(
            server
                .mock("GET", "/api/books")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("page".into(), number.to_string()),
                    Matcher::UrlEncoded("size".into(), "10".into()),
                ]))
                .with_status(200)
                .with_body(books_page(number, 10).to_string())
                .create_async()
                .await,
        );
    }

    let dashboard = dashboard_for(&server);
    let view = dashboard.books_view();
    view.refresh().await;

    assert!(view.next_page());
    view.refresh().await;
    assert!(view.next_page());
    let state = view.refresh().await;

    let page = state.page().expect("last page should be loaded");
    assert!(page.last);
    assert_eq!(page.content.len(), 5);
    assert_eq!(page.content[4].id, 25);
    assert!(!view.can_go_next());
    assert!(!view.next_page());

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_borrow_invalidates_books_and_records() {
    let mut server = Server::new_async().await;
    let books = server
        .mock("GET", "/api/books")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(books_page(0, 10).to_string())
        .expect(2)
        .create_async()
        .await;
    let records = server
        .mock("GET", "/api/borrowed-books")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(single_page(vec![borrow_record(1)], 1).to_string())
        .expect(2)
        .create_async()
        .await;
    let borrow = server
        .mock("POST", "/api/borrowed-books/borrow")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("memberId".into(), "1".into()),
            Matcher::UrlEncoded("bookId".into(), "2".into()),
        ]))
        .with_status(201)
        .with_body(borrow_record(2).to_string())
        .expect(1)
        .create_async()
        .await;

    let dashboard = dashboard_for(&server);
    let books_view = dashboard.books_view();
    let records_view = dashboard.borrowed_books_view();
    books_view.refresh().await;
    records_view.refresh().await;

    // Fresh entries: no network
    books_view.refresh().await;
    records_view.refresh().await;

    let record = dashboard
        .mutate(
            dashboard
                .resources
                .borrowed_books
                .borrow(&BorrowRequest::new(1, 2)),
        )
        .await
        .expect("borrow should succeed");
    assert_eq!(record.id, 2);

    books_view.refresh().await;
    records_view.refresh().await;

    books.assert_async().await;
    records.assert_async().await;
    borrow.assert_async().await;
}

#[tokio::test]
async fn test_backend_error_then_retry() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("GET", "/api/members")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Database unavailable"}"#)
        .expect(1)
        .create_async()
        .await;

    let dashboard = dashboard_for(&server);
    let view = dashboard.members_view();

    let state = view.refresh().await;
    let err = state.error().expect("load should fail");
    assert_eq!(
        err,
        &ApiError::Http {
            status: 500,
            message: "Database unavailable".to_string()
        }
    );
    assert!(err.user_message().contains("Database unavailable"));

    // The failure is cached; a plain refresh does not hit the backend again
    assert!(matches!(view.refresh().await, ViewState::Failed(_)));
    failing.assert_async().await;
    failing.remove_async().await;

    let recovered = server
        .mock("GET", "/api/members")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(single_page(vec![member(1, "ACTIVE"), member(2, "SUSPENDED")], 2).to_string())
        .expect(1)
        .create_async()
        .await;

    let state = view.retry().await;
    let page = state.page().expect("retry should load");
    assert_eq!(page.content[1].status, MemberStatus::Suspended);
    recovered.assert_async().await;
}

#[tokio::test]
async fn test_deleting_only_book_on_last_page() {
    let mut server = Server::new_async().await;
    let page_query = |number: &str| {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), number.into()),
            Matcher::UrlEncoded("size".into(), "10".into()),
        ])
    };
    let last_page = server
        .mock("GET", "/api/books")
        .match_query(page_query("2"))
        .with_status(200)
        .with_body(
            json!({
                "content": [book(21)],
                "totalElements": 21,
                "totalPages": 3,
                "size": 10,
                "number": 2,
                "first": false,
                "last": true,
                "numberOfElements": 1
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let dashboard = dashboard_for(&server);
    let view = dashboard.books_view();
    view.go_to_page(2);
    let state = view.refresh().await;
    assert_eq!(state.page().expect("page 2 should load").content[0].id, 21);
    last_page.assert_async().await;
    last_page.remove_async().await;

    let delete = server
        .mock("DELETE", "/api/books/21")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    dashboard
        .mutate(dashboard.resources.books.remove(21))
        .await
        .expect("delete should succeed");
    delete.assert_async().await;

    // What the backend answers for a page index past the end
    let past_end = server
        .mock("GET", "/api/books")
        .match_query(page_query("2"))
        .with_status(200)
        .with_body(
            json!({
                "content": [],
                "totalElements": 20,
                "totalPages": 2,
                "size": 10,
                "number": 2,
                "first": false,
                "last": true,
                "numberOfElements": 0,
                "empty": true
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let new_last = server
        .mock("GET", "/api/books")
        .match_query(page_query("1"))
        .with_status(200)
        .with_body(
            json!({
                "content": (11..=20).map(book).collect::<Vec<_>>(),
                "totalElements": 20,
                "totalPages": 2,
                "size": 10,
                "number": 1,
                "first": false,
                "last": true,
                "numberOfElements": 10
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let state = view.refresh().await;
    let page = state.page().expect("view should fall back to the last page");
    assert_eq!(page.number, 1);
    assert_eq!(page.content.len(), 10);
    assert_eq!(view.filters().query.page, 1);
    assert!(view.can_go_previous());
    assert!(!view.can_go_next());
    assert_eq!(view.summary().as_deref(), Some("Showing 10 of 20 books"));

    past_end.assert_async().await;
    new_last.assert_async().await;
}

#[tokio::test]
async fn test_invalid_filters_fail_locally() {
    let server = Server::new_async().await;
    let dashboard = dashboard_for(&server);

    let view = dashboard.borrowed_books_view();
    view.update_filters(|f| {
        f.start_date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1);
        f.end_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
    });

    let state = view.refresh().await;
    assert!(matches!(state.error(), Some(ApiError::Validation(_))));
    assert!(dashboard.queries.is_empty());
}

#[tokio::test]
async fn test_overview() {
    let mut server = Server::new_async().await;
    let size_one = Matcher::AllOf(vec![
        Matcher::UrlEncoded("page".into(), "0".into()),
        Matcher::UrlEncoded("size".into(), "1".into()),
    ]);
    let _books = server
        .mock("GET", "/api/books")
        .match_query(size_one.clone())
        .with_status(200)
        .with_body(single_page(vec![book(1)], 25).to_string())
        .create_async()
        .await;
    let _members = server
        .mock("GET", "/api/members")
        .match_query(size_one.clone())
        .with_status(200)
        .with_body(single_page(vec![member(1, "ACTIVE")], 12).to_string())
        .create_async()
        .await;
    let _authors = server
        .mock("GET", "/api/authors")
        .match_query(size_one)
        .with_status(200)
        .with_body(single_page(vec![json!({ "id": 1, "name": "Frank Herbert" })], 7).to_string())
        .create_async()
        .await;
    let _current = server
        .mock("GET", "/api/borrowed-books/statistics/current-borrows")
        .with_status(200)
        .with_body("9")
        .create_async()
        .await;
    let _overdue = server
        .mock("GET", "/api/borrowed-books/statistics/overdue-count")
        .with_status(200)
        .with_body("2")
        .create_async()
        .await;

    let dashboard = dashboard_for(&server);
    let overview = dashboard.overview().await.expect("overview should load");

    assert_eq!(overview.total_books, 25);
    assert_eq!(overview.total_members, 12);
    assert_eq!(overview.total_authors, 7);
    assert_eq!(overview.current_borrows, 9);
    assert_eq!(overview.overdue_borrows, 2);

    assert_eq!(dashboard.queries.len(), 3);
    dashboard.reset();
    assert!(dashboard.queries.is_empty());
}

#[tokio::test]
async fn test_unreachable_backend() {
    let mut config = AppConfig::default();
    config.api.base_url = "http://127.0.0.1:1/api".to_string();
    config.api.timeout_ms = 2_000;
    let dashboard = Dashboard::new(config).expect("Failed to build dashboard");

    let state = dashboard.authors_view().refresh().await;
    let err = state.error().expect("load should fail");
    assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout));
}
