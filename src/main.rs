//! Library Dashboard - command-line front end
//!
//! Lists the library collections and the home page overview from the
//! library management REST API.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_dashboard::{
    config::AppConfig,
    models::{
        Author, Book, BookFilters, BorrowStatus, BorrowedBook, BorrowedBookFilters, ListQuery,
        Member, MemberFilters, MemberStatus, PageQuery, SortDirection,
    },
    resources::PagedResource,
    views::{ListView, ViewState},
    Dashboard,
};

#[derive(Parser)]
#[command(
    name = "library-dashboard",
    about = "Browse the library catalog, members and loans",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print raw JSON instead of a listing
    #[arg(long, global = true)]
    json: bool,

    /// Backend base URL, overrides configuration
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List authors
    Authors {
        #[command(flatten)]
        list: ListArgs,
    },

    /// List books
    Books {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        author_id: Option<i64>,
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long)]
        end_year: Option<i32>,
        /// Only books with at least one copy on the shelf
        #[arg(long)]
        available: bool,
    },

    /// List members
    Members {
        #[command(flatten)]
        list: ListArgs,
        /// ACTIVE, SUSPENDED or EXPIRED
        #[arg(long)]
        status: Option<MemberStatus>,
    },

    /// List borrow records
    BorrowedBooks {
        #[command(flatten)]
        list: ListArgs,
        /// BORROWED, RETURNED, OVERDUE or LOST
        #[arg(long)]
        status: Option<BorrowStatus>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
    },

    /// Collection totals and borrow statistics
    Overview,
}

#[derive(Args)]
struct ListArgs {
    /// Zero-based page index
    #[arg(long, default_value = "0")]
    page: u32,
    #[arg(long, default_value = "10")]
    size: u32,
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long)]
    sort_dir: Option<SortDirection>,
    #[arg(long)]
    search: Option<String>,
}

impl ListArgs {
    fn page_query(&self) -> PageQuery {
        let mut query = PageQuery::new(self.page, self.size);
        query.sort_by = self.sort_by.clone();
        query.sort_dir = self.sort_dir;
        query
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_tracing(&config);

    tracing::debug!(
        "Starting library-dashboard v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api.base_url
    );

    let dashboard = Dashboard::new(config)?;

    match cli.command {
        Commands::Authors { list } => {
            let view = dashboard.authors_view();
            let search = list.search.clone();
            view.update_filters(|f| f.query = list.page_query());
            show(&view, search.as_deref(), list.page, cli.json, author_row).await
        }
        Commands::Books {
            list,
            category,
            author_id,
            start_year,
            end_year,
            available,
        } => {
            let view = dashboard.books_view();
            let search = list.search.clone();
            view.update_filters(|f| {
                *f = BookFilters {
                    query: list.page_query(),
                    category,
                    author_id,
                    start_year,
                    end_year,
                    available: available.then_some(true),
                }
            });
            show(&view, search.as_deref(), list.page, cli.json, book_row).await
        }
        Commands::Members { list, status } => {
            let view = dashboard.members_view();
            let search = list.search.clone();
            view.update_filters(|f| {
                *f = MemberFilters {
                    query: list.page_query(),
                    status,
                }
            });
            show(&view, search.as_deref(), list.page, cli.json, member_row).await
        }
        Commands::BorrowedBooks {
            list,
            status,
            start_date,
            end_date,
        } => {
            let view = dashboard.borrowed_books_view();
            let search = list.search.clone();
            view.update_filters(|f| {
                *f = BorrowedBookFilters {
                    query: list.page_query(),
                    status,
                    start_date,
                    end_date,
                    ..Default::default()
                }
            });
            show(&view, search.as_deref(), list.page, cli.json, record_row).await
        }
        Commands::Overview => {
            let overview = dashboard.overview().await.map_err(|e| {
                tracing::warn!(error = %e, "Overview failed");
                anyhow::anyhow!(e.user_message())
            })?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "totalBooks": overview.total_books,
                        "totalMembers": overview.total_members,
                        "totalAuthors": overview.total_authors,
                        "currentBorrows": overview.current_borrows,
                        "overdueBorrows": overview.overdue_borrows,
                    })
                );
            } else {
                println!("{}", overview);
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_dashboard={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Load one page through the view and print it
async fn show<R>(
    view: &ListView<R>,
    search: Option<&str>,
    page: u32,
    json: bool,
    row: fn(&R::Entity) -> String,
) -> Result<()>
where
    R: PagedResource,
    R::Entity: Serialize,
{
    if let Some(term) = search {
        view.submit_search(term);
    }
    if page > 0 {
        view.go_to_page(page);
    }
    let filters = view.filters();
    tracing::debug!(query = ?filters.page_query(), "Loading list");

    let page = match view.refresh().await {
        ViewState::Ready(page) => page,
        ViewState::Failed(e) => bail!(e.user_message()),
        ViewState::Idle | ViewState::Loading => bail!("List did not finish loading"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(page.as_ref())?);
        return Ok(());
    }

    for entity in &page.content {
        println!("{}", row(entity));
    }
    if let Some(summary) = view.summary() {
        println!();
        println!("{} (page {} of {})", summary, page.number + 1, page.total_pages.max(1));
    }
    Ok(())
}

fn author_row(author: &Author) -> String {
    match &author.nationality {
        Some(nationality) => format!("{:>5}  {} ({})", author.id, author.name, nationality),
        None => format!("{:>5}  {}", author.id, author.name),
    }
}

fn book_row(book: &Book) -> String {
    format!(
        "{:>5}  {}  by {}  [{}] {}/{}",
        book.id,
        book.title,
        book.author.name,
        book.availability(),
        book.available_copies,
        book.total_copies
    )
}

fn member_row(member: &Member) -> String {
    format!(
        "{:>5}  {} <{}>  {}",
        member.id, member.name, member.email, member.status
    )
}

fn record_row(record: &BorrowedBook) -> String {
    let due = record
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>5}  {} -> {}  {}  due {}",
        record.id, record.book.title, record.member.name, record.status, due
    )
}
