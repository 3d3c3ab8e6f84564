//! Demo book API served behind the admission pipeline.
//!
//! ```text
//! GET    {prefix}/books
//! POST   {prefix}/books
//! GET    {prefix}/books/{id}
//! DELETE {prefix}/books/{id}
//! GET    {prefix}/books/search
//! GET    {prefix}/books/search_default_limit
//! GET    {prefix}/large-data
//! GET    {prefix}/large-data-no-compress
//! ```

pub mod handlers;
pub mod search;
pub mod store;

pub use store::{Book, BookStore, InMemoryBookStore, NewBook};

use crate::http::server::AppState;
use crate::routing::RouteTable;

/// Register every book endpoint under `prefix`.
pub fn register(table: RouteTable<AppState>, prefix: &str) -> RouteTable<AppState> {
    let prefix = prefix.trim_end_matches('/');
    table
        .get(&format!("{prefix}/books"), handlers::list_books)
        .post(&format!("{prefix}/books"), handlers::create_book)
        .get(&format!("{prefix}/books/{{id}}"), handlers::get_book)
        .delete(&format!("{prefix}/books/{{id}}"), handlers::delete_book)
        .get(&format!("{prefix}/books/search"), search::search_books)
        .get(
            &format!("{prefix}/books/search_default_limit"),
            search::search_books_default_limit,
        )
        .get(&format!("{prefix}/large-data"), search::large_data)
        .get(
            &format!("{prefix}/large-data-no-compress"),
            search::large_data_no_compress,
        )
}
