//! In-memory book storage.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
}

/// Body of `POST /books`. Both fields are required strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

pub trait BookStore: Send + Sync {
    fn list(&self) -> Vec<Book>;

    fn get(&self, id: u64) -> Option<Book>;

    /// Insert with id = current max id + 1 (1 when empty).
    fn create(&self, book: NewBook) -> Book;

    /// Remove the book if present; returns whether anything was removed.
    fn delete(&self, id: u64) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<BTreeMap<u64, Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the two demo books.
    pub fn seeded() -> Self {
        let store = Self::new();
        store.create(NewBook {
            title: "1984".into(),
            author: "George Orwell".into(),
        });
        store.create(NewBook {
            title: "The Great Gatsby".into(),
            author: "F. Scott Fitzgerald".into(),
        });
        store
    }
}

impl BookStore for InMemoryBookStore {
    fn list(&self) -> Vec<Book> {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        books.values().cloned().collect()
    }

    fn get(&self, id: u64) -> Option<Book> {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        books.get(&id).cloned()
    }

    fn create(&self, book: NewBook) -> Book {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let id = books.keys().next_back().map_or(1, |max| max + 1);
        let book = Book {
            id,
            title: book.title,
            author: book.author,
        };
        books.insert(id, book.clone());
        book
    }

    fn delete(&self, id: u64) -> bool {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        books.remove(&id).is_some()
    }
}
