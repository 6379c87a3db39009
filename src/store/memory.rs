//! In-process store with the same constraints as the PostgreSQL schema. Backs the test suite and
//! `DATABASE_URL=memory` runs.

use super::{isbn_taken_error, unknown_author_error, AuthorRepository, BookRepository, Store};
use crate::error::AppError;
use crate::model::{Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook};
use crate::sql::Scope;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i64, Author>,
    books: BTreeMap<i64, Book>,
    last_author_id: i64,
    last_book_id: i64,
}

impl Tables {
    fn isbn_in_use(&self, isbn: &str, except_id: Option<i64>) -> bool {
        self.books
            .values()
            .any(|b| !b.is_deleted() && b.isbn == isbn && Some(b.id) != except_id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("store lock poisoned".into()))
    }
}

fn visible(book: &Book, scope: Scope) -> bool {
    scope == Scope::WithDeleted || !book.is_deleted()
}

#[async_trait]
impl AuthorRepository for MemoryStore {
    async fn list_authors(&self) -> Result<Vec<Author>, AppError> {
        Ok(self.lock()?.authors.values().cloned().collect())
    }

    async fn find_author(&self, id: i64) -> Result<Option<Author>, AppError> {
        Ok(self.lock()?.authors.get(&id).cloned())
    }

    async fn author_exists(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.authors.contains_key(&id))
    }

    async fn create_author(&self, input: &NewAuthor) -> Result<Author, AppError> {
        let mut tables = self.lock()?;
        tables.last_author_id += 1;
        let now = Utc::now();
        let author = Author {
            id: tables.last_author_id,
            name: input.name.clone(),
            email: input.email.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn update_author(&self, id: i64, changes: &AuthorChanges) -> Result<Option<Author>, AppError> {
        let mut tables = self.lock()?;
        let Some(author) = tables.authors.get_mut(&id) else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(author.clone()));
        }
        if let Some(name) = &changes.name {
            author.name = name.clone();
        }
        if let Some(email) = &changes.email {
            author.email = email.clone();
        }
        author.updated_at = Utc::now();
        Ok(Some(author.clone()))
    }

    async fn delete_author(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        if tables.authors.remove(&id).is_none() {
            return Ok(false);
        }
        // ON DELETE CASCADE
        tables.books.retain(|_, b| b.author_id != id);
        Ok(true)
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        Ok(self
            .lock()?
            .books
            .values()
            .filter(|b| !b.is_deleted())
            .cloned()
            .collect())
    }

    async fn find_book(&self, id: i64, scope: Scope) -> Result<Option<Book>, AppError> {
        Ok(self
            .lock()?
            .books
            .get(&id)
            .filter(|b| visible(b, scope))
            .cloned())
    }

    async fn create_book(&self, input: &NewBook) -> Result<Book, AppError> {
        let mut tables = self.lock()?;
        if !tables.authors.contains_key(&input.author_id) {
            return Err(unknown_author_error());
        }
        if tables.isbn_in_use(&input.isbn, None) {
            return Err(isbn_taken_error());
        }
        tables.last_book_id += 1;
        let now = Utc::now();
        let book = Book {
            id: tables.last_book_id,
            title: input.title.clone(),
            isbn: input.isbn.clone(),
            published_date: input.published_date,
            author_id: input.author_id,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: i64, changes: &BookChanges) -> Result<Option<Book>, AppError> {
        let mut tables = self.lock()?;
        match tables.books.get(&id) {
            Some(b) if !b.is_deleted() => {}
            _ => return Ok(None),
        }
        if let Some(author_id) = changes.author_id {
            if !tables.authors.contains_key(&author_id) {
                return Err(unknown_author_error());
            }
        }
        if let Some(isbn) = &changes.isbn {
            if tables.isbn_in_use(isbn, Some(id)) {
                return Err(isbn_taken_error());
            }
        }
        let Some(book) = tables.books.get_mut(&id) else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(book.clone()));
        }
        if let Some(title) = &changes.title {
            book.title = title.clone();
        }
        if let Some(isbn) = &changes.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(date) = changes.published_date {
            book.published_date = date;
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = author_id;
        }
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn soft_delete_book(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        match tables.books.get_mut(&id) {
            Some(book) if !book.is_deleted() => {
                let now = Utc::now();
                book.deleted_at = Some(now);
                book.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_books_by_title_substring(&self, needle: &str) -> Result<Vec<Book>, AppError> {
        let needle = needle.to_lowercase();
        Ok(self
            .lock()?
            .books
            .values()
            .filter(|b| !b.is_deleted() && b.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn isbn_taken(&self, isbn: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        Ok(self.lock()?.isbn_in_use(isbn, except_id))
    }

    async fn count_active_books_by_author(&self, author_id: i64) -> Result<i64, AppError> {
        let count = self
            .lock()?
            .books
            .values()
            .filter(|b| !b.is_deleted() && b.author_id == author_id)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dune(author_id: i64) -> NewBook {
        NewBook {
            title: "Dune".into(),
            isbn: "9780441013593".into(),
            published_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            author_id,
        }
    }

    async fn seeded() -> (MemoryStore, Author) {
        let store = MemoryStore::new();
        let author = store
            .create_author(&NewAuthor {
                name: "Frank Herbert".into(),
                email: "frank@example.com".into(),
            })
            .await
            .unwrap();
        (store, author)
    }

    #[tokio::test]
    async fn unique_isbn_is_enforced_among_active_books() {
        let (store, author) = seeded().await;
        let first = store.create_book(&dune(author.id)).await.unwrap();
        assert!(matches!(store.create_book(&dune(author.id)).await, Err(AppError::Validation(_))));

        assert!(store.soft_delete_book(first.id).await.unwrap());
        let second = store.create_book(&dune(author.id)).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn foreign_key_is_enforced() {
        let (store, _) = seeded().await;
        let err = store.create_book(&dune(999)).await.unwrap_err();
        match err {
            AppError::Validation(errors) => assert!(errors.has("author_id")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(store.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn soft_deleted_rows_stay_in_storage() {
        let (store, author) = seeded().await;
        let book = store.create_book(&dune(author.id)).await.unwrap();
        assert!(store.soft_delete_book(book.id).await.unwrap());
        assert!(!store.soft_delete_book(book.id).await.unwrap());

        assert!(store.find_book(book.id, Scope::Active).await.unwrap().is_none());
        let kept = store.find_book(book.id, Scope::WithDeleted).await.unwrap().unwrap();
        assert!(kept.is_deleted());
        assert!(store.update_book(book.id, &BookChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_an_author_purges_their_books() {
        let (store, author) = seeded().await;
        let book = store.create_book(&dune(author.id)).await.unwrap();
        store.soft_delete_book(book.id).await.unwrap();
        assert!(store.delete_author(author.id).await.unwrap());
        assert!(store.find_book(book.id, Scope::WithDeleted).await.unwrap().is_none());
        assert!(!store.delete_author(author.id).await.unwrap());
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive() {
        let (store, author) = seeded().await;
        store.create_book(&dune(author.id)).await.unwrap();
        assert_eq!(store.find_books_by_title_substring("dUN").await.unwrap().len(), 1);
        assert!(store.find_books_by_title_substring("Messiah").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn poisoned_lock_is_an_internal_error() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.tables.lock().unwrap();
            panic!("writer died while holding the lock");
        })
        .join();
        assert!(matches!(store.list_authors().await, Err(AppError::Internal(_))));
    }
}
