//! Repository interfaces for authors and books, with PostgreSQL and in-memory backends.
//!
//! Handlers and services only see these traits. Both backends enforce the same storage
//! constraints (active-isbn uniqueness, book → author reference) so a constraint hit
//! surfaces as the same `AppError::Validation` either way.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::error::{AppError, ValidationErrors};
use crate::model::{Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook};
use crate::sql::Scope;
use async_trait::async_trait;

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn list_authors(&self) -> Result<Vec<Author>, AppError>;

    async fn find_author(&self, id: i64) -> Result<Option<Author>, AppError>;

    async fn author_exists(&self, id: i64) -> Result<bool, AppError>;

    async fn create_author(&self, input: &NewAuthor) -> Result<Author, AppError>;

    /// Apply the supplied fields. `None` when no author has this id.
    async fn update_author(&self, id: i64, changes: &AuthorChanges) -> Result<Option<Author>, AppError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete_author(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All active books.
    async fn list_books(&self) -> Result<Vec<Book>, AppError>;

    async fn find_book(&self, id: i64, scope: Scope) -> Result<Option<Book>, AppError>;

    async fn create_book(&self, input: &NewBook) -> Result<Book, AppError>;

    /// Apply the supplied fields to an active book. `None` when absent or soft-deleted.
    async fn update_book(&self, id: i64, changes: &BookChanges) -> Result<Option<Book>, AppError>;

    /// Set `deleted_at` on an active book. Returns whether a row was marked.
    async fn soft_delete_book(&self, id: i64) -> Result<bool, AppError>;

    /// Active books whose title contains `needle`, case-insensitively.
    async fn find_books_by_title_substring(&self, needle: &str) -> Result<Vec<Book>, AppError>;

    /// Whether an active book other than `except_id` already uses `isbn`.
    async fn isbn_taken(&self, isbn: &str, except_id: Option<i64>) -> Result<bool, AppError>;

    async fn count_active_books_by_author(&self, author_id: i64) -> Result<i64, AppError>;
}

#[async_trait]
pub trait Store: AuthorRepository + BookRepository {
    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}

pub(crate) fn isbn_taken_error() -> AppError {
    AppError::Validation(ValidationErrors::single("isbn", "The isbn has already been taken."))
}

pub(crate) fn unknown_author_error() -> AppError {
    AppError::Validation(ValidationErrors::single("author_id", "The selected author id is invalid."))
}
