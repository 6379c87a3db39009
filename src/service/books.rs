//! Book operations. Reads only ever see active books; delete is a soft delete.

use super::validation::{into_input, RequestValidator, BOOK_RULES, SEARCH_RULES};
use crate::error::{AppError, ValidationErrors};
use crate::model::{Book, BookChanges, NewBook};
use crate::sql::Scope;
use crate::store::Store;
use serde_json::Value;
use std::collections::HashMap;

pub struct BookService;

impl BookService {
    pub async fn list(store: &dyn Store) -> Result<Vec<Book>, AppError> {
        store.list_books().await
    }

    pub async fn create(store: &dyn Store, body: HashMap<String, Value>) -> Result<Book, AppError> {
        let mut errors = RequestValidator::validate(&body, BOOK_RULES);
        check_references(store, &body, None, &mut errors).await?;
        errors.into_result()?;
        let input: NewBook = into_input(body, BOOK_RULES)?;
        let book = store.create_book(&input).await?;
        tracing::info!(book_id = book.id, author_id = book.author_id, "book created");
        Ok(book)
    }

    pub async fn read(store: &dyn Store, id: i64) -> Result<Book, AppError> {
        store
            .find_book(id, Scope::Active)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))
    }

    /// Partial update; the isbn uniqueness check ignores this book's own row.
    pub async fn update(store: &dyn Store, id: i64, body: HashMap<String, Value>) -> Result<Book, AppError> {
        let mut errors = RequestValidator::validate_partial(&body, BOOK_RULES);
        check_references(store, &body, Some(id), &mut errors).await?;
        errors.into_result()?;
        let changes: BookChanges = into_input(body, BOOK_RULES)?;
        let current = Self::read(store, id).await?;
        if changes.is_empty() {
            return Ok(current);
        }
        store
            .update_book(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("book {}", id)))
    }

    pub async fn delete(store: &dyn Store, id: i64) -> Result<(), AppError> {
        if !store.soft_delete_book(id).await? {
            return Err(AppError::NotFound(format!("book {}", id)));
        }
        tracing::info!(book_id = id, "book soft-deleted");
        Ok(())
    }

    /// Substring match on title. An empty match is `EmptySearchResult`, never an empty list.
    pub async fn search(store: &dyn Store, query: HashMap<String, String>) -> Result<Vec<Book>, AppError> {
        let query: HashMap<String, Value> = query.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
        RequestValidator::validate(&query, SEARCH_RULES).into_result()?;
        let title = query.get("title").and_then(Value::as_str).unwrap_or_default();
        let books = store.find_books_by_title_substring(title).await?;
        if books.is_empty() {
            return Err(AppError::EmptySearchResult);
        }
        Ok(books)
    }
}

/// Store-backed rules: active isbn must be unused (except by `own_id`), author must exist.
/// Skipped for fields that already failed their static rules.
async fn check_references(
    store: &dyn Store,
    body: &HashMap<String, Value>,
    own_id: Option<i64>,
    errors: &mut ValidationErrors,
) -> Result<(), AppError> {
    if !errors.has("isbn") {
        if let Some(isbn) = body.get("isbn").and_then(Value::as_str) {
            if store.isbn_taken(isbn, own_id).await? {
                errors.add("isbn", "The isbn has already been taken.");
            }
        }
    }
    if !errors.has("author_id") {
        if let Some(author_id) = body.get("author_id").and_then(Value::as_i64) {
            if !store.author_exists(author_id).await? {
                errors.add("author_id", "The selected author id is invalid.");
            }
        }
    }
    Ok(())
}
