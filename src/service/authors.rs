//! Author operations: list, create, read, partial update, restricted hard delete.

use super::validation::{into_input, RequestValidator, AUTHOR_RULES};
use crate::error::AppError;
use crate::model::{Author, AuthorChanges, NewAuthor};
use crate::store::Store;
use serde_json::Value;
use std::collections::HashMap;

pub struct AuthorService;

impl AuthorService {
    pub async fn list(store: &dyn Store) -> Result<Vec<Author>, AppError> {
        store.list_authors().await
    }

    pub async fn create(store: &dyn Store, body: HashMap<String, Value>) -> Result<Author, AppError> {
        RequestValidator::validate(&body, AUTHOR_RULES).into_result()?;
        let input: NewAuthor = into_input(body, AUTHOR_RULES)?;
        let author = store.create_author(&input).await?;
        tracing::info!(author_id = author.id, "author created");
        Ok(author)
    }

    pub async fn read(store: &dyn Store, id: i64) -> Result<Author, AppError> {
        store
            .find_author(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author {}", id)))
    }

    /// Validates the supplied fields before the lookup, so an invalid body wins over an unknown id.
    pub async fn update(store: &dyn Store, id: i64, body: HashMap<String, Value>) -> Result<Author, AppError> {
        RequestValidator::validate_partial(&body, AUTHOR_RULES).into_result()?;
        let changes: AuthorChanges = into_input(body, AUTHOR_RULES)?;
        let current = Self::read(store, id).await?;
        if changes.is_empty() {
            return Ok(current);
        }
        if let Some(email) = changes.email.as_deref().filter(|e| *e != current.email) {
            tracing::info!(author_id = id, "Email changed to: {}", email);
        }
        store
            .update_author(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("author {}", id)))
    }

    /// Refuses while the author still has active books; soft-deleted books go with the author.
    pub async fn delete(store: &dyn Store, id: i64) -> Result<(), AppError> {
        Self::read(store, id).await?;
        let active = store.count_active_books_by_author(id).await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "author {} still has {} active book(s)",
                id, active
            )));
        }
        if !store.delete_author(id).await? {
            return Err(AppError::NotFound(format!("author {}", id)));
        }
        tracing::info!(author_id = id, "author deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fields(v: Value) -> HashMap<String, Value> {
        match v {
            Value::Object(m) => m.into_iter().collect(),
            _ => panic!("object expected"),
        }
    }

    #[tokio::test]
    async fn email_change_is_logged_only_when_the_address_changes() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = MemoryStore::new();
        let author = AuthorService::create(
            &store,
            fields(json!({"name": "Frank Herbert", "email": "frank@example.com"})),
        )
        .await
        .unwrap();

        AuthorService::update(&store, author.id, fields(json!({"name": "F. Herbert"})))
            .await
            .unwrap();
        AuthorService::update(&store, author.id, fields(json!({"email": "frank@example.com"})))
            .await
            .unwrap();
        assert!(!logs.contents().contains("Email changed to"), "{}", logs.contents());

        AuthorService::update(&store, author.id, fields(json!({"email": "herbert@example.com"})))
            .await
            .unwrap();
        let out = logs.contents();
        assert_eq!(out.matches("Email changed to: herbert@example.com").count(), 1, "{out}");
    }
}
