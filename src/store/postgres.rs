//! PostgreSQL repositories over a shared `PgPool`.

use super::{isbn_taken_error, unknown_author_error, AuthorRepository, BookRepository, Store};
use crate::error::{AppError, ConfigError, ValidationErrors};
use crate::migration::{AUTHOR_FOREIGN_KEY, ISBN_UNIQUE_INDEX};
use crate::model::{Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook};
use crate::sql::{self, BindValue, QueryBuf, Scope, AUTHORS, BOOKS};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow, Postgres};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_all<T>(&self, q: QueryBuf) -> Result<Vec<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<Postgres, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query.fetch_all(&self.pool).await.map_err(map_db_error)
    }

    async fn fetch_optional<T>(&self, q: QueryBuf) -> Result<Option<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<Postgres, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query.fetch_optional(&self.pool).await.map_err(map_db_error)
    }

    async fn fetch_one<T>(&self, q: QueryBuf) -> Result<T, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        self.fetch_optional(q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn fetch_scalar<T>(&self, q: QueryBuf) -> Result<T, AppError>
    where
        T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + Send + Unpin,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<Postgres, T>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query.fetch_one(&self.pool).await.map_err(map_db_error)
    }

    async fn execute(&self, q: QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let result = query.execute(&self.pool).await.map_err(map_db_error)?;
        Ok(result.rows_affected())
    }
}

fn author_fields(changes: &AuthorChanges) -> Vec<(&'static str, BindValue)> {
    let mut fields = Vec::new();
    if let Some(name) = &changes.name {
        fields.push(("name", BindValue::from(name.as_str())));
    }
    if let Some(email) = &changes.email {
        fields.push(("email", BindValue::from(email.as_str())));
    }
    fields
}

fn book_fields(changes: &BookChanges) -> Vec<(&'static str, BindValue)> {
    let mut fields = Vec::new();
    if let Some(title) = &changes.title {
        fields.push(("title", BindValue::from(title.as_str())));
    }
    if let Some(isbn) = &changes.isbn {
        fields.push(("isbn", BindValue::from(isbn.as_str())));
    }
    if let Some(date) = changes.published_date {
        fields.push(("published_date", BindValue::from(date)));
    }
    if let Some(author_id) = changes.author_id {
        fields.push(("author_id", BindValue::from(author_id)));
    }
    fields
}

/// Translate constraint violations into the validation errors the service layer would have produced.
/// The unique index and foreign key are the authoritative guards when two writers race past the checks.
pub(crate) fn map_db_error(e: sqlx::Error) -> AppError {
    let mapped = e.as_database_error().and_then(|db| {
        let code = db.code();
        match (code.as_deref(), db.constraint()) {
            (Some(UNIQUE_VIOLATION), Some(ISBN_UNIQUE_INDEX)) => Some(isbn_taken_error()),
            (Some(FOREIGN_KEY_VIOLATION), Some(AUTHOR_FOREIGN_KEY)) => Some(unknown_author_error()),
            (Some(STRING_DATA_RIGHT_TRUNCATION), _) => Some(AppError::Validation(ValidationErrors::single(
                "body",
                "A value exceeds the maximum length of its column.",
            ))),
            _ => None,
        }
    });
    match mapped {
        Some(err) => {
            tracing::warn!(error = %e, "write rejected by store constraint");
            err
        }
        None => AppError::Db(e),
    }
}

#[async_trait]
impl AuthorRepository for PgStore {
    async fn list_authors(&self) -> Result<Vec<Author>, AppError> {
        self.fetch_all(sql::select_list(&AUTHORS, Scope::WithDeleted)).await
    }

    async fn find_author(&self, id: i64) -> Result<Option<Author>, AppError> {
        self.fetch_optional(sql::select_by_id(&AUTHORS, id, Scope::WithDeleted)).await
    }

    async fn author_exists(&self, id: i64) -> Result<bool, AppError> {
        let q = sql::exists_where(&AUTHORS, "id", BindValue::I64(id), None, Scope::WithDeleted);
        self.fetch_scalar(q).await
    }

    async fn create_author(&self, input: &NewAuthor) -> Result<Author, AppError> {
        let q = sql::insert(
            &AUTHORS,
            vec![
                ("name", BindValue::from(input.name.as_str())),
                ("email", BindValue::from(input.email.as_str())),
            ],
        );
        self.fetch_one(q).await
    }

    async fn update_author(&self, id: i64, changes: &AuthorChanges) -> Result<Option<Author>, AppError> {
        let q = sql::update(&AUTHORS, id, author_fields(changes), Scope::WithDeleted);
        self.fetch_optional(q).await
    }

    async fn delete_author(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.execute(sql::delete(&AUTHORS, id)).await? > 0)
    }
}

#[async_trait]
impl BookRepository for PgStore {
    async fn list_books(&self) -> Result<Vec<Book>, AppError> {
        self.fetch_all(sql::select_list(&BOOKS, Scope::Active)).await
    }

    async fn find_book(&self, id: i64, scope: Scope) -> Result<Option<Book>, AppError> {
        self.fetch_optional(sql::select_by_id(&BOOKS, id, scope)).await
    }

    async fn create_book(&self, input: &NewBook) -> Result<Book, AppError> {
        let q = sql::insert(
            &BOOKS,
            vec![
                ("title", BindValue::from(input.title.as_str())),
                ("isbn", BindValue::from(input.isbn.as_str())),
                ("published_date", BindValue::from(input.published_date)),
                ("author_id", BindValue::from(input.author_id)),
            ],
        );
        self.fetch_one(q).await
    }

    async fn update_book(&self, id: i64, changes: &BookChanges) -> Result<Option<Book>, AppError> {
        let q = sql::update(&BOOKS, id, book_fields(changes), Scope::Active);
        self.fetch_optional(q).await
    }

    async fn soft_delete_book(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.execute(sql::soft_delete(&BOOKS, id)).await? > 0)
    }

    async fn find_books_by_title_substring(&self, needle: &str) -> Result<Vec<Book>, AppError> {
        self.fetch_all(sql::select_where_contains(&BOOKS, "title", needle, Scope::Active))
            .await
    }

    async fn isbn_taken(&self, isbn: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        let q = sql::exists_where(&BOOKS, "isbn", BindValue::from(isbn), except_id, Scope::Active);
        self.fetch_scalar(q).await
    }

    async fn count_active_books_by_author(&self, author_id: i64) -> Result<i64, AppError> {
        let q = sql::count_where(&BOOKS, "author_id", BindValue::I64(author_id), Scope::Active);
        self.fetch_scalar(q).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Connect to the server's `postgres` database and create the target database when it is missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::DatabaseUrl(e.to_string()))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| ConfigError::DatabaseUrl("no database path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
