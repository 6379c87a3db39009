//! DDL for the `authors` and `books` tables. Every statement is idempotent, so this runs on each start.

use crate::error::AppError;
use sqlx::PgPool;

/// Partial unique index: isbn is unique among books that are not soft-deleted.
pub const ISBN_UNIQUE_INDEX: &str = "books_isbn_active_unique";
pub const AUTHOR_FOREIGN_KEY: &str = "books_author_id_foreign";

const CREATE_AUTHORS: &str = r#"CREATE TABLE IF NOT EXISTS "authors" (
  "id" BIGSERIAL PRIMARY KEY,
  "name" VARCHAR(255) NOT NULL,
  "email" VARCHAR(255) NOT NULL,
  "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
  "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

fn create_books() -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS "books" (
  "id" BIGSERIAL PRIMARY KEY,
  "title" VARCHAR(255) NOT NULL,
  "isbn" VARCHAR(20) NOT NULL,
  "published_date" DATE NOT NULL,
  "author_id" BIGINT NOT NULL,
  "deleted_at" TIMESTAMPTZ,
  "created_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
  "updated_at" TIMESTAMPTZ NOT NULL DEFAULT NOW(),
  CONSTRAINT "{}" FOREIGN KEY ("author_id") REFERENCES "authors" ("id") ON DELETE CASCADE
)"#,
        AUTHOR_FOREIGN_KEY
    )
}

fn statements() -> Vec<String> {
    vec![
        CREATE_AUTHORS.to_string(),
        create_books(),
        format!(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "{}" ON "books" ("isbn") WHERE "deleted_at" IS NULL"#,
            ISBN_UNIQUE_INDEX
        ),
        r#"CREATE INDEX IF NOT EXISTS "books_author_id_index" ON "books" ("author_id")"#.to_string(),
    ]
}

/// Create tables, the active-isbn unique index, and the author index in one transaction.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    for sql in statements() {
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!("schema up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn books_reference_authors_and_scope_isbn_uniqueness() {
        let all = statements().join(";\n");
        assert!(all.contains(r#"REFERENCES "authors" ("id") ON DELETE CASCADE"#));
        assert!(all.contains(r#"ON "books" ("isbn") WHERE "deleted_at" IS NULL"#));
        assert!(all.contains(r#""isbn" VARCHAR(20) NOT NULL"#));
        assert!(statements()[0].contains(r#""authors""#));
    }
}
