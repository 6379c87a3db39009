//! Author and Book records plus the typed inputs produced by validated request bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewAuthor {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
}

/// Partial update: fields left as `None` keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AuthorChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthorChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// A book; rows with `deleted_at` set are soft-deleted and hidden from every default query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    #[schema(value_type = String, format = Date, example = "1965-08-01")]
    pub published_date: NaiveDate,
    pub author_id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewBook {
    #[schema(example = "Dune")]
    pub title: String,
    #[schema(example = "9780441013593")]
    pub isbn: String,
    #[schema(value_type = String, format = Date, example = "1965-08-01")]
    pub published_date: NaiveDate,
    #[schema(example = 1)]
    pub author_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct BookChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub author_id: Option<i64>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.isbn.is_none()
            && self.published_date.is_none()
            && self.author_id.is_none()
    }
}
